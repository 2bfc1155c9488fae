//! Export extraction results to CSV or JSON.
//!
//! CSV has one row per light curve: `id`, one column per scalar feature, one
//! column per element of a vector feature (`<name>_0`, `<name>_1`, ...), and
//! trailing `status`/`error` columns. Failed rows leave the feature cells
//! empty.
//!
//! JSON keeps vector features as arrays and records failures as objects.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::FeatureValue;
use crate::error::{AppError, ExtractionError};
use crate::space::BatchResult;

/// Write the batch as CSV to `path`.
pub fn write_features_csv(path: &Path, ids: &[String], batch: &BatchResult) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    features_csv(file, ids, batch)
}

/// Write the batch as CSV to any writer.
pub fn features_csv<W: Write>(writer: W, ids: &[String], batch: &BatchResult) -> Result<(), AppError> {
    let widths = column_widths(batch);
    let mut out = csv::Writer::from_writer(writer);
    let write_err = |e: csv::Error| AppError::new(2, format!("Failed to write export CSV: {e}"));

    let mut header = vec!["id".to_string()];
    for (name, width) in batch.names.iter().zip(&widths) {
        match width {
            None => header.push(name.to_string()),
            Some(n) => header.extend((0..*n).map(|i| format!("{name}_{i}"))),
        }
    }
    header.push("status".to_string());
    header.push("error".to_string());
    out.write_record(&header).map_err(write_err)?;

    for (i, row) in batch.rows.iter().enumerate() {
        let mut record = vec![row_id(ids, i)];
        match row {
            Ok(values) => {
                for (value, width) in values.iter().zip(&widths) {
                    push_cells(&mut record, value, *width);
                }
                record.push("ok".to_string());
                record.push(String::new());
            }
            Err(err) => {
                let cells: usize = widths.iter().map(|w| w.unwrap_or(1)).sum();
                record.extend(std::iter::repeat_n(String::new(), cells));
                record.push(err.kind().to_string());
                record.push(err.to_string());
            }
        }
        out.write_record(&record).map_err(write_err)?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// `None` for scalar columns, `Some(max length)` for vector columns.
fn column_widths(batch: &BatchResult) -> Vec<Option<usize>> {
    let mut widths: Vec<Option<usize>> = vec![None; batch.names.len()];
    for (_, values) in batch.successes() {
        for (width, value) in widths.iter_mut().zip(values) {
            if let FeatureValue::Vector(v) = value {
                *width = Some(width.unwrap_or(0).max(v.len()));
            }
        }
    }
    widths
}

fn push_cells(record: &mut Vec<String>, value: &FeatureValue, width: Option<usize>) {
    match (value, width) {
        (FeatureValue::Scalar(v), None) => record.push(format_value(*v)),
        (FeatureValue::Scalar(v), Some(n)) => {
            record.push(format_value(*v));
            record.extend(std::iter::repeat_n(String::new(), n.saturating_sub(1)));
        }
        (FeatureValue::Vector(v), width) => {
            let n = width.unwrap_or(v.len());
            record.extend((0..n).map(|i| v.get(i).map(|x| format_value(*x)).unwrap_or_default()));
        }
    }
}

fn format_value(v: f64) -> String {
    format!("{v}")
}

fn row_id(ids: &[String], index: usize) -> String {
    ids.get(index).cloned().unwrap_or_else(|| format!("#{index}"))
}

#[derive(Debug, Serialize)]
struct ExportDocument<'a> {
    tool: &'static str,
    version: &'static str,
    generated_at: DateTime<Utc>,
    features: &'a [&'static str],
    results: Vec<ExportRow<'a>>,
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<&'a [FeatureValue]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ExportError>,
}

#[derive(Debug, Serialize)]
struct ExportError {
    kind: &'static str,
    extractor: String,
    message: String,
}

impl From<&ExtractionError> for ExportError {
    fn from(err: &ExtractionError) -> Self {
        let extractor = match err {
            ExtractionError::Data { extractor, .. } | ExtractionError::ContractViolation { extractor, .. } => {
                extractor.to_string()
            }
        };
        Self {
            kind: err.kind(),
            extractor,
            message: err.to_string(),
        }
    }
}

/// Write the batch as pretty JSON to `path`.
pub fn write_features_json(path: &Path, ids: &[String], batch: &BatchResult) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;
    features_json(file, ids, batch, Utc::now())
}

pub fn features_json<W: Write>(
    writer: W,
    ids: &[String],
    batch: &BatchResult,
    generated_at: DateTime<Utc>,
) -> Result<(), AppError> {
    let document = ExportDocument {
        tool: "feets",
        version: env!("CARGO_PKG_VERSION"),
        generated_at,
        features: &batch.names,
        results: batch
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| ExportRow {
                id: row_id(ids, i),
                values: row.as_ref().ok().map(Vec::as_slice),
                error: row.as_ref().err().map(ExportError::from),
            })
            .collect(),
    };
    serde_json::to_writer_pretty(writer, &document)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))
}
