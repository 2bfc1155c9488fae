//! CSV ingest of light curves.
//!
//! One CSV file holds one light curve. The header names the channels
//! (`time`, `magnitude`, `error`, `magnitude2`, `time2`, `error2`, plus a few
//! common aliases); columns that do not name a channel are ignored. Every
//! data row must carry a parseable number in each channel column, otherwise
//! the file is rejected with the offending line number.
//!
//! A directory input expands to every `*.csv` file inside it, sorted by path.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::domain::{Channel, LightCurve};
use crate::error::AppError;

/// Expand files and directories into the list of CSV files to read.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = std::fs::read_dir(input)
                .map_err(|e| AppError::new(2, format!("Failed to read directory '{}': {e}", input.display())))?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && has_csv_extension(path))
                .collect();
            found.sort();
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(AppError::new(2, format!("Input '{}' does not exist", input.display())));
        }
    }
    if files.is_empty() {
        return Err(AppError::new(2, "No CSV light curves found in the given inputs"));
    }
    Ok(files)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Load every light curve named by `inputs`, in input order.
pub fn load_light_curves(inputs: &[PathBuf]) -> Result<Vec<LightCurve>, AppError> {
    collect_inputs(inputs)?
        .iter()
        .map(|path| load_light_curve(path))
        .collect()
}

/// Load one light curve; its id is the file stem.
pub fn load_light_curve(path: &Path) -> Result<LightCurve, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    read_light_curve(file, &id)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

/// Parse a light curve from CSV text.
pub fn read_light_curve<R: Read>(reader: R, id: &str) -> Result<LightCurve, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let columns = channel_columns(&headers)?;

    let mut values: BTreeMap<Channel, Vec<f64>> = columns.iter().map(|(c, _)| (*c, Vec::new())).collect();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("line {line}: CSV parse error: {e}")))?;
        for &(channel, col) in &columns {
            let raw = record.get(col).unwrap_or("");
            let value: f64 = raw.parse().map_err(|_| {
                AppError::new(2, format!("line {line}: column '{channel}' is not a number: '{raw}'"))
            })?;
            values.entry(channel).or_default().push(value);
        }
    }

    let light_curve = LightCurve::new(values).map_err(AppError::from)?;
    Ok(light_curve.with_id(id))
}

/// `(channel, column index)` for every header naming a channel.
fn channel_columns(headers: &StringRecord) -> Result<Vec<(Channel, usize)>, AppError> {
    let mut columns: Vec<(Channel, usize)> = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        let Some(channel) = header_channel(name) else {
            continue;
        };
        if columns.iter().any(|(c, _)| *c == channel) {
            return Err(AppError::new(2, format!("Channel '{channel}' appears in more than one column")));
        }
        columns.push((channel, idx));
    }
    if columns.is_empty() {
        return Err(AppError::new(
            2,
            format!(
                "CSV header names no channel (expected some of: {})",
                Channel::ALL.map(Channel::as_str).join(", ")
            ),
        ));
    }
    Ok(columns)
}

fn header_channel(name: &str) -> Option<Channel> {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase();
    match name.as_str() {
        "t" | "mjd" | "hjd" | "jd" => Some(Channel::Time),
        "mag" => Some(Channel::Magnitude),
        "err" | "magerr" | "mag_err" => Some(Channel::Error),
        "mag2" => Some(Channel::Magnitude2),
        "err2" | "magerr2" | "mag_err2" => Some(Channel::Error2),
        other => other.parse().ok(),
    }
}
