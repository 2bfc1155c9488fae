//! Formatted terminal output.
//!
//! Formatting lives here so extraction code stays free of presentation
//! concerns and output changes stay localized.

use crate::domain::{FeatureValue, ParamValue};
use crate::extractors::Descriptor;
use crate::extractors::lomb_scargle::FoldedCurve;
use crate::space::{BatchResult, FeatureResult};

/// Table of registered extractors (`feets list`).
pub fn format_descriptors(descriptors: &[Descriptor]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<18} {:<28} {:<34} {:<24}\n",
            "extractor", "data", "features", "depends on"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<18} {:-<28} {:-<34} {:-<24}\n", "", "", "", "").trim_end());
    out.push('\n');

    for d in descriptors {
        let data: Vec<&str> = d.required_data.iter().map(|c| c.as_str()).collect();
        let deps: Vec<&str> = d.dependencies.iter().map(|id| id.as_str()).collect();
        // One feature per line keeps wide extractors readable.
        for (i, feature) in d.features.iter().enumerate() {
            let (id, data, deps) = if i == 0 {
                (d.id.as_str().to_string(), data.join(","), deps.join(","))
            } else {
                (String::new(), String::new(), String::new())
            };
            out.push_str(format!("{:<18} {:<28} {:<34} {:<24}\n", id, data, feature, deps).trim_end());
            out.push('\n');
        }
        if !d.params.is_empty() {
            let params: Vec<String> = d.params.iter().map(|(k, v)| format!("{k}={}", fmt_param(v))).collect();
            out.push_str(&format!("{:<18} params: {}\n", "", params.join(", ")));
        }
    }

    out
}

/// One block per light curve with its feature values, failures inline.
pub fn format_batch(ids: &[String], batch: &BatchResult) -> String {
    let mut out = String::new();
    let width = batch.names.iter().map(|n| n.len()).max().unwrap_or(0).max(8);

    for (i, row) in batch.rows.iter().enumerate() {
        let id = ids.get(i).cloned().unwrap_or_else(|| format!("#{i}"));
        out.push_str(&format!("=== {id} ===\n"));
        match row {
            Ok(values) => {
                for (name, value) in batch.names.iter().zip(values) {
                    out.push_str(&format!("{name:<width$}  {}\n", fmt_value(value)));
                }
            }
            Err(err) => out.push_str(&format!("FAILED ({}): {err}\n", err.kind())),
        }
        out.push('\n');
    }

    let failed = batch.failures().count();
    out.push_str(&format!(
        "Extracted {} feature(s) from {} light curve(s); {} failed.\n",
        batch.names.len(),
        batch.len() - failed,
        failed
    ));
    out
}

/// Period search summary for `feets fold`.
pub fn format_fold_summary(id: &str, folded: &FoldedCurve, features: &FeatureResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== feets fold: {id} ===\n"));
    out.push_str(&format!(
        "Periodogram: {} frequencies in [{:.6}, {:.6}]\n",
        folded.periodogram.len(),
        folded.periodogram.frequency.first().copied().unwrap_or(f64::NAN),
        folded.periodogram.frequency.last().copied().unwrap_or(f64::NAN),
    ));
    out.push_str(&format!(
        "Best frequency: {:.6} (power {:.4})\n",
        folded.periodogram.frequency[folded.best_index],
        folded.periodogram.power[folded.best_index],
    ));
    out.push_str(&format!(
        "Best period: {:.6} (folded on {:.6})\n",
        folded.best_period,
        2.0 * folded.best_period
    ));
    for (name, value) in features.iter() {
        out.push_str(&format!("{name:<10} {}\n", fmt_value(value)));
    }
    out
}

pub fn fmt_value(value: &FeatureValue) -> String {
    match value {
        FeatureValue::Scalar(v) => format!("{v:.6}"),
        FeatureValue::Vector(v) => fmt_vec(v),
    }
}

fn fmt_param(value: &ParamValue) -> String {
    value.to_string()
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExtractorId;
    use crate::error::{DataError, ExtractionError};
    use crate::registry::Registry;

    #[test]
    fn descriptor_table_lists_every_feature() {
        let table = format_descriptors(&Registry::with_builtins().descriptors());
        for feature in ["Amplitude", "PeriodLS", "Psi_eta", "Freq1_harmonics_rel_phase"] {
            assert!(table.contains(feature), "{feature} missing");
        }
        assert!(table.contains("samples_per_peak=5"));
        assert!(table.lines().all(|l| l == l.trim_end()));
    }

    #[test]
    fn batch_block_shows_values_and_failures() {
        let batch = BatchResult {
            names: vec!["Mean", "Freq1_harmonics_amplitude"],
            rows: vec![
                Ok(vec![FeatureValue::Scalar(1.5), FeatureValue::Vector(vec![0.25, 0.5])]),
                Err(ExtractionError::Data {
                    light_curve: "#1".to_string(),
                    extractor: ExtractorId::new("Mean"),
                    source: DataError::InsufficientData { required: 1, found: 0 },
                }),
            ],
        };
        let text = format_batch(&["a".to_string()], &batch);
        assert!(text.contains("=== a ==="));
        assert!(text.contains("=== #1 ==="));
        assert!(text.contains("[0.250000, 0.500000]"));
        assert!(text.contains("FAILED (insufficient_data)"));
        assert!(text.ends_with("from 1 light curve(s); 1 failed.\n"));
    }

    #[test]
    fn truncate_marks_cut_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd.");
    }
}
