use crate::error::{AppError, Result};
use crate::meter::MeterId;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENERGY_MARKER: &str = "*Wh)";

pub fn snapshot_path(dir: &Path, meter: &MeterId) -> PathBuf {
    dir.join(meter.snapshot_file_name())
}

/// Read the meter's snapshot file and return its CurrentReading in Wh.
pub fn read_current_reading(path: &Path, meter: &MeterId) -> Result<i64> {
    let contents = std::fs::read_to_string(path)?;
    let wh = extract_reading(&contents, meter).map_err(|e| match e {
        AppError::NoMatchingLine { prefix, .. } => AppError::NoMatchingLine {
            prefix,
            path: path.display().to_string(),
        },
        other => other,
    })?;
    debug!(meter = %meter, path = %path.display(), wh, "read current reading");
    Ok(wh)
}

/// Find the energy line of `meter` and extract its integer value.
///
/// A line qualifies when it starts with `<id>(` and contains `*Wh)`; the last
/// qualifying line wins. The value is the text after the first `(`, cut at
/// the next `(` and then at the first `*`; surrounding whitespace is ignored.
pub fn extract_reading(contents: &str, meter: &MeterId) -> Result<i64> {
    let prefix = meter.line_prefix();
    let line = contents
        .lines()
        .rev()
        .find(|l| l.starts_with(&prefix) && l.contains(ENERGY_MARKER))
        .ok_or_else(|| AppError::NoMatchingLine {
            prefix: prefix.clone(),
            path: String::new(),
        })?;

    let field = line.split('(').nth(1).unwrap_or_default();
    let value = field.split('*').next().unwrap_or_default().trim();
    value
        .parse()
        .map_err(|_| AppError::InvalidReading(value.to_string()))
}
