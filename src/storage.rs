use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::{IdleSample, OverrideInterval};

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Malformed {
        path: String,
        line: usize,
        reason: String,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Malformed { path, line, reason } => {
                write!(f, "{path}:{line}: {reason}")
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Reads the idle log: headerless rows of `timestamp,idle_time_ms`, both
/// integers. Blank lines are skipped; anything else malformed aborts.
pub fn load_idle_log(path: &Path) -> Result<Vec<IdleSample>, StorageError> {
    let raw = fs::read_to_string(path).map_err(StorageError::Io)?;

    let mut samples = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let sample = parse_sample(trimmed).map_err(|reason| malformed(path, index, reason))?;
        samples.push(sample);
    }

    Ok(samples)
}

fn parse_sample(line: &str) -> Result<IdleSample, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 2 {
        return Err(format!("expected 2 fields, found {}", fields.len()));
    }

    let timestamp: i64 = fields[0]
        .parse()
        .map_err(|_| format!("invalid timestamp: {}", fields[0]))?;
    let idle_time_ms: i64 = fields[1]
        .parse()
        .map_err(|_| format!("invalid idle duration: {}", fields[1]))?;
    if idle_time_ms < 0 {
        return Err(format!("negative idle duration: {idle_time_ms}"));
    }

    Ok(IdleSample {
        timestamp,
        idle_time_ms,
    })
}

/// Reads the manual override table: a header line, then rows of
/// `year,month,day,start_hour,start_minute,stop_hour,stop_minute`.
/// A missing file means no overrides, not an error.
pub fn load_overrides(path: &Path) -> Result<Vec<OverrideInterval>, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(StorageError::Io(err)),
    };

    let mut overrides = Vec::new();
    let mut saw_header = false;
    for (index, line) in raw.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !saw_header {
            saw_header = true;
            continue;
        }
        let interval = parse_override(trimmed).map_err(|reason| malformed(path, index, reason))?;
        overrides.push(interval);
    }

    Ok(overrides)
}

fn parse_override(line: &str) -> Result<OverrideInterval, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() != 7 {
        return Err(format!("expected 7 fields, found {}", fields.len()));
    }

    let mut numbers = [0u32; 7];
    for (slot, field) in numbers.iter_mut().zip(&fields) {
        *slot = field
            .parse()
            .map_err(|_| format!("invalid number: {field}"))?;
    }
    let [year, month, day, start_hour, start_minute, stop_hour, stop_minute] = numbers;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or_else(|| format!("invalid date: {year}-{month}-{day}"))?;
    let start = date
        .and_hms_opt(start_hour, start_minute, 0)
        .ok_or_else(|| format!("invalid start time: {start_hour}:{start_minute}"))?;
    let stop = date
        .and_hms_opt(stop_hour, stop_minute, 0)
        .ok_or_else(|| format!("invalid stop time: {stop_hour}:{stop_minute}"))?;

    Ok(OverrideInterval { start, stop })
}

fn malformed(path: &Path, index: usize, reason: String) -> StorageError {
    StorageError::Malformed {
        path: path.display().to_string(),
        line: index + 1,
        reason,
    }
}
