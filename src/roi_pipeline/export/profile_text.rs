//! Plain-text profile files: one decimal value per line.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::roi_pipeline::analysis::IntensityProfile;
use crate::roi_pipeline::common::error::{MonitorError, Result};

pub fn write_profile(
    profile: &IntensityProfile,
    output: &mut dyn Write,
    precision: usize,
) -> Result<()> {
    for value in profile.values() {
        writeln!(output, "{:.*}", precision, value)?;
    }
    Ok(())
}

/// Parses a profile file. Blank lines are skipped; anything else must be a number.
pub fn read_profile(input: impl Read) -> Result<IntensityProfile> {
    let mut values = Vec::new();
    for (index, line) in BufReader::new(input).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = trimmed.parse::<f64>().map_err(|e| {
            MonitorError::ExportError(format!("line {}: {:?}: {}", index + 1, trimmed, e))
        })?;
        values.push(value);
    }
    Ok(IntensityProfile::new(values))
}

pub fn save_profile<P: AsRef<Path>>(
    path: P,
    profile: &IntensityProfile,
    precision: usize,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| MonitorError::ExportError(format!("{}: {}", path.display(), e)))?;

    let mut writer = BufWriter::new(file);
    write_profile(profile, &mut writer, precision)?;
    writer
        .flush()
        .map_err(|e| MonitorError::ExportError(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), values = profile.len(), "Profile saved");
    Ok(())
}

pub fn load_profile<P: AsRef<Path>>(path: P) -> Result<IntensityProfile> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| MonitorError::ExportError(format!("{}: {}", path.display(), e)))?;
    let profile = read_profile(file)?;
    debug!(path = %path.display(), values = profile.len(), "Profile loaded");
    Ok(profile)
}
