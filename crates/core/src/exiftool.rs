use crate::metadata::MediaRecord;
use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde_json::Value;
use std::path::Path;
use std::process::Command;

/// Reports timestamps as epoch milliseconds.
pub const DATE_FORMAT: &str = "%s%-3f";

pub fn exiftool_command(binary: &Path, work_dir: &Path) -> Command {
    let mut cmd = Command::new(binary);
    cmd.arg("-r")
        .arg("-json")
        .arg("-dateFormat")
        .arg(DATE_FORMAT)
        .arg(work_dir);
    cmd
}

/// Runs exiftool recursively over `work_dir` and parses its JSON report.
pub fn run_exiftool(binary: &Path, work_dir: &Path) -> Result<Vec<MediaRecord>> {
    let mut cmd = exiftool_command(binary, work_dir);
    info!("running exiftool command: {cmd:?}");
    let output = cmd
        .output()
        .with_context(|| format!("could not run exiftool: {}", binary.display()))?;

    // exiftool exits non-zero when some files had no metadata; the report is still usable
    if !output.status.success() {
        warn!(
            "exiftool reported an error ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8(output.stdout).context("exiftool output is not valid UTF-8")?;
    parse_exiftool_json(&stdout)
}

pub fn parse_exiftool_json(raw: &str) -> Result<Vec<MediaRecord>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value =
        serde_json::from_str(raw).context("failed to parse JSON output from exiftool")?;
    let Value::Array(items) = value else {
        bail!("exiftool output is not a JSON array");
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(MediaRecord::new(fields)),
            other => bail!("exiftool entry {index} is not an object: {other}"),
        })
        .collect()
}
