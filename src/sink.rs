//! JSON output of a finished run.

use crate::error::{Error, Result};
use crate::model::{Period, QuerySpec, RecordSet};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// `st_YYYY.json`, `st_YYYYMM.json` or `st_YYYYMMDD.json` for `spec`.
pub fn default_filename(spec: &QuerySpec) -> PathBuf {
    let name = match spec.period {
        Period::Year => format!("st_{}.json", spec.year),
        Period::Month => format!("st_{}{:02}.json", spec.year, spec.month.unwrap_or(1)),
        Period::Day => format!(
            "st_{}{:02}{:02}.json",
            spec.year,
            spec.month.unwrap_or(1),
            spec.day.unwrap_or(1)
        ),
    };
    PathBuf::from(name)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut partial = OsString::from(path.as_os_str());
    partial.push(".part");
    PathBuf::from(partial)
}

async fn replace_file(path: &Path, contents: String) -> io::Result<()> {
    let partial = partial_path(path);
    let written = match fs::write(&partial, contents).await {
        Ok(()) => fs::rename(&partial, path).await,
        Err(err) => Err(err),
    };
    if written.is_err() {
        let _ = fs::remove_file(&partial).await;
    }
    written
}

/// Writes `records` as pretty JSON.
///
/// The document goes to `<path>.part` first and is renamed into place, so
/// `path` is either the complete output or untouched.
pub async fn write_records(path: &Path, records: &RecordSet) -> Result<()> {
    let shown = path.display().to_string();
    let mut json = serde_json::to_string_pretty(records)
        .map_err(|err| Error::sink(shown.as_str(), io::Error::other(err)))?;
    json.push('\n');

    replace_file(path, json)
        .await
        .map_err(|err| Error::sink(shown.as_str(), err))?;

    tracing::info!(path = %shown, records = records.len(), "Saved records");
    Ok(())
}
