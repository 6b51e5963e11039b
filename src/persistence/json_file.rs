//! Human-readable JSON documents on disk.
//!
//! Writes go to a sibling temp file that is renamed over the target, so a
//! crash mid-write leaves the previous document intact.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Outcome of reading a document
#[derive(Debug)]
pub enum Loaded<T> {
    Found(T),
    Missing,
    Invalid(String),
}

/// Read and deserialize `path`, distinguishing missing from malformed
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Loaded<T> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Loaded::Missing,
        Err(e) => return Loaded::Invalid(e.to_string()),
    };

    if raw.trim().is_empty() {
        return Loaded::Invalid("empty document".to_string());
    }

    match serde_json::from_str(&raw) {
        Ok(value) => Loaded::Found(value),
        Err(e) => Loaded::Invalid(e.to_string()),
    }
}

/// Serialize `value` as pretty JSON and atomically replace `path`
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');

    let tmp = temp_path(path);
    std::fs::write(&tmp, body)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
