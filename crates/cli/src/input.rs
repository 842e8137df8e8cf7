//! Loading normalized sources from disk.
//!
//! INPUT is a JSON file holding one `NormalizedFile` document or an array of
//! them, or a directory searched recursively for `*.json` files. A file that
//! cannot be read or decoded becomes a failed unit, reported as a diagnostic
//! by the index instead of aborting the run.

use chainscope_api::models::source::{NormalizedFile, SourceUnit};
use chainscope_core::{IndexBuilder, SymbolIndex};
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Deserialize)]
#[serde(untagged)]
enum InputDocument {
    Many(Vec<NormalizedFile>),
    One(NormalizedFile),
}

pub fn load_units(path: &Path) -> io::Result<Vec<SourceUnit>> {
    if path.is_file() {
        return Ok(decode_file(path));
    }
    if !path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no such file or directory: {}", path.display()),
        ));
    }

    let mut units = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if entry.file_type().is_file() && is_json {
            units.extend(decode_file(entry.path()));
        }
    }
    Ok(units)
}

/// Load and index everything under `path`.
pub fn load_index(path: &Path) -> io::Result<SymbolIndex> {
    let units = load_units(path)?;
    info!(path = %path.display(), units = units.len(), "sources loaded");
    let mut builder = IndexBuilder::new();
    builder.add_units(units);
    Ok(builder.build())
}

fn decode_file(path: &Path) -> Vec<SourceUnit> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => return vec![SourceUnit::failed(path, format!("read failed: {}", e))],
    };
    let files = match serde_json::from_str::<InputDocument>(&text) {
        Ok(InputDocument::Many(files)) => files,
        Ok(InputDocument::One(file)) => vec![file],
        Err(e) => return vec![SourceUnit::failed(path, format!("decode failed: {}", e))],
    };

    files
        .into_iter()
        .enumerate()
        .map(|(i, mut file)| {
            // Units are keyed by path; anonymous documents get one derived from their origin
            if file.path.as_os_str().is_empty() {
                file.path = PathBuf::from(format!("{}#{}", path.display(), i));
            }
            SourceUnit::normalized(file)
        })
        .collect()
}
