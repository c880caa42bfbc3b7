//! Loading JSON records into memory

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// Parse a JSON array of records from a string.
pub fn parse_records(json: &str, origin: &Path) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(json).map_err(|source| Error::Json {
        path: origin.to_path_buf(),
        source,
    })?;
    match value {
        Value::Array(records) => Ok(records),
        _ => Err(Error::NotAnArray {
            path: origin.to_path_buf(),
        }),
    }
}

/// Read a file holding a JSON array of records.
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let contents = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_records(&contents, path)?;
    info!(count = records.len(), path = %path.display(), "loaded records");
    Ok(records)
}
