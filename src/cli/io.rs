//! JSON I/O handling for CLI
//!
//! - Input: dataset files holding JSON records
//! - Output: one JSON object per command on stdout

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Read records from a dataset file.
///
/// Accepts a bare array or a collection body `{"value": [...]}`.
pub fn read_dataset(path: &Path) -> CliResult<Vec<Value>> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::data_error(format!("cannot read {}: {}", path.display(), e)))?;
    parse_dataset(&text)
}

pub(crate) fn parse_dataset(text: &str) -> CliResult<Vec<Value>> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(records) => Ok(records),
        Value::Object(mut body) => match body.remove("value") {
            Some(Value::Array(records)) => Ok(records),
            _ => Err(CliError::data_error("object dataset needs a value array")),
        },
        _ => Err(CliError::data_error("dataset must be an array")),
    }
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_dataset_shapes() {
        assert_eq!(parse_dataset("[{\"id\":1}]").unwrap(), vec![json!({"id": 1})]);
        assert_eq!(
            parse_dataset("{\"value\":[{\"id\":2}]}").unwrap(),
            vec![json!({"id": 2})]
        );
        assert!(parse_dataset("{\"items\":[]}").is_err());
        assert!(parse_dataset("42").is_err());
    }

    #[test]
    fn test_read_dataset_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.json");
        fs::write(&path, "[{\"id\":1},{\"id\":2}]").unwrap();

        assert_eq!(read_dataset(&path).unwrap().len(), 2);
        assert!(read_dataset(&dir.path().join("missing.json")).is_err());
    }
}
