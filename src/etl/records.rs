//! Newline-delimited JSON record parsing.
//!
//! Every non-blank line must hold one JSON object whose values are scalars.
//! Typed accessors treat an explicit `null` the same as an absent field.

use super::EtlError;
use serde_json::{Map, Value};
use std::path::Path;

/// One loosely-typed input record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    line: usize,
    fields: Map<String, Value>,
}

impl Record {
    /// 1-based line number in the source file.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Raw value, `None` when absent or null.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &'static str) -> Result<&Value, EtlError> {
        self.get(field).ok_or(EtlError::MissingField {
            line: self.line,
            field,
        })
    }

    fn invalid(&self, field: &'static str, expected: &'static str) -> EtlError {
        EtlError::InvalidField {
            line: self.line,
            field,
            expected,
        }
    }

    pub fn str_field(&self, field: &'static str) -> Result<&str, EtlError> {
        self.required(field)?
            .as_str()
            .ok_or_else(|| self.invalid(field, "a string"))
    }

    pub fn opt_str_field(&self, field: &'static str) -> Result<Option<&str>, EtlError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| self.invalid(field, "a string")),
        }
    }

    pub fn i64_field(&self, field: &'static str) -> Result<i64, EtlError> {
        let value = self.required(field)?;
        if let Some(n) = value.as_i64() {
            return Ok(n);
        }
        // Integral floats such as `2007.0`
        match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
            _ => Err(self.invalid(field, "an integer")),
        }
    }

    pub fn f64_field(&self, field: &'static str) -> Result<f64, EtlError> {
        self.required(field)?
            .as_f64()
            .ok_or_else(|| self.invalid(field, "a number"))
    }

    pub fn opt_f64_field(&self, field: &'static str) -> Result<Option<f64>, EtlError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.invalid(field, "a number")),
        }
    }

    /// Identifier that may be written either as a string or as an integer.
    pub fn id_field(&self, field: &'static str) -> Result<String, EtlError> {
        match self.required(field)? {
            Value::String(s) if !s.is_empty() => Ok(s.clone()),
            Value::String(_) => Err(EtlError::MissingField {
                line: self.line,
                field,
            }),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            _ => Err(self.invalid(field, "a string or integer id")),
        }
    }
}

/// Reads and parses one data file.
pub fn parse_records(path: &Path) -> Result<Vec<Record>, EtlError> {
    let content = std::fs::read(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records_bytes(path, &content)
}

/// Parses newline-delimited JSON already held in memory. `path` is only used
/// for error reporting.
pub fn parse_records_str(path: &Path, content: &str) -> Result<Vec<Record>, EtlError> {
    parse_records_bytes(path, content.as_bytes())
}

/// Byte-level parser. Lines are split before decoding so that invalid UTF-8
/// is reported against the line it occurs on.
pub fn parse_records_bytes(path: &Path, content: &[u8]) -> Result<Vec<Record>, EtlError> {
    let malformed = |line: usize, reason: String| EtlError::MalformedRecord {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut records = Vec::new();
    for (index, raw_line) in content.split(|b| *b == b'\n').enumerate() {
        let line = index + 1;
        let raw_line = raw_line.strip_suffix(b"\r").unwrap_or(raw_line);
        if raw_line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let fields = match serde_json::from_slice::<Value>(raw_line) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => return Err(malformed(line, "not a JSON object".to_string())),
            Err(e) => return Err(malformed(line, e.to_string())),
        };
        if let Some((name, _)) = fields
            .iter()
            .find(|(_, v)| v.is_array() || v.is_object())
        {
            return Err(malformed(line, format!("field '{}' is not a scalar", name)));
        }
        records.push(Record { line, fields });
    }
    Ok(records)
}
