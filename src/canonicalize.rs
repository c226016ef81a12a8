//! JSON Canonicalization Scheme (RFC 8785)
//!
//! Identifier derivation encodes service descriptors as canonical JSON so
//! that equal descriptor lists always produce equal bytes, independent of
//! struct field order or map iteration order.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

use crate::errors::{RegistryError, RegistryResult};

/// Serialize any value to RFC 8785 canonical bytes
pub fn canonical_bytes<T: Serialize>(value: &T) -> RegistryResult<Vec<u8>> {
    let value = serde_json::to_value(value)
        .map_err(|e| RegistryError::serialization("canonical_json", e))?;
    Ok(canonicalize_json(&value)?.into_bytes())
}

/// Canonicalize a JSON value according to RFC 8785
pub fn canonicalize_json(value: &Value) -> RegistryResult<String> {
    let mut output = String::new();
    write_value(value, &mut output)?;
    Ok(output)
}

fn write_value(value: &Value, output: &mut String) -> RegistryResult<()> {
    match value {
        Value::Object(map) => {
            // JCS orders members by their UTF-16 code units
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.encode_utf16().cmp(b.encode_utf16()));

            output.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                write_string(key, output);
                output.push(':');
                write_value(&map[key.as_str()], output)?;
            }
            output.push('}');
        }
        Value::Array(items) => {
            output.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                write_value(item, output)?;
            }
            output.push(']');
        }
        Value::String(s) => write_string(s, output),
        Value::Number(n) => write_number(n, output)?,
        Value::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        Value::Null => output.push_str("null"),
    }
    Ok(())
}

fn write_string(s: &str, output: &mut String) {
    output.push('"');
    for ch in s.chars() {
        match ch {
            '"' => output.push_str("\\\""),
            '\\' => output.push_str("\\\\"),
            '\u{08}' => output.push_str("\\b"),
            '\u{0C}' => output.push_str("\\f"),
            '\n' => output.push_str("\\n"),
            '\r' => output.push_str("\\r"),
            '\t' => output.push_str("\\t"),
            ch if (ch as u32) < 0x20 => {
                // Writing into a String cannot fail
                let _ = write!(output, "\\u{:04x}", ch as u32);
            }
            ch => output.push(ch),
        }
    }
    output.push('"');
}

fn write_number(num: &serde_json::Number, output: &mut String) -> RegistryResult<()> {
    if let Some(i) = num.as_i64() {
        let _ = write!(output, "{i}");
    } else if let Some(u) = num.as_u64() {
        let _ = write!(output, "{u}");
    } else if let Some(f) = num.as_f64() {
        if !f.is_finite() {
            return Err(RegistryError::validation(
                "canonical_json",
                "non-finite numbers cannot be canonicalized",
            ));
        }
        if f.fract() == 0.0 && f.abs() < 1e15 {
            let _ = write!(output, "{}", f as i64);
        } else {
            let _ = write!(output, "{f}");
        }
    } else {
        return Err(RegistryError::validation("canonical_json", "invalid number"));
    }
    Ok(())
}
