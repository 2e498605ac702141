use std::collections::HashSet;

use kvmove_core::{path, record::fields_from_map, MigrateError, SecretRecord};
use serde_json::Value;

/// Encode records as an indented JSON list, preserving their order.
/// Identical input always yields identical bytes.
pub fn encode(records: &[SecretRecord]) -> Result<Vec<u8>, MigrateError> {
    let mut out = serde_json::to_vec_pretty(records)
        .map_err(|e| MigrateError::format(format!("encode: {e}")))?;
    out.push(b'\n');
    Ok(out)
}

/// Parse a whole bundle up front. Any malformed record rejects the bundle,
/// so nothing downstream acts on a partially valid file.
pub fn decode(bytes: &[u8]) -> Result<Vec<SecretRecord>, MigrateError> {
    let root: Value =
        serde_json::from_slice(bytes).map_err(|e| MigrateError::format(e.to_string()))?;

    let items = match root {
        Value::Array(items) => items,
        // Older exporters wrote `null` for an empty namespace.
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(MigrateError::format(format!(
                "expected a list of records, found {}",
                type_name(&other)
            )))
        }
    };

    let mut seen = HashSet::with_capacity(items.len());
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let record = decode_record(index, item)?;
        if !seen.insert(record.path.clone()) {
            return Err(MigrateError::format(format!(
                "record {index}: duplicate path {}",
                record.path
            )));
        }
        records.push(record);
    }
    Ok(records)
}

fn decode_record(index: usize, item: Value) -> Result<SecretRecord, MigrateError> {
    let Value::Object(mut object) = item else {
        return Err(MigrateError::format(format!(
            "record {index}: expected an object"
        )));
    };

    let path = match object.remove("path") {
        Some(Value::String(path)) if path::is_canonical(&path) => path,
        Some(Value::String(path)) => {
            return Err(MigrateError::format(format!(
                "record {index}: invalid path {path:?}"
            )))
        }
        Some(other) => {
            return Err(MigrateError::format(format!(
                "record {index}: path must be a string, found {}",
                type_name(&other)
            )))
        }
        None => {
            return Err(MigrateError::format(format!(
                "record {index}: missing path"
            )))
        }
    };

    let fields = match object.remove("data") {
        Some(Value::Object(map)) => fields_from_map(map),
        Some(other) => {
            return Err(MigrateError::format(format!(
                "record {index} ({path}): data must be a mapping, found {}",
                type_name(&other)
            )))
        }
        None => {
            return Err(MigrateError::format(format!(
                "record {index} ({path}): missing data"
            )))
        }
    };

    Ok(SecretRecord::new(path, fields))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use kvmove_core::{ErrorKind, FieldValue, Fields};

    use super::*;

    fn record(path: &str, pairs: &[(&str, FieldValue)]) -> SecretRecord {
        let fields: Fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        SecretRecord::new(path, fields)
    }

    #[test]
    fn encodes_with_two_space_indent_and_trailing_newline() {
        let bytes = encode(&[record("x", &[("note", "hello".into())])]).expect("encode");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(
            text,
            "[\n  {\n    \"path\": \"x\",\n    \"data\": {\n      \"note\": \"hello\"\n    }\n  }\n]\n"
        );
    }

    #[test]
    fn empty_bundle_is_an_empty_list() {
        assert_eq!(encode(&[]).expect("encode"), b"[]\n".to_vec());
        assert!(decode(b"[]").expect("decode").is_empty());
        assert!(decode(b"null").expect("decode").is_empty());
    }

    #[test]
    fn encoding_is_reproducible() {
        let records = vec![
            record("b", &[("z", FieldValue::Bool(true)), ("a", "1".into())]),
            record("a", &[("encrypted", "".into())]),
        ];
        assert_eq!(encode(&records).unwrap(), encode(&records).unwrap());
    }

    #[test]
    fn decode_preserves_order_and_values() {
        let input = br#"[
            {"path": "z/last", "data": {"n": 1.5, "list": [1, "two", null]}},
            {"path": "a/b", "data": {"encrypted": ""}}
        ]"#;
        let records = decode(input).expect("decode");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "z/last");
        assert_eq!(records[1].path, "a/b");
        assert_eq!(records[1].fields["encrypted"], FieldValue::from(""));

        let reencoded = decode(&encode(&records).unwrap()).unwrap();
        assert_eq!(reencoded, records);
    }

    #[test]
    fn missing_path_is_a_format_error() {
        let err = decode(br#"[{"data": {"note": "hello"}}]"#).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("missing path"));
    }

    #[test]
    fn non_mapping_data_is_a_format_error() {
        let err = decode(br#"[{"path": "x", "data": ["no"]}]"#).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("data must be a mapping"));
    }

    #[test]
    fn non_canonical_paths_are_format_errors() {
        for bad in ["", "/", "/a/b", "a/b/", "/a/b/", "c//d"] {
            let input = format!(r#"[{{"path": {bad:?}, "data": {{}}}}]"#);
            let err = decode(input.as_bytes()).expect_err("should fail");
            assert_eq!(err.kind(), ErrorKind::Format, "{bad:?}");
            assert!(err.to_string().contains("invalid path"), "{bad:?}");
        }
    }

    #[test]
    fn slash_variants_of_one_path_are_not_both_accepted() {
        let input = br#"[
            {"path": "a/b", "data": {"v": 1}},
            {"path": "/a/b/", "data": {"v": 2}}
        ]"#;
        let err = decode(input).expect_err("should fail");
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn numbers_keep_their_exact_text() {
        let input = br#"[{"path": "n", "data": {"big": 123456789012345678901234567890, "fine": 1.00000000000000000001}}]"#;
        let records = decode(input).expect("decode");
        let text = String::from_utf8(encode(&records).expect("encode")).expect("utf8");
        assert!(text.contains("\"big\": 123456789012345678901234567890"), "{text}");
        assert!(text.contains("\"fine\": 1.00000000000000000001"), "{text}");
    }

    #[test]
    fn rejects_duplicates_and_garbage() {
        let dup = br#"[{"path": "x", "data": {}}, {"path": "x", "data": {}}]"#;
        assert_eq!(decode(dup).unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(decode(b"{not json").unwrap_err().kind(), ErrorKind::Format);
        assert_eq!(decode(br#"{"path": "x"}"#).unwrap_err().kind(), ErrorKind::Format);
    }
}
