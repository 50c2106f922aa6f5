use crate::error::CoreResult;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

// Canonical form backing every byte-identical guarantee in this crate:
// - UTF-8 JSON (no BOM)
// - keys sorted lexicographically
// - no insignificant whitespace
// - strings JSON-escaped per RFC 8259 (serde_json handles)
// - numbers: integers or finite floats. Non-finite floats never reach this
//   form as numbers: serde_json lowers NaN/infinity to null during
//   to_value, and the money parser already drops them at the parse
//   boundary.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> CoreResult<Vec<u8>> {
    let v = serde_json::to_value(value)?;
    let s = serde_json::to_string(&normalize_value(v))?;
    Ok(s.into_bytes())
}

fn normalize_value(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut btm: BTreeMap<String, Value> = BTreeMap::new();
            for (k, vv) in map {
                btm.insert(k, normalize_value(vv));
            }
            // serde_json::Map preserves insertion order; we rebuild in sorted order.
            let mut out = serde_json::Map::new();
            for (k, vv) in btm {
                out.insert(k, vv);
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(normalize_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_bytes_sort_keys_recursively() {
        let a = serde_json::json!({"b": 1, "a": {"y": 2, "x": 3}});
        let b = serde_json::json!({"a": {"x": 3, "y": 2}, "b": 1});
        assert_eq!(
            to_canonical_bytes(&a).unwrap(),
            to_canonical_bytes(&b).unwrap()
        );
    }

    #[test]
    fn canonical_bytes_have_no_whitespace() {
        let v = serde_json::json!({"k": [1, 2, 3], "m": {"n": "s"}});
        let bytes = to_canonical_bytes(&v).unwrap();
        let s = String::from_utf8(bytes).unwrap();
        assert!(!s.contains(' '));
        assert!(!s.contains('\n'));
    }

    #[test]
    fn finite_floats_are_accepted() {
        let v = serde_json::json!({"amount": 1000.5});
        assert!(to_canonical_bytes(&v).is_ok());
    }

    #[test]
    fn non_finite_floats_lower_to_null_before_canonical_form() {
        assert!(serde_json::to_value(f64::NAN).unwrap().is_null());
        let bytes = to_canonical_bytes(&serde_json::json!({"x": f64::INFINITY})).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"{"x":null}"#);
    }
}
