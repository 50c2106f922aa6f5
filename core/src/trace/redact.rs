use serde_json::Value;

/// Keys that would smuggle document text into a trace artifact.
pub const FORBIDDEN_KEYS: &[&str] = &["text", "raw", "before", "after", "context"];

/// Recursively walk `value` and return the first forbidden key found, as a
/// dotted path. `None` means the artifact is clean.
pub fn find_forbidden_key(value: &Value) -> Option<String> {
    walk(value, String::new())
}

fn walk(value: &Value, path: String) -> Option<String> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                if FORBIDDEN_KEYS.contains(&key.as_str()) {
                    return Some(child_path);
                }
                if let Some(found) = walk(child, child_path) {
                    return Some(found);
                }
            }
            None
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                let child_path = format!("{path}[{i}]");
                if let Some(found) = walk(child, child_path) {
                    return Some(found);
                }
            }
            None
        }
        _ => None,
    }
}
