use serde::Serialize;
use serde_json::Value;

/// Replacement for the value of any sensitive key.
pub const REDACTED: &str = "<stripped sensitive data>";

const SENSITIVE_KEYS: [&str; 3] = ["authorization", "password", "token"];

/// Renders `data` as compact JSON with secrets stripped.
///
/// Any object key whose lowercase name contains `authorization`, `password`
/// or `token` has its value replaced with [`REDACTED`], at every depth.
///
/// # Examples
///
/// ```
/// use updraft_fetch::core::safe_stringify_json;
/// use serde_json::json;
///
/// let rendered = safe_stringify_json(&json!({ "authorization": "token abc", "name": "x" }));
/// assert_eq!(rendered, r#"{"authorization":"<stripped sensitive data>","name":"x"}"#);
/// ```
pub fn safe_stringify_json<T: Serialize + ?Sized>(data: &T) -> String {
    safe_stringify_json_skipping(data, &[])
}

/// Like [`safe_stringify_json`], additionally stripping keys named exactly
/// as one of `skipped`.
pub fn safe_stringify_json_skipping<T: Serialize + ?Sized>(data: &T, skipped: &[&str]) -> String {
    match serde_json::to_value(data) {
        Ok(mut value) => {
            redact(&mut value, skipped);
            value.to_string()
        }
        Err(e) => format!("<unserializable: {e}>"),
    }
}

fn is_sensitive(name: &str, skipped: &[&str]) -> bool {
    let lower = name.to_ascii_lowercase();
    SENSITIVE_KEYS.iter().any(|key| lower.contains(key)) || skipped.contains(&name)
}

fn redact(value: &mut Value, skipped: &[&str]) {
    match value {
        Value::Object(map) => {
            for (name, value) in map.iter_mut() {
                if is_sensitive(name, skipped) {
                    *value = Value::String(REDACTED.to_string());
                } else {
                    redact(value, skipped);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| redact(item, skipped)),
        _ => {}
    }
}
