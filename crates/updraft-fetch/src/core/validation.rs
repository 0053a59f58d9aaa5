use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::data::{Headers, RequestOptions};
use crate::error::{Error, Result};

/// Header a server may use to announce the sha256 of the body.
pub const CHECKSUM_HEADER: &str = "X-Checksum-Sha2";

pub fn is_json_content_type(headers: &Headers) -> bool {
    headers
        .get("content-type")
        .is_some_and(|value| value.contains("json"))
}

pub fn content_length(headers: &Headers) -> Option<u64> {
    headers.get("content-length")?.trim().parse().ok()
}

/// Description attached to an error response.
///
/// JSON bodies are parsed when the content type says so; a body that claims
/// JSON but does not parse is kept as text so the status is not lost.
pub fn error_description(body: String, is_json: bool) -> Value {
    if is_json {
        if let Ok(parsed) = serde_json::from_str(&body) {
            return parsed;
        }
    }
    Value::String(body)
}

pub fn not_found_description(options: &RequestOptions) -> String {
    format!(
        "method: {} url: {}\n\nPlease double check that your authentication token is correct. \
         Due to security reasons actual status maybe not reported, but 404.\n",
        options.method,
        options.url(),
    )
}

/// Fails when the server announced a sha256 that contradicts the expected one.
pub fn check_checksum_header(announced: Option<&str>, expected: Option<&str>) -> Result<()> {
    match (announced, expected) {
        (Some(announced), Some(expected)) if announced != expected => {
            Err(Error::ChecksumHeaderMismatch {
                expected: expected.to_string(),
                actual:   announced.to_string(),
            })
        }
        _ => Ok(()),
    }
}

/// Deserializes a textual response, treating an absent or empty body as `None`.
pub fn parse_json<T: DeserializeOwned>(text: Option<String>) -> Result<Option<T>> {
    match text {
        Some(text) if !text.is_empty() => Ok(Some(serde_json::from_str(&text)?)),
        _ => Ok(None),
    }
}
