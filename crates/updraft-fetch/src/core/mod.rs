//! Pure transformations for request preparation and response classification.
//!
//! Nothing here performs I/O: options are rewritten by value, responses are
//! judged from their status and headers alone.

mod redact;
mod request;
mod status;
mod validation;

pub use redact::{REDACTED, safe_stringify_json, safe_stringify_json_skipping};
pub use request::{
    CLOUD_STORAGE_SUFFIX, DEFAULT_USER_AGENT, configure_request_options,
    configure_request_options_from_url, configure_request_url, parse_url,
    prepare_redirect_options,
};
pub use status::status_reason;
pub use validation::{
    CHECKSUM_HEADER, check_checksum_header, content_length, error_description,
    is_json_content_type, not_found_description, parse_json,
};
