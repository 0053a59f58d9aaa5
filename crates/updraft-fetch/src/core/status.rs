/// Short human reason for the status codes APIs commonly answer with.
///
/// # Examples
///
/// ```
/// use updraft_fetch::core::status_reason;
///
/// assert_eq!(status_reason(429), Some("Too many requests"));
/// assert_eq!(status_reason(418), None);
/// ```
pub fn status_reason(status: u16) -> Option<&'static str> {
    let reason = match status {
        400 => "Bad request",
        403 => "Forbidden",
        404 => "Not found",
        405 => "Method not allowed",
        406 => "Not acceptable",
        408 => "Request timeout",
        413 => "Request entity too large",
        429 => "Too many requests",
        500 => "Internal server error",
        502 => "Bad gateway",
        503 => "Service unavailable",
        504 => "Gateway timeout",
        505 => "HTTP version not supported",
        _ => return None,
    };
    Some(reason)
}
