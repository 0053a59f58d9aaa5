use url::Url;

use crate::data::RequestOptions;
use crate::error::{Error, Result};

pub const DEFAULT_USER_AGENT: &str = "updraft";

/// Hosts under this suffix never receive a `token` authorization header.
pub const CLOUD_STORAGE_SUFFIX: &str = ".amazonaws.com";

pub fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|source| Error::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    if parsed.host_str().is_none() {
        return Err(Error::InvalidUrl {
            url:    url.to_string(),
            source: url::ParseError::EmptyHost,
        });
    }
    Ok(parsed)
}

/// Applies the method override, the auth token and the default headers.
///
/// A token is sent as-is when it already carries the `Basic` scheme and as
/// `token <value>` otherwise. `User-Agent` is filled in when missing.
/// `Cache-Control` is forced to `no-cache` unless a non-GET `method` is given
/// and the caller already chose a value.
pub fn configure_request_options(
    mut options: RequestOptions,
    token: Option<&str>,
    method: Option<&str>,
) -> RequestOptions {
    if let Some(method) = method {
        options.method = method.to_string();
    }

    let headers = &mut options.headers;
    if let Some(token) = token {
        let value = if token.starts_with("Basic") {
            token.to_string()
        } else {
            format!("token {token}")
        };
        headers.insert("authorization", value);
    }

    if !headers.contains("User-Agent") {
        headers.insert("User-Agent", DEFAULT_USER_AGENT);
    }

    let is_get = method.is_none_or(|m| m.eq_ignore_ascii_case("GET"));
    if is_get || !headers.contains("Cache-Control") {
        headers.insert("Cache-Control", "no-cache");
    }

    options
}

/// Points `options` at `url`.
///
/// An explicit port in `url` is kept; otherwise any port left over from a
/// previous target is dropped.
pub fn configure_request_url(url: &Url, mut options: RequestOptions) -> RequestOptions {
    options.protocol = url.scheme().to_string();
    options.hostname = url.host_str().unwrap_or_default().to_string();
    options.port = url.port();
    options.path = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };
    options
}

pub fn configure_request_options_from_url(url: &str, options: RequestOptions) -> Result<RequestOptions> {
    let parsed = parse_url(url)?;
    let options = configure_request_options(options, None, None);
    Ok(configure_request_url(&parsed, options))
}

/// Builds the options for the hop a `Location` header points to.
///
/// `location` may be relative to the current target. Headers carry over,
/// except that a `token` authorization is dropped when the new host is a
/// cloud storage endpoint: such redirects are pre-signed and the credential
/// must not leak to a third party.
pub fn prepare_redirect_options(location: &str, options: &RequestOptions) -> Result<RequestOptions> {
    let current = options.url();
    let base = parse_url(&current)?;
    let target = base.join(location).map_err(|source| Error::InvalidUrl {
        url: location.to_string(),
        source,
    })?;
    let target = parse_url(target.as_str())?;

    let mut next = configure_request_url(&target, configure_request_options(options.clone(), None, None));

    let token_auth = next
        .headers
        .get("authorization")
        .is_some_and(|value| value.starts_with("token"));
    let storage_host = target
        .host_str()
        .is_some_and(|host| host.ends_with(CLOUD_STORAGE_SUFFIX));
    if token_auth && storage_host {
        next.headers.remove("authorization");
    }

    Ok(next)
}
