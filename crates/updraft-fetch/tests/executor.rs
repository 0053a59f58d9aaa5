use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{StreamExt, stream};
use serde_json::json;
use updraft_fetch::updraft_verify::{Encoding, Sha256Hasher, Sha512Hasher};
use updraft_fetch::{
    Body, CancellationToken, DownloadOptions, Error, ExecutorConfig, Headers, HttpExecutor,
    Progress, RequestOptions, Response, Transport, TransportError,
};

enum Reply {
    Respond {
        status:  u16,
        message: &'static str,
        headers: Headers,
        chunks:  Vec<Bytes>,
        stall:   bool,
    },
    Fail(TransportError),
    Hang,
}

impl Reply {
    fn status(status: u16, message: &'static str) -> Self {
        Reply::Respond {
            status,
            message,
            headers: Headers::new(),
            chunks: Vec::new(),
            stall: false,
        }
    }

    fn ok() -> Self { Self::status(200, "OK") }

    fn redirect(location: &str) -> Self { Self::status(302, "Found").header("Location", location) }

    fn header(mut self, name: &str, value: &str) -> Self {
        if let Reply::Respond { headers, .. } = &mut self {
            headers.insert(name, value);
        }
        self
    }

    fn body(mut self, data: impl Into<Bytes>) -> Self {
        if let Reply::Respond { chunks, .. } = &mut self {
            chunks.push(data.into());
        }
        self
    }

    /// Body never ends after the chunks already queued.
    fn stalled(mut self) -> Self {
        if let Reply::Respond { stall, .. } = &mut self {
            *stall = true;
        }
        self
    }
}

/// Replays queued replies in order and records every request it sees.
#[derive(Default)]
struct Scripted {
    replies:   Mutex<VecDeque<Reply>>,
    requests:  Mutex<Vec<(RequestOptions, Option<Bytes>)>>,
    body_read: Arc<AtomicBool>,
}

impl Scripted {
    fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        }
    }

    fn requests(&self) -> Vec<(RequestOptions, Option<Bytes>)> { self.requests.lock().unwrap().clone() }

    fn body_read(&self) -> bool { self.body_read.load(Ordering::SeqCst) }
}

impl Transport for Scripted {
    async fn send(&self, options: &RequestOptions, body: Option<Bytes>) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push((options.clone(), body));
        let reply = self.replies.lock().unwrap().pop_front().expect("unexpected request");

        match reply {
            Reply::Respond {
                status,
                message,
                headers,
                chunks,
                stall,
            } => {
                let flag = self.body_read.clone();
                let chunks = stream::iter(chunks.into_iter().map(Ok::<_, TransportError>))
                    .inspect(move |_| flag.store(true, Ordering::SeqCst));
                let body = if stall {
                    Body::new(chunks.chain(stream::pending()))
                } else {
                    Body::new(chunks)
                };
                Ok(Response::new(status, message, headers, body))
            }
            Reply::Fail(e) => Err(e),
            Reply::Hang => futures_util::future::pending().await,
        }
    }
}

fn executor(replies: impl IntoIterator<Item = Reply>) -> HttpExecutor<Scripted> {
    HttpExecutor::new(Scripted::new(replies))
}

fn api_options() -> RequestOptions {
    RequestOptions::from_url("https://api.example.com/repos/o/r/releases").unwrap()
}

fn dir_entries(dir: &Path) -> usize { std::fs::read_dir(dir).unwrap().count() }

// -- request -----------------------------------------------------------------

#[tokio::test]
async fn error_statuses_carry_json_description() {
    for status in [400, 403, 405, 406, 408, 413, 429, 500, 502, 503, 504, 505, 418, 599] {
        let executor = executor([Reply::status(status, "Oops")
            .header("Content-Type", "application/json; charset=utf-8")
            .body(r#"{"message":"nope"}"#)]);

        let err = executor.request(api_options(), &CancellationToken::new()).await.unwrap_err();
        let Error::Http(http) = err else {
            panic!("expected HttpError for {status}");
        };
        assert_eq!(http.status_code, status);
        assert_eq!(http.code, format!("HTTP_ERROR_{status}"));
        assert_eq!(http.description, Some(json!({ "message": "nope" })));
        assert!(http.message.starts_with(&format!("{status} Oops\n")));
    }
}

#[tokio::test]
async fn error_statuses_carry_text_description() {
    let executor = executor([Reply::status(502, "Bad Gateway")
        .header("Content-Type", "text/html")
        .header("Authorization", "token leaked")
        .body("<html>upstream</html>")]);

    let err = executor.request(api_options(), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.status_code(), Some(502));
    let Error::Http(http) = err else { unreachable!() };
    assert_eq!(http.description, Some(json!("<html>upstream</html>")));
    assert!(http.message.contains("<stripped sensitive data>"));
    assert!(!http.message.contains("leaked"));
}

#[tokio::test]
async fn not_found_skips_body() {
    let executor = executor([Reply::status(404, "Not Found").body("secret details")]);

    let err = executor.request(api_options(), &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.code(), "HTTP_ERROR_404");
    assert!(err.to_string().contains("Please double check that your authentication token is correct"));
    assert!(err.to_string().contains("url: https://api.example.com/repos/o/r/releases"));
    assert!(!executor.transport().body_read());
}

#[tokio::test]
async fn no_content_resolves_none_unread() {
    let executor = executor([Reply::status(204, "No Content").body("ignored")]);

    let out = executor.request(api_options(), &CancellationToken::new()).await.unwrap();
    assert_eq!(out, None);
    assert!(!executor.transport().body_read());
}

#[tokio::test]
async fn success_resolves_text_or_none() {
    let executor = executor([Reply::ok().body("he").body("llo"), Reply::ok()]);
    let token = CancellationToken::new();

    assert_eq!(executor.request(api_options(), &token).await.unwrap().as_deref(), Some("hello"));
    assert_eq!(executor.request(api_options(), &token).await.unwrap(), None);
}

#[tokio::test]
async fn request_json_decodes() {
    let executor = executor([Reply::ok().body(r#"{"tag_name":"v2.0.0"}"#)]);

    let release: Option<serde_json::Value> = executor
        .request_json(api_options(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(release, Some(json!({ "tag_name": "v2.0.0" })));
}

#[tokio::test]
async fn json_body_posted_and_resent_on_redirect() {
    let executor = executor([Reply::redirect("/moved"), Reply::ok().body("created")]);

    let out = executor
        .request_with_body(api_options(), &CancellationToken::new(), &json!({ "name": "v1" }))
        .await
        .unwrap();
    assert_eq!(out.as_deref(), Some("created"));

    let requests = executor.transport().requests();
    assert_eq!(requests.len(), 2);
    for (options, body) in &requests {
        assert_eq!(options.method, "POST");
        assert_eq!(options.headers.get("content-type"), Some("application/json"));
        assert_eq!(options.headers.get("content-length"), Some("13"));
        assert_eq!(body.as_deref(), Some(&br#"{"name":"v1"}"#[..]));
    }
    assert_eq!(requests[1].0.path, "/moved");
}

#[tokio::test]
async fn explicit_method_kept_with_body() {
    let executor = executor([Reply::ok()]);

    executor
        .request_with_body(api_options().method("PATCH"), &CancellationToken::new(), &json!({}))
        .await
        .unwrap();
    assert_eq!(executor.transport().requests()[0].0.method, "PATCH");
}

#[tokio::test]
async fn transport_failures_propagate() {
    let executor = executor([Reply::Fail(TransportError::Connect("refused".into()))]);

    let err = executor.request(api_options(), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.code(), "ERR_TRANSPORT");
    assert!(err.to_string().contains("refused"));
}

// -- redirects ---------------------------------------------------------------

fn redirect_chain(hops: usize, last: Reply) -> Vec<Reply> {
    let mut replies: Vec<_> = (0..hops).map(|i| Reply::redirect(&format!("/hop/{i}"))).collect();
    replies.push(last);
    replies
}

#[tokio::test]
async fn ten_redirects_are_followed() {
    let executor = executor(redirect_chain(10, Reply::ok().body("done")));

    let out = executor.request(api_options(), &CancellationToken::new()).await.unwrap();
    assert_eq!(out.as_deref(), Some("done"));
    assert_eq!(executor.transport().requests().len(), 11);
}

#[tokio::test]
async fn eleventh_redirect_fails() {
    let executor = executor(redirect_chain(11, Reply::ok()));

    let err = executor.request(api_options(), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Too many redirects (> 10)");
    assert_eq!(executor.transport().requests().len(), 11);
}

#[tokio::test]
async fn download_redirect_bound_matches() {
    let options = DownloadOptions::default();

    let executor_ok = executor(redirect_chain(10, Reply::ok().body("abc")));
    let bytes = executor_ok
        .download_to_buffer("https://cdn.example.com/a", &options)
        .await
        .unwrap();
    assert_eq!(bytes, &b"abc"[..]);

    let executor_over = executor(redirect_chain(11, Reply::ok()));
    let err = executor_over
        .download_to_buffer("https://cdn.example.com/a", &options)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TooManyRedirects { max: 10 }));
}

#[tokio::test]
async fn configured_redirect_limit_applies() {
    let executor = HttpExecutor::with_config(
        Scripted::new(redirect_chain(3, Reply::ok())),
        ExecutorConfig::default().max_redirects(2),
    );

    let err = executor.request(api_options(), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Too many redirects (> 2)");
}

#[tokio::test]
async fn storage_redirect_drops_token() {
    let executor = executor([
        Reply::redirect("https://bucket.s3.amazonaws.com/asset?sig=1"),
        Reply::ok().body("binary"),
    ]);
    let options = DownloadOptions::default().header("Authorization", "token secret");

    executor
        .download_to_buffer("https://api.example.com/assets/1", &options)
        .await
        .unwrap();

    let requests = executor.transport().requests();
    assert_eq!(requests[0].0.headers.get("authorization"), Some("token secret"));
    assert_eq!(requests[1].0.hostname, "bucket.s3.amazonaws.com");
    assert_eq!(requests[1].0.path, "/asset?sig=1");
    assert_eq!(requests[1].0.headers.get("authorization"), None);
}

#[tokio::test]
async fn other_redirect_keeps_token() {
    let executor = executor([
        Reply::redirect("https://objects.example.net/asset"),
        Reply::ok().body("{}"),
    ]);
    let options = api_options().header("authorization", "token secret");

    executor.request(options, &CancellationToken::new()).await.unwrap();

    let requests = executor.transport().requests();
    assert_eq!(requests[1].0.hostname, "objects.example.net");
    assert_eq!(requests[1].0.headers.get("authorization"), Some("token secret"));
}

#[tokio::test]
async fn non_ascii_location_is_followed() {
    let executor = executor([Reply::redirect("/caf\u{e9}.zip"), Reply::ok().body("zip")]);

    let bytes = executor
        .download_to_buffer("https://cdn.example.com/latest", &DownloadOptions::default())
        .await
        .unwrap();

    assert_eq!(bytes, &b"zip"[..]);
    assert_eq!(executor.transport().requests()[1].0.path, "/caf%C3%A9.zip");
}

#[tokio::test]
async fn redirect_strategy_is_replaceable() {
    fn pin_host(location: &str, options: &RequestOptions) -> updraft_fetch::Result<RequestOptions> {
        let mut next = updraft_fetch::prepare_redirect_options(location, options)?;
        next.hostname = "mirror.example.org".into();
        Ok(next)
    }

    let executor = executor([Reply::redirect("https://elsewhere.example.com/x"), Reply::ok()])
        .with_redirect_strategy(pin_host);

    executor.request(api_options(), &CancellationToken::new()).await.unwrap();
    assert_eq!(executor.transport().requests()[1].0.hostname, "mirror.example.org");
}

// -- download_to_buffer ------------------------------------------------------

#[tokio::test]
async fn buffer_with_exact_length() {
    let executor = executor([Reply::ok().header("Content-Length", "1000").body(vec![7u8; 1000])]);

    let bytes = executor
        .download_to_buffer("https://cdn.example.com/blob", &DownloadOptions::default())
        .await
        .unwrap();
    assert_eq!(bytes.len(), 1000);
    assert!(bytes.iter().all(|b| *b == 7));
}

#[tokio::test]
async fn buffer_short_body_mismatch() {
    let executor = executor([Reply::ok().header("Content-Length", "1000").body(vec![7u8; 900])]);

    let err = executor
        .download_to_buffer("https://cdn.example.com/blob", &DownloadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LengthMismatch { received: 900, expected: 1000 }));
}

#[tokio::test]
async fn buffer_declared_size_over_cap() {
    let executor = executor([Reply::ok().header("Content-Length", "52428801").body(vec![0u8; 16])]);

    let err = executor
        .download_to_buffer("https://cdn.example.com/blob", &DownloadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Maximum allowed size is 50 MB");
    assert!(!executor.transport().body_read());
}

#[tokio::test]
async fn buffer_accumulated_size_over_cap() {
    let executor = HttpExecutor::with_config(
        Scripted::new([Reply::ok().body(vec![0u8; 600]).body(vec![0u8; 600])]),
        ExecutorConfig::default().max_buffer_size(1024),
    );

    let err = executor
        .download_to_buffer("https://cdn.example.com/blob", &DownloadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PayloadTooLarge { size: 1200, limit: 1024 }));
}

#[tokio::test]
async fn download_error_status_skips_body() {
    let executor = executor([Reply::status(403, "Forbidden").body("denied")]);

    let err = executor
        .download_to_buffer("https://cdn.example.com/blob", &DownloadOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot download \"https://cdn.example.com/blob\", status 403: Forbidden"
    );
    assert_eq!(err.status_code(), Some(403));
    assert!(!executor.transport().body_read());
}

#[tokio::test]
async fn download_sends_default_headers() {
    let executor = executor([Reply::ok()]);
    let options = DownloadOptions::default().header("Accept", "application/octet-stream");

    executor
        .download_to_buffer("https://cdn.example.com/blob", &options)
        .await
        .unwrap();

    let requests = executor.transport().requests();
    let (request, body) = &requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.headers.get("accept"), Some("application/octet-stream"));
    assert_eq!(request.headers.get("user-agent"), Some("updraft"));
    assert_eq!(request.headers.get("cache-control"), Some("no-cache"));
    assert!(body.is_none());
}

// -- download to file --------------------------------------------------------

const PAYLOAD: &[u8] = b"update payload v1.2.0";

#[tokio::test]
async fn file_download_verifies_sha256() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("app.zip");
    let executor = executor([Reply::ok().body(&PAYLOAD[..6]).body(&PAYLOAD[6..])]);
    let options = DownloadOptions::default().sha2(hex::encode(Sha256Hasher::digest(PAYLOAD)));

    let stored = executor
        .download("https://cdn.example.com/app.zip", &destination, &options)
        .await
        .unwrap();

    assert_eq!(stored, destination);
    assert_eq!(std::fs::read(&destination).unwrap(), PAYLOAD);
    assert_eq!(dir_entries(dir.path()), 1);
}

#[tokio::test]
async fn file_download_rejects_bad_digest() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("app.zip");
    let executor = executor([Reply::ok().body(PAYLOAD)]);
    let expected = hex::encode(Sha256Hasher::digest(b"something else"));
    let options = DownloadOptions::default().sha2(expected.clone());

    let err = executor
        .download("https://cdn.example.com/app.zip", &destination, &options)
        .await
        .unwrap_err();

    assert_eq!(err.code(), "ERR_CHECKSUM_MISMATCH");
    assert!(err.to_string().contains(&expected));
    assert!(err.to_string().contains(&hex::encode(Sha256Hasher::digest(PAYLOAD))));
    assert_eq!(dir_entries(dir.path()), 0);
}

#[tokio::test]
async fn file_download_verifies_base64_sha512() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("app.zip");
    let executor = executor([Reply::ok().body(PAYLOAD)]);
    let expected = Encoding::Base64.encode(&Sha512Hasher::digest(PAYLOAD));
    // sha512 wins over a wrong sha2
    let options = DownloadOptions::default().sha512(expected).sha2("00");

    executor
        .download("https://cdn.example.com/app.zip", &destination, &options)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&destination).unwrap(), PAYLOAD);
}

#[tokio::test]
async fn checksum_header_conflict_fails_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("app.zip");
    let executor = executor([Reply::ok().header("X-Checksum-Sha2", "bb").body(PAYLOAD)]);
    let options = DownloadOptions::default().sha2("aa");

    let err = executor
        .download("https://cdn.example.com/app.zip", &destination, &options)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ChecksumHeaderMismatch { .. }));
    assert!(!executor.transport().body_read());
    assert_eq!(dir_entries(dir.path()), 0);
}

#[tokio::test]
async fn file_download_reports_final_progress() {
    let dir = tempfile::tempdir().unwrap();
    let seen = Arc::new(Mutex::new(Vec::<Progress>::new()));
    let sink = seen.clone();
    let executor = executor([Reply::ok()
        .header("Content-Length", &PAYLOAD.len().to_string())
        .body(PAYLOAD)]);
    let options = DownloadOptions::default()
        .on_progress(Arc::new(move |p: &Progress| sink.lock().unwrap().push(p.clone())));

    executor
        .download("https://cdn.example.com/app.zip", dir.path().join("app.zip"), &options)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    let last = seen.last().unwrap();
    assert_eq!(last.total, PAYLOAD.len() as u64);
    assert_eq!(last.transferred, PAYLOAD.len() as u64);
    assert_eq!(last.percent, 100.0);
}

#[tokio::test]
async fn file_path_has_no_size_cap() {
    // only the in-memory path enforces max_buffer_size
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("big.bin");
    let executor = HttpExecutor::with_config(
        Scripted::new([Reply::ok().body(vec![1u8; 4096])]),
        ExecutorConfig::default().max_buffer_size(1024),
    );

    executor
        .download("https://cdn.example.com/big.bin", &destination, &DownloadOptions::default())
        .await
        .unwrap();
    assert_eq!(std::fs::metadata(&destination).unwrap().len(), 4096);
}

// -- cancellation and timeouts ----------------------------------------------

#[tokio::test]
async fn cancelled_before_start_sends_nothing() {
    let executor = executor([]);
    let token = CancellationToken::new();
    token.cancel();

    let err = executor.request(api_options(), &token).await.unwrap_err();
    assert!(err.is_cancelled());

    let options = DownloadOptions::default().cancellation_token(token);
    let err = executor
        .download_to_buffer("https://cdn.example.com/blob", &options)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(executor.transport().requests().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_pending_request_settles_cancelled() {
    let executor = executor([Reply::Hang]);
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });

    let err = executor.request(api_options(), &token).await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.code(), "ERR_CANCELLED");
    assert_eq!(executor.transport().requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_download_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("app.zip");
    let executor = executor([Reply::ok().body(PAYLOAD).stalled()]);
    let token = CancellationToken::new();
    let options = DownloadOptions::default().cancellation_token(token.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        token.cancel();
    });

    let err = executor
        .download("https://cdn.example.com/app.zip", &destination, &options)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(dir_entries(dir.path()), 0);
}

#[tokio::test(start_paused = true)]
async fn silent_server_times_out() {
    let executor = executor([Reply::Hang]);

    let err = executor.request(api_options(), &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Request timed out");
    assert_eq!(err.code(), "ERR_TIMEOUT");
}

#[tokio::test(start_paused = true)]
async fn stalled_body_times_out() {
    let executor = HttpExecutor::with_config(
        Scripted::new([Reply::ok().body("partial").stalled()]),
        ExecutorConfig::default().inactivity_timeout(Duration::from_secs(5)),
    );

    let err = executor
        .download_to_buffer("https://cdn.example.com/blob", &DownloadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout));
}

#[tokio::test]
async fn aborted_body_is_reported() {
    struct Aborting;

    impl Transport for Aborting {
        async fn send(&self, _: &RequestOptions, _: Option<Bytes>) -> Result<Response, TransportError> {
            let chunks = vec![Ok(Bytes::from_static(b"par")), Err(TransportError::Aborted)];
            Ok(Response::new(200, "OK", Headers::new(), Body::new(stream::iter(chunks))))
        }
    }

    let err = HttpExecutor::new(Aborting)
        .request(api_options(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Request has been aborted by the server");
    assert_eq!(err.code(), "ERR_ABORTED");
}
