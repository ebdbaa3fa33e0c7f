//! JSON-over-HTTP client used by the publishers.
//!
//! Every request gets a local id that ties its log events together. Secrets
//! never reach the logs: the `Authorization` header is marked sensitive and
//! redacted from every dump. One call is one round trip; retry policy belongs
//! to the caller.
//!
//! A 2xx reply is returned with its raw body so the caller can judge the
//! status before it cares about the payload; [`HttpResponse::json`] decodes
//! on demand. Anything else becomes [`HttpError::Api`].
//!
//! Set `PROMO_HTTP_RAW=1` to get a curl line per request and the full
//! response under the `http.raw` target.
//!
//! ```no_run
//! # async fn demo() -> Result<(), promo_http::HttpError> {
//! let client = promo_http::HttpClient::new("https://api.example.com")?;
//! let resp = client
//!     .post_json("v1/items", &serde_json::json!({"name": "x"}), promo_http::RequestOpts::default())
//!     .await?;
//! let body: serde_json::Value = resp.json()?;
//! assert!(resp.status.is_success() && body.is_object());
//! # Ok(()) }
//! ```

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

pub use reqwest::StatusCode;

const RAW_ENV: &str = "PROMO_HTTP_RAW";
/// Cap for raw body dumps.
const RAW_MAX_BODY: usize = 64 * 1024;
/// Cap for body snippets in ordinary log events and errors.
const SNIPPET_MAX: usize = 500;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1" | "true" | "yes")
    )
}

fn next_request_id() -> String {
    format!("r{:06}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed))
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// One-line curl reproduction of a request, secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut cmd = format!("curl -X{method}");
    for (name, value) in redact_headers(headers) {
        cmd.push_str(" -H ");
        cmd.push_str(&shell_quote(&format!("{name}: {value}")));
    }
    match body.map(std::str::from_utf8) {
        Some(Ok(text)) => {
            let mut text = truncate_on_char_boundary(text, RAW_MAX_BODY).to_string();
            if text.len() < body.map_or(0, <[u8]>::len) {
                text.push('…');
            }
            cmd.push_str(" -d ");
            cmd.push_str(&shell_quote(&text));
        }
        Some(Err(_)) => {
            let len = body.map_or(0, <[u8]>::len);
            cmd.push_str(&format!(" --data-binary @- # ({len} bytes)"));
        }
        None => {}
    }
    cmd.push(' ');
    cmd.push_str(&shell_quote(url.as_str()));
    cmd
}

fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if *name == AUTHORIZATION || value.is_sensitive() {
                "<redacted>"
            } else {
                value.to_str().unwrap_or("")
            };
            (name.as_str().to_string(), shown.to_string())
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

/// How a request authenticates.
///
/// ```
/// use promo_http::Auth;
/// use reqwest::header::{AUTHORIZATION, HeaderValue};
///
/// let auth = Auth::Header {
///     name: AUTHORIZATION,
///     value: HeaderValue::from_static("OAuth oauth_token=\"x\""),
/// };
/// assert_eq!(auth.kind(), "header");
/// assert_eq!(Auth::None.kind(), "none");
/// ```
#[derive(Clone, Debug)]
pub enum Auth {
    /// Precomputed header, e.g. an OAuth 1.0a `Authorization` value.
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    None,
}

impl Auth {
    /// Label used in logs in place of the secret.
    pub fn kind(&self) -> &'static str {
        match self {
            Auth::Header { .. } => "header",
            Auth::None => "none",
        }
    }
}

/// Per-request overrides of the client defaults.
///
/// ```
/// use promo_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(opts.auth.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth>,
}

/// A 2xx reply. The body is kept raw; see [`HttpResponse::json`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    /// Server-side id (`x-request-id` / `x-transaction-id`), `-` when absent.
    pub request_id: String,
}

impl HttpResponse {
    /// Decode the body as JSON.
    ///
    /// ```
    /// use promo_http::{HttpError, HttpResponse, StatusCode};
    ///
    /// let resp = HttpResponse {
    ///     status: StatusCode::CREATED,
    ///     body: br#"{"data":{"id":"7"}}"#.to_vec(),
    ///     request_id: "-".into(),
    /// };
    /// let v: serde_json::Value = resp.json()?;
    /// assert_eq!(v["data"]["id"], "7");
    ///
    /// let empty = HttpResponse { body: Vec::new(), ..resp };
    /// assert!(matches!(empty.json::<serde_json::Value>(), Err(HttpError::Decode(..))));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpError::Decode(e.to_string(), snip_body(&self.body)))
    }
}

/// Rate-limit headers Twitter attaches to every response.
#[derive(Debug, Default)]
struct RateLimit<'a> {
    limit: Option<&'a str>,
    remaining: Option<&'a str>,
    reset: Option<&'a str>,
}

impl<'a> RateLimit<'a> {
    fn from_headers(headers: &'a HeaderMap) -> Self {
        let get = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        Self {
            limit: get("x-rate-limit-limit"),
            remaining: get("x-rate-limit-remaining"),
            reset: get("x-rate-limit-reset"),
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// ```
    /// use promo_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
        })
    }

    /// Absolute URL for `path` relative to the base.
    ///
    /// ```
    /// use promo_http::HttpClient;
    ///
    /// let client = HttpClient::new("https://api.twitter.com").unwrap();
    /// assert_eq!(
    ///     client.url_for("2/tweets").unwrap().as_str(),
    ///     "https://api.twitter.com/2/tweets"
    /// );
    /// ```
    pub fn url_for(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// POST `body` as JSON, once.
    ///
    /// Any 2xx status is returned with the raw body; the caller decides
    /// whether a particular success code is acceptable.
    pub async fn post_json<B>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts,
    ) -> Result<HttpResponse, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url_for(path)?;
        let payload = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        self.send(Method::POST, &url, Some(&payload), &opts).await
    }

    async fn send(
        &self,
        method: Method,
        url: &Url,
        payload: Option<&[u8]>,
        opts: &RequestOpts,
    ) -> Result<HttpResponse, HttpError> {
        let req_id_buf = next_request_id();
        let req_id = req_id_buf.as_str();
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let mut headers = HeaderMap::new();
        if payload.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if let Some(Auth::Header { name, value }) = &opts.auth {
            let mut value = value.clone();
            value.set_sensitive(true);
            headers.insert(name.clone(), value);
        }

        tracing::debug!(
            req_id,
            method = %method,
            host_path = %format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms = timeout.as_millis() as u64,
            auth_kind = opts.auth.as_ref().map_or("none", Auth::kind),
            has_body = payload.is_some(),
            "http.request.start"
        );
        if raw_enabled() {
            let curl = make_curl(&method, url, &headers, payload);
            tracing::debug!(target: "http.raw", req_id, %curl, "request");
        }

        let mut rb = self
            .inner
            .request(method, url.clone())
            .timeout(timeout)
            .headers(headers);
        if let Some(bytes) = payload {
            rb = rb.body(bytes.to_vec());
        }

        let started = Instant::now();
        let network = |e: reqwest::Error| {
            tracing::warn!(req_id, error = %e, "http.network_error");
            HttpError::Network(e.to_string())
        };
        let resp = rb.send().await.map_err(network)?;
        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(network)?;

        let request_id = resp_headers
            .get("x-request-id")
            .or_else(|| resp_headers.get("x-transaction-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();
        let rate = RateLimit::from_headers(&resp_headers);
        let snippet = snip_body(&bytes);

        tracing::debug!(
            req_id,
            %status,
            duration_ms = started.elapsed().as_millis() as u64,
            body_len = bytes.len(),
            x_request_id = %request_id,
            rate_limit.limit = ?rate.limit,
            rate_limit.remaining = ?rate.remaining,
            rate_limit.reset = ?rate.reset,
            "http.response"
        );
        tracing::trace!(req_id, body_snippet = %snippet, "http.response.body_snippet");
        if raw_enabled() {
            let shown = &bytes[..bytes.len().min(RAW_MAX_BODY)];
            tracing::info!(
                target: "http.raw",
                req_id,
                %status,
                headers = ?redact_headers(&resp_headers),
                body = %String::from_utf8_lossy(shown),
                truncated = bytes.len() > RAW_MAX_BODY,
                "response"
            );
        }

        if status.is_success() {
            return Ok(HttpResponse {
                status,
                body: bytes.to_vec(),
                request_id,
            });
        }

        let message = api_error_message(&bytes);
        tracing::warn!(
            req_id,
            %status,
            message = %message,
            x_request_id = %request_id,
            body_snippet = %snippet,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id,
        })
    }
}

/// Best human-readable message from an error body.
///
/// Understands Twitter's `{"errors":[...]}` envelope and RFC 7807 problem
/// details; anything else falls back to a body snippet.
fn api_error_message(body: &[u8]) -> String {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Described {
        message: String,
        detail: String,
        title: String,
    }

    #[derive(Deserialize)]
    struct Envelope {
        errors: Vec<Described>,
    }

    let first_non_empty =
        |candidates: [String; 3]| candidates.into_iter().find(|c| !c.trim().is_empty());

    if let Ok(envelope) = serde_json::from_slice::<Envelope>(body) {
        if let Some(e) = envelope.errors.into_iter().next() {
            if let Some(msg) = first_non_empty([e.message, e.detail, e.title]) {
                return msg;
            }
        }
    }
    if let Ok(d) = serde_json::from_slice::<Described>(body) {
        if let Some(msg) = first_non_empty([d.detail, d.message, d.title]) {
            return msg;
        }
    }
    snip_body(body)
}

fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn snip_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() > SNIPPET_MAX {
        format!("{}...", truncate_on_char_boundary(&text, SNIPPET_MAX))
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitter_error_envelope_prefers_message_then_detail() {
        let body = br#"{"errors":[{"message":"","detail":"You are not allowed to create a Tweet with duplicate content.","title":"Forbidden"}]}"#;
        assert_eq!(
            api_error_message(body),
            "You are not allowed to create a Tweet with duplicate content."
        );
    }

    #[test]
    fn problem_details_use_detail() {
        let body = br#"{"title":"Unauthorized","type":"about:blank","status":401,"detail":"Unauthorized"}"#;
        assert_eq!(api_error_message(body), "Unauthorized");
    }

    #[test]
    fn non_json_error_falls_back_to_snippet() {
        assert_eq!(api_error_message(b"bad gateway"), "bad gateway");
    }

    #[test]
    fn snip_body_caps_length_on_char_boundary() {
        let long = "é".repeat(400);
        let snip = snip_body(long.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= 503);
    }

    #[test]
    fn curl_rendering_redacts_authorization() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_static("OAuth oauth_signature=\"secret\""),
        );
        headers.insert("x-trace", HeaderValue::from_static("abc"));
        let url = Url::parse("https://api.twitter.com/2/tweets").unwrap();
        let curl = make_curl(&Method::POST, &url, &headers, Some(&br#"{"text":"hi"}"#[..]));
        assert!(!curl.contains("secret"));
        assert!(curl.contains("authorization: <redacted>"));
        assert!(curl.contains("x-trace: abc"));
        assert!(curl.contains(r#"-d '{"text":"hi"}'"#));
    }

    #[test]
    fn json_decode_failure_keeps_a_snippet() {
        let resp = HttpResponse {
            status: StatusCode::CREATED,
            body: b"not json".to_vec(),
            request_id: "-".into(),
        };
        assert!(matches!(
            resp.json::<serde_json::Value>(),
            Err(HttpError::Decode(_, ref snip)) if snip == "not json"
        ));
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(next_request_id(), next_request_id());
    }
}
