//! Minimal JSON-over-HTTP client with safe logging and flexible auth.
//!
//! - Request options: headers, `Auth`, query params, timeout
//! - Redacts secret headers and query params, never logs secret values
//! - Single attempt per call: failures surface immediately with their status
//! - Optional *raw* request/response logging via `HEALTHTRUST_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), healthtrust_http::HttpError> {
//! let client = healthtrust_http::HttpClient::new("https://api.example.com/v1")?;
//! let got: serde_json::Value = client
//!     .get_json("items", healthtrust_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, truncated body snippets, final errors, and (optionally)
//! raw request/response lines (target `http.raw`).

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::time::Duration;
use thiserror::Error;

pub use reqwest::StatusCode;

const RAW_ENV: &str = "HEALTHTRUST_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

const SECRET_QUERY_KEYS: &[&str] = &[
    "access_token",
    "authorization",
    "auth",
    "key",
    "api_key",
    "apikey",
    "token",
    "secret",
    "client_secret",
    "bearer",
];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("authorization")
        || name.eq_ignore_ascii_case("x-api-key")
        || name.eq_ignore_ascii_case("api-key")
}

/// Render a best-effort curl command for repro/debug with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in headers.iter() {
        let shown = if is_secret_header(name.as_str()) {
            "<redacted>".to_string()
        } else {
            val.to_str().unwrap_or("").to_string()
        };
        parts.push(format!(
            "-H '{}: {}'",
            name.as_str(),
            shown.replace('\'', r"'\''")
        ));
    }
    if let Some(bytes) = body {
        match std::str::from_utf8(bytes) {
            Ok(s) => {
                let mut s = s.to_string();
                if s.len() > RAW_MAX_BODY {
                    truncate_at_char(&mut s, RAW_MAX_BODY);
                    s.push('…');
                }
                parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
            }
            Err(_) => parts.push(format!("--data-binary @- # ({} bytes)", bytes.len())),
        }
    }
    let (host_path, _) = redact_query(url);
    parts.push(format!("'{}://{}'", url.scheme(), host_path));
    parts.join(" ")
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("request timed out: {0}")]
    Timeout(String),
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

impl HttpError {
    /// HTTP status carried by an API error, if the server answered at all.
    ///
    /// ```
    /// use healthtrust_http::HttpError;
    /// use reqwest::StatusCode;
    ///
    /// let err = HttpError::Api {
    ///     status: StatusCode::PAYMENT_REQUIRED,
    ///     message: "no credits".into(),
    ///     request_id: "-".into(),
    /// };
    /// assert_eq!(err.status(), Some(402));
    /// assert_eq!(HttpError::Network("reset".into()).status(), None);
    /// ```
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Api { status, .. } => Some(status.as_u16()),
            _ => None,
        }
    }

    /// Server-supplied error message, when one was extracted.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            HttpError::Api { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Authentication strategies supported by the client.
///
/// ```
/// use healthtrust_http::Auth;
///
/// let bearer = Auth::Bearer("token");
/// match bearer {
///     Auth::Bearer(value) => assert_eq!(value, "token"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    /// Secret carried in a custom header, e.g. `X-API-Key`.
    Header { name: &'static str, value: &'a str },
    None,
}

impl Auth<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Auth::Bearer(_) => "bearer",
            Auth::Header { .. } => "header",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs.
///
/// ```
/// use healthtrust_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(8)),
///     auth: Some(Auth::Header { name: "X-API-Key", value: "demo" }),
///     query: Some(vec![("page", Cow::Borrowed("1"))]),
///     ..Default::default()
/// };
/// assert_eq!(opts.timeout.unwrap().as_secs(), 8);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub user_agent: Option<String>,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// The base is treated as a directory: relative paths (with or without a
    /// leading `/`) are appended to it rather than replacing its last segment.
    ///
    /// ```
    /// use healthtrust_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com/api/v1")?;
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// assert_eq!(
    ///     client.resolve("/chat/completions")?.as_str(),
    ///     "https://api.example.com/api/v1/chat/completions"
    /// );
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base.trim()).map_err(|e| HttpError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            user_agent: None,
        })
    }

    /// Override the default per-request timeout.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Send a fixed `User-Agent` on every request.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Join a relative path onto the base URL.
    pub fn resolve(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// GET JSON.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let bytes = self
            .request_internal::<()>(Method::GET, path, None, opts)
            .await?;
        decode_body(&bytes)
    }

    /// POST JSON and decode a JSON reply.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self
            .request_internal(Method::POST, path, Some(body), opts)
            .await?;
        decode_body(&bytes)
    }

    /// PUT JSON and decode a JSON reply.
    pub async fn put_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = self
            .request_internal(Method::PUT, path, Some(body), opts)
            .await?;
        decode_body(&bytes)
    }

    /// DELETE and decode a JSON reply (an empty body decodes as `null`).
    pub async fn delete_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let bytes = self
            .request_internal::<()>(Method::DELETE, path, None, opts)
            .await?;
        decode_body(&bytes)
    }

    /// GET without decoding the body; succeeds on any 2xx.
    pub async fn ping(&self, path: &str, opts: RequestOpts<'_>) -> Result<(), HttpError> {
        self.request_internal::<()>(Method::GET, path, None, opts)
            .await
            .map(|_| ())
    }

    async fn request_internal<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<Vec<u8>, HttpError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path)?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut headers = opts.headers.clone().unwrap_or_default();
        if let Some(agent) = &self.user_agent {
            let value =
                HeaderValue::from_str(agent).map_err(|e| HttpError::Build(e.to_string()))?;
            headers.insert(USER_AGENT, value);
        }

        let mut rb = self.inner.request(method.clone(), url.clone()).timeout(timeout);

        if let Some(q) = &opts.query {
            let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
            rb = rb.query(&pairs);
        }

        let request_body = match body {
            Some(b) => {
                let bytes = serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?;
                headers.insert(
                    reqwest::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                Some(bytes)
            }
            None => None,
        };

        let auth = opts.auth.clone().unwrap_or(Auth::None);
        match &auth {
            Auth::Bearer(tok) => {
                let tok = sanitize_secret(tok)?;
                let value = HeaderValue::from_str(&format!("Bearer {tok}"))
                    .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
            Auth::Header { name, value } => {
                let secret = sanitize_secret(value)?;
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| HttpError::Build(format!("invalid header name {name}: {e}")))?;
                let value =
                    HeaderValue::from_str(&secret).map_err(|e| HttpError::Build(e.to_string()))?;
                headers.insert(name, value);
            }
            Auth::None => {}
        }

        rb = rb.headers(headers.clone());
        if let Some(bytes) = &request_body {
            rb = rb.body(bytes.clone());
        }

        let req_id = format!("r{}", uuid::Uuid::new_v4().simple());
        let (host_path, redacted_q) = redact_query(&url);
        let mut query_log = redacted_q;
        if let Some(q) = &opts.query {
            query_log.extend(q.iter().map(|(k, v)| ((*k).to_string(), redact_value(k, v))));
        }

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%host_path,
            query=?query_log,
            timeout_ms=timeout.as_millis() as u64,
            auth_kind=auth.kind(),
            has_body=%request_body.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let curl = make_curl(&method, &url, &headers, request_body.as_deref());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, timeout=err.is_timeout(), message=%message, "http.network_error.send");
            if err.is_timeout() {
                HttpError::Timeout(message)
            } else {
                HttpError::Network(message)
            }
        })?;

        let status = resp.status();
        let resp_headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            if err.is_timeout() {
                HttpError::Timeout(message)
            } else {
                HttpError::Network(message)
            }
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let request_id = resp_headers
            .get("x-request-id")
            .or_else(|| resp_headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string();

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%request_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&resp_headers);
            let truncated = bytes.len() > RAW_MAX_BODY;
            let text = String::from_utf8_lossy(&bytes[..bytes.len().min(RAW_MAX_BODY)]);
            tracing::info!(
                target: "http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(
            req_id=%req_id,
            %status,
            message=%message,
            x_request_id=%request_id,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            request_id,
        })
    }
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, HttpError> {
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };
    serde_json::from_slice::<T>(bytes).map_err(|e| {
        let snippet = snip_body(bytes);
        tracing::warn!(
            serde_line=%e.line(),
            serde_col=%e.column(),
            serde_err=%e,
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

/// Pull a human-readable message out of the usual error envelopes.
fn extract_error_message(body: &[u8]) -> String {
    // {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct Nested {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }

    // {"message":"..."} or {"detail":"..."} or {"error":"..."}
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Nested>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Flat>(body) {
        for candidate in [m.message, m.detail, m.error] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        truncate_at_char(&mut snip, SNIPPET_MAX);
        snip.push_str("...");
    }
    snip
}

fn truncate_at_char(s: &mut String, max: usize) {
    let mut cut = max.min(s.len());
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

/// Normalise a secret before it goes into a header.
fn sanitize_secret(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("credential is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("credential contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "credential contains control characters".into(),
        ));
    }
    Ok(s)
}

fn redact_value(key: &str, value: &str) -> String {
    let lower = key.to_ascii_lowercase();
    if SECRET_QUERY_KEYS.contains(&lower.as_str()) {
        "<redacted>".to_string()
    } else {
        value.to_string()
    }
}

/// Split a URL into "host + path" and a redacted query list for logging.
fn redact_query(url: &Url) -> (String, Vec<(String, String)>) {
    let host = url.host_str().unwrap_or("-");
    let host_path = match url.port() {
        Some(port) => format!("{host}:{port}{}", url.path()),
        None => format!("{host}{}", url.path()),
    };
    let redacted = url
        .query_pairs()
        .map(|(k, v)| (k.to_string(), redact_value(&k, &v)))
        .collect();
    (host_path, redacted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_without_trailing_slash_keeps_last_segment() {
        let client = HttpClient::new("https://api.alle-ai.com/api/v1").unwrap();
        assert_eq!(
            client.resolve("chat/completions").unwrap().as_str(),
            "https://api.alle-ai.com/api/v1/chat/completions"
        );
        assert_eq!(
            client.resolve("/posts/7/like").unwrap().as_str(),
            "https://api.alle-ai.com/api/v1/posts/7/like"
        );
    }

    #[test]
    fn sanitize_strips_quotes_and_whitespace() {
        assert_eq!(sanitize_secret(" 'ab c\n' ").unwrap(), "abc");
        assert!(sanitize_secret("   ").is_err());
        assert!(sanitize_secret("kéy").is_err());
    }

    #[test]
    fn error_message_prefers_nested_envelope() {
        let body = br#"{"error":{"message":"Insufficient credits"}}"#;
        assert_eq!(extract_error_message(body), "Insufficient credits");

        let body = br#"{"detail":"slow down"}"#;
        assert_eq!(extract_error_message(body), "slow down");

        assert_eq!(extract_error_message(b"plain"), "plain");
    }

    #[test]
    fn empty_body_decodes_as_null() {
        let v: serde_json::Value = decode_body(b"").unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn secrets_are_redacted_from_logs() {
        let url = Url::parse("https://h.example:8080/p?api_key=s3cret&page=2").unwrap();
        let (host_path, q) = redact_query(&url);
        assert_eq!(host_path, "h.example:8080/p");
        assert_eq!(
            q,
            vec![
                ("api_key".to_string(), "<redacted>".to_string()),
                ("page".to_string(), "2".to_string())
            ]
        );

        let mut h = HeaderMap::new();
        h.insert("x-api-key", HeaderValue::from_static("abc"));
        h.insert("accept", HeaderValue::from_static("*/*"));
        let red = redact_headers(&h);
        assert!(red.contains(&("x-api-key".to_string(), "<redacted>".to_string())));
        assert!(red.contains(&("accept".to_string(), "*/*".to_string())));
    }

    #[test]
    fn curl_hides_secret_headers() {
        let url = Url::parse("https://h.example/chat").unwrap();
        let mut h = HeaderMap::new();
        h.insert("x-api-key", HeaderValue::from_static("abc"));
        let curl = make_curl(&Method::POST, &url, &h, Some(br#"{"a":1}"#));
        assert!(!curl.contains("abc"));
        assert!(curl.contains("<redacted>"));
        assert!(curl.contains(r#"-d '{"a":1}'"#));
    }
}
