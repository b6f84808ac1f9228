//! Result records returned by `RequestClient::run`

use crate::http::cookie::Cookie;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::HeaderMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// How a request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// No usable response: bad URL, DNS, refused connection, broken body
    #[serde(rename = "TransportError")]
    Transport,
    /// The server answered with an error status
    #[serde(rename = "HTTPStatusError")]
    HttpStatus,
}

/// What went wrong, in more detail than [`ErrorKind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// No URL configured
    MissingUrl,
    /// Unparseable URL or a scheme other than http(s)
    InvalidUrl,
    InvalidMethod,
    /// Header name or value that cannot go on the wire
    InvalidHeader,
    /// DNS failure or refused connection
    Connect,
    Timeout,
    /// Any other transport failure, such as a broken body
    Transport,
    /// Final status outside 2xx
    Status,
    /// Too many redirect hops
    RedirectLimit,
}

/// Why a request produced no successful response
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct RequestError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip)]
    pub status: Option<u16>,
    #[serde(skip)]
    pub cause: FailureCause,
}

impl RequestError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: message.into(),
            status: None,
            cause: FailureCause::Transport,
        }
    }

    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::HttpStatus,
            message: message.into(),
            status: Some(status),
            cause: FailureCause::Status,
        }
    }

    /// Redirect chain cut off while `status` still pointed elsewhere.
    pub fn redirect_limit(status: u16, message: impl Into<String>) -> Self {
        Self {
            cause: FailureCause::RedirectLimit,
            ..Self::http_status(status, message)
        }
    }

    pub fn with_cause(mut self, cause: FailureCause) -> Self {
        self.cause = cause;
        self
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        let message = error_chain(&err);
        if let Some(status) = err.status() {
            return Self::http_status(status.as_u16(), message);
        }
        let cause = if err.is_timeout() {
            FailureCause::Timeout
        } else if err.is_connect() {
            FailureCause::Connect
        } else {
            FailureCause::Transport
        };
        Self::transport(message).with_cause(cause)
    }
}

/// Render an error with its sources, `outer: inner: root`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

/// A completed request
#[derive(Debug, Clone, Serialize)]
pub struct ResponseResult {
    /// URL the request finished at, after redirects
    pub url: String,
    pub code: u16,
    /// Lower-cased header names; the last value wins for repeated headers
    pub headers: BTreeMap<String, String>,
    pub body: String,
    /// Every cookie in the client's store after this request
    pub cookies: Vec<Cookie>,
    /// Seconds from sending the first hop to reading the final body
    pub duration: f64,
}

/// A failed request
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResult {
    /// Always `true`, so serialized results can be told apart
    pub error: bool,
    pub exception: RequestError,
    /// HTTP status, serialized as `"NULL"` when the failure carried none
    #[serde(serialize_with = "serialize_code")]
    pub code: Option<u16>,
    pub duration: f64,
}

impl ErrorResult {
    pub fn new(exception: RequestError, duration: f64) -> Self {
        Self {
            error: true,
            code: exception.status,
            exception,
            duration,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.exception.kind
    }

    /// Status code as text, `"NULL"` when absent.
    pub fn code_label(&self) -> String {
        self.code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "NULL".to_string())
    }
}

fn serialize_code<S: Serializer>(code: &Option<u16>, serializer: S) -> Result<S::Ok, S::Error> {
    match code {
        Some(code) => serializer.serialize_u16(*code),
        None => serializer.serialize_str("NULL"),
    }
}

/// Outcome of one `run` call
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RunResult {
    Response(ResponseResult),
    Error(ErrorResult),
}

impl RunResult {
    pub fn is_error(&self) -> bool {
        matches!(self, RunResult::Error(_))
    }

    pub fn code(&self) -> Option<u16> {
        match self {
            RunResult::Response(response) => Some(response.code),
            RunResult::Error(error) => error.code,
        }
    }

    pub fn duration(&self) -> f64 {
        match self {
            RunResult::Response(response) => response.duration,
            RunResult::Error(error) => error.duration,
        }
    }

    pub fn response(&self) -> Option<&ResponseResult> {
        match self {
            RunResult::Response(response) => Some(response),
            RunResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorResult> {
        match self {
            RunResult::Response(_) => None,
            RunResult::Error(error) => Some(error),
        }
    }

    pub fn into_result(self) -> Result<ResponseResult, ErrorResult> {
        match self {
            RunResult::Response(response) => Ok(response),
            RunResult::Error(error) => Err(error),
        }
    }
}

/// Flatten response headers into a name -> value map.
pub(crate) fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

pub(crate) fn extract_charset(content_type: Option<&str>) -> Option<String> {
    content_type?.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("charset") {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Decode a body with the declared charset, falling back to UTF-8.
pub(crate) fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = extract_charset(content_type)
        .and_then(|charset| Encoding::for_label(charset.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, SET_COOKIE};

    #[test]
    fn extract_charset_parses_case_insensitive() {
        assert_eq!(
            extract_charset(Some("text/plain; charset=utf-8")),
            Some("utf-8".to_string())
        );
        assert_eq!(
            extract_charset(Some("text/html; CHARSET=\"iso-8859-1\"")),
            Some("iso-8859-1".to_string())
        );
        assert_eq!(extract_charset(Some("text/plain")), None);
        assert_eq!(extract_charset(None), None);
    }

    #[test]
    fn decode_body_uses_declared_encoding() {
        let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode("\u{00A3}");
        assert_eq!(
            decode_body(&encoded, Some("text/plain; charset=windows-1252")),
            "\u{00A3}"
        );
        assert_eq!(
            decode_body("あ".as_bytes(), Some("text/plain; charset=unknown")),
            "あ"
        );
    }

    #[test]
    fn flatten_headers_keeps_last_value() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert("X-Trace", HeaderValue::from_static("t"));

        let flat = flatten_headers(&headers);
        assert_eq!(flat.get("set-cookie").map(String::as_str), Some("b=2"));
        assert_eq!(flat.get("x-trace").map(String::as_str), Some("t"));
    }

    #[test]
    fn error_result_serializes_null_code() {
        let result = RunResult::Error(ErrorResult::new(
            RequestError::transport("connection refused"),
            0.25,
        ));
        let json = serde_json::to_value(&result).expect("json");
        assert_eq!(json["error"], true);
        assert_eq!(json["code"], "NULL");
        assert_eq!(json["exception"]["kind"], "TransportError");
        assert_eq!(json["exception"]["message"], "connection refused");
        assert_eq!(json["duration"], 0.25);
    }

    #[test]
    fn error_result_carries_status_code() {
        let error = ErrorResult::new(RequestError::http_status(404, "Not Found"), 0.0);
        assert_eq!(error.code, Some(404));
        assert_eq!(error.code_label(), "404");
        assert_eq!(error.kind(), ErrorKind::HttpStatus);

        let json = serde_json::to_value(RunResult::Error(error)).expect("json");
        assert_eq!(json["code"], 404);
        assert_eq!(json["exception"]["kind"], "HTTPStatusError");
    }

    #[test]
    fn run_result_accessors() {
        let ok = RunResult::Response(ResponseResult {
            url: "http://example.com/".to_string(),
            code: 200,
            headers: BTreeMap::new(),
            body: String::new(),
            cookies: vec![],
            duration: 0.5,
        });
        assert!(!ok.is_error());
        assert_eq!(ok.code(), Some(200));
        assert_eq!(ok.duration(), 0.5);
        assert!(ok.error().is_none());
        assert_eq!(ok.into_result().expect("response").code, 200);
    }
}
