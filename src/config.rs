//! Request configuration for jarhttp
//!
//! [`RequestConfig`] is the state a [`RequestClient`](crate::http::RequestClient)
//! carries between calls. [`RequestFields`] is the partial update applied to it
//! by `new`, `set_data` and `run`.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// HTTP method enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Trace,
    Connect,
    /// Any other method token, sent verbatim.
    Extension(String),
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Extension(token) => token,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "PATCH" => Ok(HttpMethod::Patch),
            "TRACE" => Ok(HttpMethod::Trace),
            "CONNECT" => Ok(HttpMethod::Connect),
            _ if is_token(s) => Ok(HttpMethod::Extension(s.to_string())),
            _ => Err(format!("Invalid HTTP method: '{}'", s)),
        }
    }
}

/// RFC 9110 `token` characters.
fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}

/// Partial update of a [`RequestConfig`].
///
/// Every field left as `None` keeps the stored value. A provided `headers` or
/// `data` map replaces the stored map as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFields {
    pub url: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub method: Option<HttpMethod>,
    pub data: Option<BTreeMap<String, String>>,
    /// `Some(None)` clears a stored body so `data` is used again.
    pub body: Option<Option<String>>,
}

impl RequestFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add one header to the replacement header map.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(
            self.headers.get_or_insert_with(HashMap::new),
            name.into(),
            value.into(),
        );
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = Some(
            headers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.data = Some(
            data.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(Some(body.into()));
        self
    }

    pub fn clear_body(mut self) -> Self {
        self.body = Some(None);
        self
    }
}

/// Header names are case-insensitive: a new spelling replaces the old one.
fn insert_header(headers: &mut HashMap<String, String>, name: String, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

/// Configuration carried by a client across calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub url: Option<String>,
    pub headers: HashMap<String, String>,
    pub method: HttpMethod,
    pub data: BTreeMap<String, String>,
    /// When set, sent verbatim instead of the form-encoded `data`.
    pub body: Option<String>,
}

impl RequestConfig {
    pub fn from_fields(fields: RequestFields) -> Self {
        let mut config = Self::default();
        config.merge(fields);
        config
    }

    /// Overwrite every field present in `fields`.
    pub fn merge(&mut self, fields: RequestFields) {
        let RequestFields {
            url,
            headers,
            method,
            data,
            body,
        } = fields;

        if let Some(url) = url {
            self.url = Some(url);
        }
        if let Some(headers) = headers {
            // Sorted so two spellings of one name always resolve the same way.
            let mut entries: Vec<_> = headers.into_iter().collect();
            entries.sort();
            self.headers.clear();
            for (name, value) in entries {
                insert_header(&mut self.headers, name, value);
            }
        }
        if let Some(method) = method {
            self.method = method;
        }
        if let Some(data) = data {
            self.data = data;
        }
        if let Some(body) = body {
            self.body = body;
        }
    }

    /// Set one header, replacing any stored header of the same name in any case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        insert_header(&mut self.headers, name.into(), value.into());
    }
}

/// Output configuration for the command-line runner
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Write results here instead of stdout
    pub file: Option<PathBuf>,
    /// Pretty-print each JSON result
    pub pretty: bool,
    /// Suppress stdout output and error messages
    pub silent: bool,
}

#[cfg(test)]
mod tests {
    use super::{HttpMethod, RequestConfig, RequestFields};

    #[test]
    fn defaults_after_construction() {
        let config = RequestConfig::from_fields(RequestFields::new());
        assert_eq!(config.url, None);
        assert!(config.headers.is_empty());
        assert!(config.data.is_empty());
        assert_eq!(config.method, HttpMethod::Get);
        assert_eq!(config.body, None);
    }

    #[test]
    fn merge_overwrites_only_provided_fields() {
        let mut config = RequestConfig::from_fields(
            RequestFields::new()
                .url("http://example.com")
                .header("X-One", "1")
                .data([("a", "1")]),
        );

        config.merge(RequestFields::new().method(HttpMethod::Post));
        assert_eq!(config.url.as_deref(), Some("http://example.com"));
        assert_eq!(config.headers.get("X-One").map(String::as_str), Some("1"));
        assert_eq!(config.data.get("a").map(String::as_str), Some("1"));
        assert_eq!(config.method, HttpMethod::Post);
    }

    #[test]
    fn merge_replaces_header_map_wholesale() {
        let mut config =
            RequestConfig::from_fields(RequestFields::new().header("X-One", "1"));
        config.merge(RequestFields::new().header("X-Two", "2"));
        assert!(!config.headers.contains_key("X-One"));
        assert!(config.headers.contains_key("X-Two"));
    }

    #[test]
    fn empty_fields_leave_config_unchanged() {
        let mut config = RequestConfig::from_fields(
            RequestFields::new()
                .url("http://example.com/login")
                .body("raw"),
        );
        let before = config.clone();
        config.merge(RequestFields::new());
        assert_eq!(config, before);
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let mut config =
            RequestConfig::from_fields(RequestFields::new().header("User-Agent", "caller"));
        config.set_header("User-agent", "X");
        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers.get("User-agent").map(String::as_str), Some("X"));

        let fields = RequestFields::new()
            .header("accept", "text/plain")
            .header("Accept", "text/html");
        assert_eq!(fields.headers.as_ref().map(|h| h.len()), Some(1));
    }

    #[test]
    fn merge_resolves_duplicate_spellings_deterministically() {
        for _ in 0..50 {
            let config = RequestConfig::from_fields(
                RequestFields::new().headers([("X-Mode", "upper"), ("x-mode", "lower")]),
            );
            assert_eq!(config.headers.len(), 1);
            assert_eq!(config.headers.get("x-mode").map(String::as_str), Some("lower"));
        }
    }

    #[test]
    fn clear_body_unsets_stored_body() {
        let mut config = RequestConfig::from_fields(RequestFields::new().body("raw"));
        config.merge(RequestFields::new().clear_body());
        assert_eq!(config.body, None);
    }

    #[test]
    fn method_parses_known_and_extension_tokens() {
        assert_eq!("post".parse::<HttpMethod>(), Ok(HttpMethod::Post));
        assert_eq!("Connect".parse::<HttpMethod>(), Ok(HttpMethod::Connect));
        assert_eq!(
            "PROPFIND".parse::<HttpMethod>(),
            Ok(HttpMethod::Extension("PROPFIND".to_string()))
        );
        assert!("BAD METHOD".parse::<HttpMethod>().is_err());
        assert!("".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn method_display_matches_wire_form() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(HttpMethod::Extension("MKCOL".into()).to_string(), "MKCOL");
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }
}
