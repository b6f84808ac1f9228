//! HTTP request preparation
//!
//! Turns the stored [`RequestConfig`] into a wire-ready request and rewrites
//! it for each redirect hop.

use crate::config::RequestConfig;
use crate::http::response::{FailureCause, RequestError};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, LOCATION,
};
use reqwest::{Method, StatusCode};
use std::collections::BTreeMap;
use url::form_urlencoded;
use url::Url;

/// Form-encode `data` as `key=value` pairs joined by `&`.
pub fn form_encode(data: &BTreeMap<String, String>) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(data)
        .finish()
}

/// The payload `run` sends: the body verbatim, or else the encoded data.
pub fn payload(config: &RequestConfig) -> String {
    match &config.body {
        Some(body) => body.clone(),
        None => form_encode(&config.data),
    }
}

/// One request hop, ready to hand to the transport.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl PreparedRequest {
    /// Build the first hop from the client configuration.
    pub fn from_config(config: &RequestConfig) -> Result<Self, RequestError> {
        let raw_url = config
            .url
            .as_deref()
            .ok_or_else(|| {
                RequestError::transport("No URL configured").with_cause(FailureCause::MissingUrl)
            })?;
        let url = Url::parse(raw_url).map_err(|e| {
            RequestError::transport(format!("Invalid URL '{}': {}", raw_url, e))
                .with_cause(FailureCause::InvalidUrl)
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(RequestError::transport(format!(
                "Invalid URL '{}': unsupported scheme '{}'",
                raw_url,
                url.scheme()
            ))
            .with_cause(FailureCause::InvalidUrl));
        }

        let method = Method::from_bytes(config.method.as_str().as_bytes()).map_err(|_| {
            RequestError::transport(format!("Invalid HTTP method: '{}'", config.method))
                .with_cause(FailureCause::InvalidMethod)
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                RequestError::transport(format!("Invalid header name: '{}'", name))
                    .with_cause(FailureCause::InvalidHeader)
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|_| {
                RequestError::transport(format!("Invalid value for header '{}'", name))
                    .with_cause(FailureCause::InvalidHeader)
            })?;
            headers.insert(header_name, header_value);
        }

        let payload = payload(config);
        let body = if payload.is_empty() { None } else { Some(payload) };

        Ok(Self {
            method,
            url,
            headers,
            body,
        })
    }

    /// The hop that follows a redirect with `status` to `location`.
    ///
    /// 307 and 308 repeat the request as is. The other redirect codes switch
    /// to a body-less GET (HEAD stays HEAD).
    pub fn redirect(&self, status: StatusCode, location: Url) -> Self {
        let mut next = self.clone();
        next.url = location;

        let preserve_method = matches!(
            status,
            StatusCode::TEMPORARY_REDIRECT | StatusCode::PERMANENT_REDIRECT
        );
        if !preserve_method {
            if next.method != Method::HEAD {
                next.method = Method::GET;
            }
            next.body = None;
            next.headers.remove(CONTENT_TYPE);
            next.headers.remove(CONTENT_LENGTH);
        }
        next
    }

    /// Headers to send, with `stored_cookies` joined onto any configured
    /// `Cookie` header.
    pub fn headers_with_cookies(
        &self,
        stored_cookies: Option<String>,
    ) -> Result<HeaderMap, RequestError> {
        let mut headers = self.headers.clone();
        let configured = headers
            .get(COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let combined = match (configured, stored_cookies) {
            (_, None) => return Ok(headers),
            (Some(existing), Some(stored)) => format!("{}; {}", existing, stored),
            (None, Some(stored)) => stored,
        };

        let value = HeaderValue::from_str(&combined).map_err(|_| {
            RequestError::transport("Stored cookies form an invalid Cookie header")
                .with_cause(FailureCause::InvalidHeader)
        })?;
        headers.insert(COOKIE, value);
        Ok(headers)
    }
}

/// Where a redirect response points, resolved against the request URL.
///
/// `None` means the response is final: not a redirect status, or no usable
/// `Location` header.
pub fn redirect_location(url: &Url, status: StatusCode, headers: &HeaderMap) -> Option<Url> {
    if !matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    ) {
        return None;
    }

    let location = headers.get(LOCATION)?.to_str().ok()?;
    match url.join(location) {
        Ok(next) if matches!(next.scheme(), "http" | "https") => Some(next),
        _ => {
            log::debug!("Not following redirect to '{}' from {}", location, url);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpMethod, RequestFields};
    use crate::http::response::ErrorKind;

    fn config(fields: RequestFields) -> RequestConfig {
        RequestConfig::from_fields(fields)
    }

    #[test]
    fn form_encode_percent_encodes_pairs() {
        let data: BTreeMap<String, String> = [("b", "2"), ("a", "1"), ("q", "x y&z=é")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(form_encode(&data), "a=1&b=2&q=x+y%26z%3D%C3%A9");
        assert_eq!(form_encode(&BTreeMap::new()), "");
    }

    #[test]
    fn body_overrides_data() {
        let cfg = config(
            RequestFields::new()
                .data([("a", "1")])
                .body("{\"raw\":true}"),
        );
        assert_eq!(payload(&cfg), "{\"raw\":true}");

        let cfg = config(RequestFields::new().data([("a", "1"), ("b", "2")]));
        assert_eq!(payload(&cfg), "a=1&b=2");
    }

    #[test]
    fn prepare_keeps_method_regardless_of_payload() {
        let cfg = config(
            RequestFields::new()
                .url("http://example.com/search")
                .data([("q", "rust")]),
        );
        let request = PreparedRequest::from_config(&cfg).expect("prepared");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.body.as_deref(), Some("q=rust"));

        let cfg = config(
            RequestFields::new()
                .url("http://example.com/submit")
                .method(HttpMethod::Post),
        );
        let request = PreparedRequest::from_config(&cfg).expect("prepared");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body, None);
    }

    #[test]
    fn prepare_does_not_add_content_type() {
        let cfg = config(
            RequestFields::new()
                .url("http://example.com/")
                .method(HttpMethod::Post)
                .data([("a", "1")]),
        );
        let request = PreparedRequest::from_config(&cfg).expect("prepared");
        assert!(request.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn prepare_reports_bad_input_as_transport_errors() {
        let missing = PreparedRequest::from_config(&config(RequestFields::new()))
            .expect_err("missing url");
        assert_eq!(missing.kind, ErrorKind::Transport);
        assert_eq!(missing.cause, FailureCause::MissingUrl);
        assert_eq!(missing.status, None);

        let bad_url =
            PreparedRequest::from_config(&config(RequestFields::new().url("not a url")))
                .expect_err("bad url");
        assert!(bad_url.message.starts_with("Invalid URL"));
        assert_eq!(bad_url.cause, FailureCause::InvalidUrl);

        let ftp = PreparedRequest::from_config(&config(RequestFields::new().url("ftp://x.org/")))
            .expect_err("ftp");
        assert!(ftp.message.contains("unsupported scheme"));
        assert_eq!(ftp.cause, FailureCause::InvalidUrl);

        let bad_header = PreparedRequest::from_config(&config(
            RequestFields::new()
                .url("http://example.com/")
                .header("Bad Header", "x"),
        ))
        .expect_err("bad header");
        assert_eq!(bad_header.kind, ErrorKind::Transport);
        assert_eq!(bad_header.cause, FailureCause::InvalidHeader);

        let bad_value = PreparedRequest::from_config(&config(
            RequestFields::new()
                .url("http://example.com/")
                .header("X-Trace", "line\nbreak"),
        ))
        .expect_err("bad header value");
        assert_eq!(bad_value.cause, FailureCause::InvalidHeader);
    }

    #[test]
    fn redirect_rewrites_method_by_status() {
        let cfg = config(
            RequestFields::new()
                .url("http://example.com/login")
                .method(HttpMethod::Post)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .data([("user", "u")]),
        );
        let request = PreparedRequest::from_config(&cfg).expect("prepared");
        let target = Url::parse("http://example.com/home").unwrap();

        let found = request.redirect(StatusCode::FOUND, target.clone());
        assert_eq!(found.method, Method::GET);
        assert_eq!(found.body, None);
        assert!(found.headers.get(CONTENT_TYPE).is_none());
        assert_eq!(found.url, target);

        let temporary = request.redirect(StatusCode::TEMPORARY_REDIRECT, target);
        assert_eq!(temporary.method, Method::POST);
        assert_eq!(temporary.body.as_deref(), Some("user=u"));
        assert!(temporary.headers.get(CONTENT_TYPE).is_some());
    }

    #[test]
    fn redirect_location_resolves_relative_targets() {
        let url = Url::parse("http://example.com/a/b").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("../c?x=1"));

        let next = redirect_location(&url, StatusCode::SEE_OTHER, &headers).expect("location");
        assert_eq!(next.as_str(), "http://example.com/c?x=1");

        assert!(redirect_location(&url, StatusCode::OK, &headers).is_none());
        assert!(redirect_location(&url, StatusCode::FOUND, &HeaderMap::new()).is_none());
    }

    #[test]
    fn stored_cookies_join_configured_cookie_header() {
        let cfg = config(
            RequestFields::new()
                .url("http://example.com/")
                .header("Cookie", "manual=1"),
        );
        let request = PreparedRequest::from_config(&cfg).expect("prepared");

        let headers = request
            .headers_with_cookies(Some("sid=abc".to_string()))
            .expect("headers");
        assert_eq!(headers.get(COOKIE).unwrap(), "manual=1; sid=abc");

        let unchanged = request.headers_with_cookies(None).expect("headers");
        assert_eq!(unchanged.get(COOKIE).unwrap(), "manual=1");
    }
}
