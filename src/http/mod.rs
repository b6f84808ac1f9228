//! HTTP client module
//!
//! [`RequestClient`] keeps a request configuration and a cookie store across
//! calls. Every `run` performs one request cycle, following redirects itself
//! so each hop reads and feeds the cookie store.

use crate::config::{RequestConfig, RequestFields};
use crate::error::{Error, Result};
use reqwest::blocking::{Client, ClientBuilder, Response};
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};
use url::Url;

pub mod cookie;
pub mod request;
pub mod response;

use cookie::CookieStore;
use request::{redirect_location, PreparedRequest};
use response::{
    decode_body, flatten_headers, ErrorResult, RequestError, ResponseResult, RunResult,
};

/// Redirect hops followed before a request cycle gives up.
pub const MAX_REDIRECTS: usize = 10;

/// Header name `set_user_agent` writes.
pub const USER_AGENT_HEADER: &str = "User-agent";

/// Stateful HTTP client
///
/// Not meant to be shared: `run`, `set_data` and `reset` take `&mut self`.
/// Separate instances own separate transports and cookie stores.
pub struct RequestClient {
    config: RequestConfig,
    cookies: CookieStore,
    transport: Client,
}

/// The last hop of a request cycle, body already read.
struct FinalResponse {
    url: Url,
    status: u16,
    headers: reqwest::header::HeaderMap,
    body: String,
}

impl RequestClient {
    /// Create a client from `fields` with an empty cookie store.
    ///
    /// Fails only if the transport cannot be initialized.
    pub fn new(fields: RequestFields) -> Result<Self> {
        Ok(Self {
            config: RequestConfig::from_fields(fields),
            cookies: CookieStore::new(),
            transport: build_transport()?,
        })
    }

    /// Merge `fields` into the stored configuration.
    pub fn set_data(&mut self, fields: RequestFields) {
        self.config.merge(fields);
    }

    /// Send `user_agent` as the `User-agent` header from now on, replacing a
    /// configured `User-Agent` in any spelling.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.config.set_header(USER_AGENT_HEADER, user_agent);
    }

    /// Replace the cookie store and the transport with fresh ones.
    ///
    /// The configuration is kept. On failure the client is left unchanged.
    pub fn reset(&mut self) -> Result<()> {
        self.transport = build_transport()?;
        self.cookies = CookieStore::new();
        log::debug!("Client reset: cookie store cleared");
        Ok(())
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn cookies(&self) -> &CookieStore {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut CookieStore {
        &mut self.cookies
    }

    /// Merge `fields`, then perform one request cycle.
    ///
    /// Never fails: transport problems and any final status outside 2xx come
    /// back as [`RunResult::Error`].
    pub fn run(&mut self, fields: RequestFields) -> RunResult {
        self.set_data(fields);

        let start = Instant::now();
        let outcome = PreparedRequest::from_config(&self.config)
            .and_then(|request| self.follow(request));
        let duration = start.elapsed().as_secs_f64();

        match outcome {
            Ok(response) if !(200..300).contains(&response.status) => {
                log::debug!("{} answered {}", response.url, response.status);
                let reason = reqwest::StatusCode::from_u16(response.status)
                    .ok()
                    .and_then(|status| status.canonical_reason())
                    .unwrap_or("Unknown Status");
                RunResult::Error(ErrorResult::new(
                    RequestError::http_status(
                        response.status,
                        format!("HTTP Error {}: {}", response.status, reason),
                    ),
                    duration,
                ))
            }
            Ok(response) => RunResult::Response(ResponseResult {
                url: response.url.to_string(),
                code: response.status,
                headers: flatten_headers(&response.headers),
                body: response.body,
                cookies: self.cookies.cookies(),
                duration,
            }),
            Err(err) => {
                log::debug!("Request failed: {}", err);
                RunResult::Error(ErrorResult::new(err, duration))
            }
        }
    }

    fn follow(
        &mut self,
        mut request: PreparedRequest,
    ) -> std::result::Result<FinalResponse, RequestError> {
        let mut redirects = 0;

        loop {
            let response = self.send(&request)?;
            let status = response.status();
            log::debug!("{} {} -> {}", request.method, request.url, status);

            let stored = self
                .cookies
                .store_response_cookies(&request.url, response.headers());
            if stored > 0 {
                log::debug!("Stored {} cookie(s) from {}", stored, request.url);
            }

            let location = match redirect_location(&request.url, status, response.headers()) {
                Some(location) => location,
                None => return read_final(response),
            };

            if redirects >= MAX_REDIRECTS {
                return Err(RequestError::redirect_limit(
                    status.as_u16(),
                    format!(
                        "HTTP Error {}: more than {} redirects, last target {}",
                        status.as_u16(),
                        MAX_REDIRECTS,
                        location
                    ),
                ));
            }
            redirects += 1;
            log::debug!("Following redirect {} to {}", redirects, location);
            request = request.redirect(status, location);
        }
    }

    fn send(
        &mut self,
        request: &PreparedRequest,
    ) -> std::result::Result<Response, RequestError> {
        let stored_cookies = self.cookies.header_for(&request.url);
        let headers = request.headers_with_cookies(stored_cookies)?;

        let mut builder = self
            .transport
            .request(request.method.clone(), request.url.clone())
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        builder.send().map_err(RequestError::from)
    }
}

fn read_final(response: Response) -> std::result::Result<FinalResponse, RequestError> {
    let url = response.url().clone();
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().map_err(RequestError::from)?;

    Ok(FinalResponse {
        url,
        status,
        headers,
        body: decode_body(&bytes, content_type.as_deref()),
    })
}

/// Transport owned by one client: no automatic redirects, no cookie handling
/// of its own, no timeout.
fn build_transport() -> Result<Client> {
    ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(None::<Duration>)
        .build()
        .map_err(Error::Transport)
}
