//! jarhttp - a stateful HTTP client
//!
//! A [`RequestClient`] keeps its request configuration and a cookie store
//! between calls, so a chain of requests (load a page, log in, fetch a
//! protected page) behaves like one browser session. Each
//! [`run`](RequestClient::run) returns a [`RunResult`]: a response record or an
//! error record, never a panic or an `Err`.

pub mod cli;
pub mod config;
pub mod error;
pub mod exit_code;
pub mod http;
pub mod logging;
pub mod output;
pub mod user_agent;
pub mod utils;

pub use config::{HttpMethod, RequestConfig, RequestFields};
pub use error::{Error, Result};
pub use http::cookie::{Cookie, CookieStore};
pub use http::response::{
    ErrorKind, ErrorResult, FailureCause, RequestError, ResponseResult, RunResult,
};
pub use http::RequestClient;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
