//! Utility functions and helpers

use crate::error::{Error, Result};
use std::path::PathBuf;
use url::Url;


/// URL validation and parsing utilities
pub struct UrlUtils;

impl UrlUtils {
    /// Validate and normalize URL
    pub fn validate_url(input: &str) -> Result<Url> {
        // Add http:// if no scheme is provided
        let url_str = if input.contains("://") {
            input.to_string()
        } else {
            format!("http://{}", input)
        };

        let url = Url::parse(&url_str)
            .map_err(|e| Error::InvalidUrl(format!("Invalid URL '{}': {}", input, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl(format!(
                "Unsupported scheme in '{}': {}",
                input,
                url.scheme()
            )));
        }
        Ok(url)
    }
}

/// File system utilities
pub struct FileUtils;

impl FileUtils {
    /// Expand tilde (~) in file paths
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        let rest = match path.strip_prefix('~') {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
            _ => return Ok(PathBuf::from(path)),
        };

        dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or_else(|| Error::Config("Cannot determine home directory".to_string()))
    }
}

/// String utilities
pub struct StringUtils;

impl StringUtils {
    /// Parse `Name: value` header syntax
    pub fn parse_header(input: &str) -> Result<(String, String)> {
        match input.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(Error::Config(format!(
                "Invalid header format: '{}'. Expected 'key: value'",
                input
            ))),
        }
    }

    /// Parse `key=value` form data syntax; the value may be empty
    pub fn parse_pair(input: &str) -> Result<(String, String)> {
        match input.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(Error::Config(format!(
                "Invalid data format: '{}'. Expected 'key=value'",
                input
            ))),
        }
    }
}
