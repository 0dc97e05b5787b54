// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP request representation

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::error::{Error, Result};

/// HTTP request representation
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Bytes>,
    /// Request timeout (falls back to the client default when unset)
    pub timeout: Option<Duration>,
}

impl Request {
    /// Create a new request from XHR-style method and URL strings
    pub fn new(method: &str, url: impl AsRef<str>) -> Result<Self> {
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::other(format!("Invalid HTTP method: {}", method)))?;

        Ok(Self {
            method,
            url: Url::parse(url.as_ref())?,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        })
    }

    /// Set a header, ignoring names or values that are not valid HTTP
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_creation() {
        let req = Request::new("post", "https://example.com/path").unwrap();
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.url.as_str(), "https://example.com/path");
    }

    #[test]
    fn test_request_headers_append() {
        let req = Request::new("GET", "https://example.com")
            .unwrap()
            .header("x-custom", "a")
            .header("x-custom", "b")
            .header("bad header", "ignored");

        let values: Vec<_> = req
            .headers
            .get_all("x-custom")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["a", "b"]);
        assert_eq!(req.headers.len(), 2);
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(Request::new("GET", "not a url"), Err(Error::Url(_))));
        assert!(matches!(Request::new("G ET", "https://example.com"), Err(Error::Other(_))));
    }
}
