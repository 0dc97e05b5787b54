// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client layer backing [`HttpTransport`](crate::transport::HttpTransport)
//!
//! A thin async client over reqwest. Requests and responses are plain values;
//! XHR-style state lives in the transport, not here.

mod client;
mod request;
mod response;

pub use client::{HttpClient, HttpClientConfig};
pub use request::Request;
pub use response::Response;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("swizzle/", env!("CARGO_PKG_VERSION"));
