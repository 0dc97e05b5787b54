// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # Swizzle - XHR Response Interception
//!
//! Wraps XHR-style request objects so a caller-supplied transform can rewrite
//! the response before any completion listener sees it.
//!
//! ## Features
//!
//! - Override `responseText`, `responseType`, `responseURL`, `status` and `statusText`
//! - Sync or async transforms; listeners wait until the transform settles
//! - Regex or predicate URL filter on the resolved response URL
//! - `onload` slots and `add_event_listener` share one ordered dispatch list
//! - Drop-in [`TransportFactory`](transport::TransportFactory) for request-creating code
//! - Debug tracing through a pluggable sink
//!
//! ## Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use swizzle::{Deferred, Engine, EngineConfig, HttpClient, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::new()
//!         .transform(|xhr: &dyn Transport| {
//!             let text = xhr.response_text().replace("cat", "dog");
//!             Deferred::ready(json!({ "responseText": text }))
//!         })
//!         .debug(true);
//!     let engine = Engine::with_http(config, HttpClient::new()?);
//!
//!     let xhr = engine.new_request();
//!     xhr.open("GET", "https://example.com/animals")?;
//!     xhr.send(None)?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod intercept;
pub mod transport;

// Re-exports for convenience

// Errors
pub use error::{Error, Result};

// Interception
pub use intercept::{
    AsyncTransform, Deferred, Engine, EngineConfig, InterceptedXhr, OverrideSet,
    RejectionPolicy, ResponseSnapshot, ResponseTransform, UrlFilter,
};
pub use intercept::{TraceRecord, TraceSink};

// Transports
pub use transport::{
    EventHandler, EventKind, HttpTransport, Listener, ProgressEvent, ReadyState, ResponseBody,
    ResponseType, StubTransport, Transport, TransportFactory,
};

// HTTP
pub use http::{HttpClient, HttpClientConfig};

/// Swizzle version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
