// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Interception engine
//!
//! An [`Engine`] is built once from an [`EngineConfig`] and a factory for
//! underlying transports. Each call to [`Engine::new_request`] wraps a fresh
//! transport in an [`InterceptedXhr`]. The engine is itself a
//! [`TransportFactory`], so it can be injected wherever request-creating code
//! expects one.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use swizzle::http::HttpClient;
//! use swizzle::intercept::{Deferred, Engine, EngineConfig};
//! use swizzle::transport::{EventKind, Listener, ProgressEvent, Transport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::new()
//!         .transform(|_: &dyn Transport| Deferred::ready(json!({ "responseText": "{}" })))
//!         .filter_pattern(r"api\.example\.com")?;
//!     let engine = Engine::with_http(config, HttpClient::new()?);
//!
//!     let xhr = engine.new_request();
//!     xhr.set_handler(
//!         EventKind::Load,
//!         Some(Listener::callback(|xhr: &dyn Transport, _: &ProgressEvent| {
//!             println!("{}", xhr.response_text());
//!             Ok(())
//!         })),
//!     );
//!     xhr.open("GET", "https://api.example.com/items")?;
//!     xhr.send(None)?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::config::EngineConfig;
use super::dispatcher::RequestInstance;
use super::facade::InterceptedXhr;
use super::trace::Tracer;
use crate::http::HttpClient;
use crate::transport::{HttpTransport, Transport, TransportFactory};

/// Factory of intercepted requests
pub struct Engine {
    config: Arc<EngineConfig>,
    tracer: Tracer,
    transports: Arc<dyn TransportFactory>,
    next_id: AtomicU64,
}

impl Engine {
    /// Create an engine that wraps transports produced by `transports`
    pub fn new<F: TransportFactory + 'static>(config: EngineConfig, transports: F) -> Self {
        let tracer = Tracer::new(config.debug, config.trace_sink.clone());
        Self {
            config: Arc::new(config),
            tracer,
            transports: Arc::new(transports),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create an engine over [`HttpTransport`]s sharing `client`
    pub fn with_http(config: EngineConfig, client: HttpClient) -> Self {
        Self::new(config, move || -> Arc<dyn Transport> {
            Arc::new(HttpTransport::new(client.clone()))
        })
    }

    /// Create a new intercepted request over a fresh transport
    pub fn new_request(&self) -> InterceptedXhr {
        self.wrap(self.transports.create_transport())
    }

    /// Intercept an existing transport
    ///
    /// The engine takes over the transport's `onload` and
    /// `onreadystatechange` slots; drive the request through the returned
    /// facade.
    pub fn wrap(&self, underlying: Arc<dyn Transport>) -> InterceptedXhr {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(request_id = id, "Intercepted request created");

        let instance =
            RequestInstance::install(id, underlying, self.config.clone(), self.tracer.clone());
        InterceptedXhr::from_instance(instance)
    }

    /// Get engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl TransportFactory for Engine {
    fn create_transport(&self) -> Arc<dyn Transport> {
        Arc::new(self.new_request())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
