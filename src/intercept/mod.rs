// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Response interception
//!
//! Wraps XHR-style transports so a configured transform can rewrite the
//! response (text, type, URL, status) before any `onload` or
//! `onreadystatechange` listener observes it.
//!
//! The pieces:
//! - [`Engine`] creates intercepted requests and is a drop-in
//!   [`TransportFactory`](crate::transport::TransportFactory)
//! - [`InterceptedXhr`] is the facade callers hold; reads consult the
//!   override store first
//! - the dispatcher gates completion signals, runs the transform once per
//!   cycle and replays the caller's listeners afterwards
//! - [`OverrideSet`] holds the validated, whitelisted overrides
//! - [`TraceSink`] receives debug trace records

mod config;
mod dispatcher;
mod engine;
mod facade;
mod overrides;
mod registry;
mod trace;
mod transform;

pub use config::{EngineConfig, RejectionPolicy, UrlFilter};
pub use engine::Engine;
pub use facade::InterceptedXhr;
pub use overrides::{OverrideSet, ResponseField, Validated};
pub use trace::{NoopSink, TraceRecord, TraceSink, TracingSink};
pub use transform::{AsyncAdapter, AsyncTransform, Deferred, ResponseSnapshot, ResponseTransform};
