// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Debug trace sink
//!
//! When an engine is configured with `debug`, every signal, transform outcome
//! and listener failure is reported here as a [`TraceRecord`]. Sinks are best
//! effort: they cannot fail, and the engine never waits on them.

use std::fmt;
use std::sync::Arc;

/// One trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    /// Engine-assigned request id
    pub request_id: u64,
    /// `"<METHOD> <url>"` captured at open time
    pub correlation: Option<String>,
    pub message: String,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.correlation {
            Some(ref correlation) => write!(
                f,
                "[swizzle #{}] {}: {}",
                self.request_id, correlation, self.message
            ),
            None => write!(f, "[swizzle #{}] {}", self.request_id, self.message),
        }
    }
}

/// Receiver of trace records
pub trait TraceSink: Send + Sync {
    fn trace(&self, record: &TraceRecord);
}

/// Forwards trace records to `tracing` under the `swizzle::trace` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn trace(&self, record: &TraceRecord) {
        tracing::debug!(
            target: "swizzle::trace",
            request_id = record.request_id,
            correlation = record.correlation.as_deref().unwrap_or(""),
            "{}",
            record.message
        );
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TraceSink for NoopSink {
    fn trace(&self, _record: &TraceRecord) {}
}

impl<F> TraceSink for F
where
    F: Fn(&TraceRecord) + Send + Sync,
{
    fn trace(&self, record: &TraceRecord) {
        self(record)
    }
}

/// Gate in front of a sink: records are only built when tracing is on
#[derive(Clone)]
pub(crate) struct Tracer {
    enabled: bool,
    sink: Arc<dyn TraceSink>,
}

impl Tracer {
    pub(crate) fn new(enabled: bool, sink: Arc<dyn TraceSink>) -> Self {
        Self { enabled, sink }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn emit<F>(&self, request_id: u64, correlation: Option<String>, message: F)
    where
        F: FnOnce() -> String,
    {
        if !self.enabled {
            return;
        }
        self.sink.trace(&TraceRecord {
            request_id,
            correlation,
            message: message(),
        });
    }
}
