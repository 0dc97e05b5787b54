// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Engine configuration

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::trace::{TraceSink, TracingSink};
use super::transform::{AsyncAdapter, AsyncTransform, ResponseTransform};
use crate::error::{Error, Result};

/// Decides, from the resolved response URL, whether the transform applies
#[derive(Clone)]
pub enum UrlFilter {
    /// Regex searched anywhere in the URL
    Pattern(Regex),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl UrlFilter {
    /// Compile a regex filter
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(UrlFilter::Pattern)
            .map_err(|e| Error::Config(format!("Invalid URL filter '{}': {}", pattern, e)))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        UrlFilter::Predicate(Arc::new(f))
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlFilter::Pattern(re) => re.is_match(url),
            UrlFilter::Predicate(f) => f(url),
        }
    }
}

impl From<Regex> for UrlFilter {
    fn from(re: Regex) -> Self {
        UrlFilter::Pattern(re)
    }
}

impl fmt::Debug for UrlFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlFilter::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            UrlFilter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// What happens to a completion cycle whose transform rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectionPolicy {
    /// Dispatch listeners against the untransformed response
    #[default]
    DispatchOriginal,
    /// Never dispatch; the caller sees a request that does not complete
    Stall,
}

/// Engine configuration, shared read-only by every request it creates
#[derive(Clone)]
pub struct EngineConfig {
    /// Transform applied on completion; `None` disables interception
    pub transform: Option<Arc<dyn ResponseTransform>>,
    /// URL filter; `None` means the transform always applies
    pub filter: Option<UrlFilter>,
    /// Report trace records to `trace_sink`
    pub debug: bool,
    pub trace_sink: Arc<dyn TraceSink>,
    pub rejection: RejectionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transform: None,
            filter: None,
            debug: false,
            trace_sink: Arc::new(TracingSink),
            rejection: RejectionPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new engine config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response transform
    pub fn transform<T: ResponseTransform + 'static>(mut self, transform: T) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Set an async response transform
    pub fn async_transform<T: AsyncTransform>(mut self, transform: T) -> Self {
        self.transform = Some(Arc::new(AsyncAdapter::new(transform)));
        self
    }

    /// Set the URL filter
    pub fn filter(mut self, filter: UrlFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set a regex URL filter
    pub fn filter_pattern(self, pattern: &str) -> Result<Self> {
        Ok(self.filter(UrlFilter::pattern(pattern)?))
    }

    /// Enable/disable debug tracing
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the trace sink
    pub fn trace_sink<S: TraceSink + 'static>(mut self, sink: S) -> Self {
        self.trace_sink = Arc::new(sink);
        self
    }

    /// Set the rejection policy
    pub fn on_rejection(mut self, policy: RejectionPolicy) -> Self {
        self.rejection = policy;
        self
    }

    /// Whether the transform applies to a response resolved at `url`
    pub fn applies_to(&self, url: &str) -> bool {
        self.transform.is_some()
            && self
                .filter
                .as_ref()
                .map(|filter| filter.matches(url))
                .unwrap_or(true)
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("transform", &self.transform.is_some())
            .field("filter", &self.filter)
            .field("debug", &self.debug)
            .field("rejection", &self.rejection)
            .finish()
    }
}
