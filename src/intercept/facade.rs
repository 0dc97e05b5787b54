// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request facade
//!
//! [`InterceptedXhr`] implements [`Transport`] by delegating to the wrapped
//! transport, with three exceptions:
//!
//! - reads of overridable response fields consult the override store first;
//! - assigning the `onload` / `onreadystatechange` slots and registering
//!   listeners for those events go to the engine's listener registry instead
//!   of the transport, whose slots keep holding the engine's trampolines;
//! - `open` starts a new completion cycle before delegating.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use super::dispatcher::RequestInstance;
use super::overrides::OverrideSet;
use crate::error::Result;
use crate::transport::{EventKind, Listener, ReadyState, ResponseBody, ResponseType, Transport};

/// Transport handed to callers in place of the real one
///
/// Cheap to clone; clones refer to the same request.
#[derive(Clone)]
pub struct InterceptedXhr {
    instance: Arc<RequestInstance>,
}

impl InterceptedXhr {
    pub(crate) fn from_instance(instance: Arc<RequestInstance>) -> Self {
        Self { instance }
    }

    /// Engine-assigned request id, as used in trace records
    pub fn id(&self) -> u64 {
        self.instance.id
    }

    /// The wrapped transport
    pub fn underlying(&self) -> &Arc<dyn Transport> {
        &self.instance.underlying
    }

    /// Overrides in effect for the current completion cycle
    pub fn overrides(&self) -> OverrideSet {
        self.instance.overrides.read().clone()
    }

    /// Number of listeners registered for a completion signal
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.instance.listeners.lock().len(kind)
    }
}

impl Transport for InterceptedXhr {
    fn open(&self, method: &str, url: &str) -> Result<()> {
        self.instance.begin_cycle(method, url);
        self.instance.underlying.open(method, url)
    }

    fn set_request_header(&self, name: &str, value: &str) -> Result<()> {
        self.instance.underlying.set_request_header(name, value)
    }

    fn send(&self, body: Option<Bytes>) -> Result<()> {
        self.instance.trace(|| "send".to_string());
        self.instance.underlying.send(body)
    }

    fn abort(&self) {
        self.instance.underlying.abort()
    }

    fn ready_state(&self) -> ReadyState {
        self.instance.underlying.ready_state()
    }

    fn status(&self) -> u16 {
        let overridden = self.instance.overrides.read().get_status();
        overridden.unwrap_or_else(|| self.instance.underlying.status())
    }

    fn status_text(&self) -> String {
        let overridden = self
            .instance
            .overrides
            .read()
            .get_status_text()
            .map(str::to_string);
        overridden.unwrap_or_else(|| self.instance.underlying.status_text())
    }

    fn response_url(&self) -> String {
        let overridden = self
            .instance
            .overrides
            .read()
            .get_response_url()
            .map(str::to_string);
        overridden.unwrap_or_else(|| self.instance.underlying.response_url())
    }

    fn response_type(&self) -> ResponseType {
        let overridden = self.instance.overrides.read().get_response_type();
        overridden.unwrap_or_else(|| self.instance.underlying.response_type())
    }

    fn set_response_type(&self, response_type: ResponseType) -> Result<()> {
        self.instance.underlying.set_response_type(response_type)
    }

    fn response_text(&self) -> String {
        let overridden = self
            .instance
            .overrides
            .read()
            .get_response_text()
            .map(str::to_string);
        overridden.unwrap_or_else(|| self.instance.underlying.response_text())
    }

    fn response(&self) -> ResponseBody {
        let (text, response_type) = {
            let overrides = self.instance.overrides.read();
            (
                overrides.get_response_text().map(str::to_string),
                overrides.get_response_type(),
            )
        };
        match (text, response_type) {
            (None, None) => self.instance.underlying.response(),
            (Some(text), ty) => ty
                .unwrap_or_else(|| self.instance.underlying.response_type())
                .decode(&text),
            (None, Some(ty)) => ty.decode(&self.instance.underlying.response_text()),
        }
    }

    fn response_header(&self, name: &str) -> Option<String> {
        self.instance.underlying.response_header(name)
    }

    fn all_response_headers(&self) -> String {
        self.instance.underlying.all_response_headers()
    }

    /// Completion slots read back as the engine's trampoline, so invoking
    /// one runs the transform before the caller's listeners.
    fn handler(&self, kind: EventKind) -> Option<Listener> {
        self.instance.underlying.handler(kind)
    }

    fn set_handler(&self, kind: EventKind, handler: Option<Listener>) {
        if kind.is_completion_signal() {
            self.instance.listeners.lock().set_slot(kind, handler);
        } else {
            self.instance.underlying.set_handler(kind, handler)
        }
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) {
        if kind.is_completion_signal() {
            self.instance.listeners.lock().add(kind, listener);
        } else {
            self.instance.underlying.add_event_listener(kind, listener)
        }
    }

    fn remove_event_listener(&self, kind: EventKind, listener: &Listener) {
        if kind.is_completion_signal() {
            self.instance.listeners.lock().remove(kind, listener);
        } else {
            self.instance.underlying.remove_event_listener(kind, listener)
        }
    }
}

impl fmt::Debug for InterceptedXhr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptedXhr")
            .field("id", &self.instance.id)
            .field("ready_state", &self.instance.underlying.ready_state())
            .field("overrides", &*self.instance.overrides.read())
            .finish()
    }
}
