// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! XHR-style request transports
//!
//! [`Transport`] is the observable surface of a single request object: open,
//! send, read response fields, and register event listeners either through a
//! single `onX` slot or through `add_event_listener`. The interception engine
//! wraps any implementation of it, and its facade implements it too, so a
//! caller cannot tell a wrapped transport from a bare one.

mod http;
mod stub;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use self::http::HttpTransport;
pub use self::stub::StubTransport;

/// Result returned by event listeners
///
/// Errors are reported by whoever dispatches the event; they never reach the
/// code that drives the transport.
pub type ListenerResult = anyhow::Result<()>;

/// Request lifecycle state, numbered like `XMLHttpRequest.readyState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReadyState {
    /// Created, `open` not called yet
    Unsent = 0,
    /// `open` called
    Opened = 1,
    /// Status line and headers received
    HeadersReceived = 2,
    /// Body downloading
    Loading = 3,
    /// Request finalized (success, failure or abort)
    Done = 4,
}

impl ReadyState {
    /// Numeric value as exposed by `readyState`
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Whether this is the terminal state
    pub fn is_done(self) -> bool {
        self == ReadyState::Done
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReadyState::Unsent => "UNSENT",
            ReadyState::Opened => "OPENED",
            ReadyState::HeadersReceived => "HEADERS_RECEIVED",
            ReadyState::Loading => "LOADING",
            ReadyState::Done => "DONE",
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events a transport can fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ReadyStateChange,
    LoadStart,
    Progress,
    Abort,
    Error,
    Load,
    Timeout,
    LoadEnd,
}

impl EventKind {
    /// Event type name (`"load"`, `"readystatechange"`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ReadyStateChange => "readystatechange",
            EventKind::LoadStart => "loadstart",
            EventKind::Progress => "progress",
            EventKind::Abort => "abort",
            EventKind::Error => "error",
            EventKind::Load => "load",
            EventKind::Timeout => "timeout",
            EventKind::LoadEnd => "loadend",
        }
    }

    /// Name of the matching handler slot (`"onload"`, ...)
    pub fn handler_name(self) -> &'static str {
        match self {
            EventKind::ReadyStateChange => "onreadystatechange",
            EventKind::LoadStart => "onloadstart",
            EventKind::Progress => "onprogress",
            EventKind::Abort => "onabort",
            EventKind::Error => "onerror",
            EventKind::Load => "onload",
            EventKind::Timeout => "ontimeout",
            EventKind::LoadEnd => "onloadend",
        }
    }

    /// Whether this event can signal that the request finished
    pub fn is_completion_signal(self) -> bool {
        matches!(self, EventKind::Load | EventKind::ReadyStateChange)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event payload handed to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Event type
    pub kind: EventKind,
    /// Ready state at the time the event fired
    pub ready_state: ReadyState,
    /// Bytes received so far
    pub loaded: u64,
    /// Expected total, when known
    pub total: Option<u64>,
}

impl ProgressEvent {
    pub fn new(kind: EventKind, ready_state: ReadyState) -> Self {
        Self {
            kind,
            ready_state,
            loaded: 0,
            total: None,
        }
    }

    pub fn with_progress(mut self, loaded: u64, total: Option<u64>) -> Self {
        self.loaded = loaded;
        self.total = total;
        self
    }
}

/// Value of `responseType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResponseType {
    /// `""`, treated as text
    #[default]
    Default,
    Text,
    Json,
    ArrayBuffer,
    Blob,
    Document,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Default => "",
            ResponseType::Text => "text",
            ResponseType::Json => "json",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Blob => "blob",
            ResponseType::Document => "document",
        }
    }

    /// Parse an XHR `responseType` string
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "" => Some(ResponseType::Default),
            "text" => Some(ResponseType::Text),
            "json" => Some(ResponseType::Json),
            "arraybuffer" => Some(ResponseType::ArrayBuffer),
            "blob" => Some(ResponseType::Blob),
            "document" => Some(ResponseType::Document),
            _ => None,
        }
    }

    /// Whether `responseText` is readable under this type
    pub fn is_textual(self) -> bool {
        matches!(self, ResponseType::Default | ResponseType::Text)
    }

    /// Interpret a textual body according to this type
    pub fn decode(self, text: &str) -> ResponseBody {
        match self {
            ResponseType::Default | ResponseType::Text | ResponseType::Document => {
                ResponseBody::Text(text.to_string())
            }
            ResponseType::Json => serde_json::from_str(text)
                .map(ResponseBody::Json)
                .unwrap_or(ResponseBody::Null),
            ResponseType::ArrayBuffer | ResponseType::Blob => {
                ResponseBody::Bytes(Bytes::copy_from_slice(text.as_bytes()))
            }
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of `response`, shaped by `responseType`
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(serde_json::Value),
    Bytes(Bytes),
    /// Nothing received yet, or the body did not parse as the requested type
    Null,
}

impl ResponseBody {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Capability-style listener object
pub trait EventHandler: Send + Sync {
    fn handle_event(&self, target: &dyn Transport, event: &ProgressEvent) -> ListenerResult;
}

type Callback = dyn Fn(&dyn Transport, &ProgressEvent) -> ListenerResult + Send + Sync;

/// A registered listener: a plain callback or a handler object
///
/// Both shapes are invoked the same way through [`Listener::invoke`]. Cloning
/// shares the underlying handle, and two listeners are the same listener when
/// they share it.
#[derive(Clone)]
pub enum Listener {
    Callback(Arc<Callback>),
    Handler(Arc<dyn EventHandler>),
}

impl Listener {
    /// Wrap a closure
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&dyn Transport, &ProgressEvent) -> ListenerResult + Send + Sync + 'static,
    {
        Listener::Callback(Arc::new(f))
    }

    /// Wrap a handler object
    pub fn handler<H: EventHandler + 'static>(handler: H) -> Self {
        Listener::Handler(Arc::new(handler))
    }

    /// Invoke the listener with its target
    pub fn invoke(&self, target: &dyn Transport, event: &ProgressEvent) -> ListenerResult {
        match self {
            Listener::Callback(f) => f(target, event),
            Listener::Handler(h) => h.handle_event(target, event),
        }
    }

    /// Identity comparison
    pub fn same_as(&self, other: &Listener) -> bool {
        self.identity() == other.identity()
    }

    fn identity(&self) -> *const () {
        match self {
            Listener::Callback(f) => Arc::as_ptr(f) as *const (),
            Listener::Handler(h) => Arc::as_ptr(h) as *const (),
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Listener::Callback(_) => "Callback",
            Listener::Handler(_) => "Handler",
        };
        f.debug_tuple("Listener")
            .field(&shape)
            .field(&self.identity())
            .finish()
    }
}

/// Observable surface of one XHR-style request
///
/// All methods take `&self`; implementations use interior mutability so a
/// transport can be shared with the task that drives it. Implementations must
/// not hold internal locks while invoking listeners, and pass themselves as
/// the listener target.
pub trait Transport: Send + Sync {
    /// Initialize a request. Fires `readystatechange` with `Opened`.
    fn open(&self, method: &str, url: &str) -> Result<()>;

    fn set_request_header(&self, name: &str, value: &str) -> Result<()>;

    /// Start the request
    fn send(&self, body: Option<Bytes>) -> Result<()>;

    fn abort(&self);

    fn ready_state(&self) -> ReadyState;

    fn status(&self) -> u16;

    fn status_text(&self) -> String;

    /// Final URL after redirects, empty until a response arrives
    fn response_url(&self) -> String;

    fn response_type(&self) -> ResponseType;

    fn set_response_type(&self, response_type: ResponseType) -> Result<()>;

    /// Body as text, empty until a response arrives
    fn response_text(&self) -> String;

    /// Body shaped by `response_type`
    fn response(&self) -> ResponseBody;

    fn response_header(&self, name: &str) -> Option<String>;

    fn all_response_headers(&self) -> String;

    /// Current `onX` slot value
    fn handler(&self, kind: EventKind) -> Option<Listener>;

    /// Assign (or clear) the `onX` slot
    fn set_handler(&self, kind: EventKind, handler: Option<Listener>);

    fn add_event_listener(&self, kind: EventKind, listener: Listener);

    fn remove_event_listener(&self, kind: EventKind, listener: &Listener);
}

/// Anything that can create fresh transports
///
/// Call sites that create requests depend on this rather than on a concrete
/// transport type, so an [`Engine`](crate::intercept::Engine) can be injected
/// in place of a plain factory.
pub trait TransportFactory: Send + Sync {
    fn create_transport(&self) -> Arc<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn() -> Arc<dyn Transport> + Send + Sync,
{
    fn create_transport(&self) -> Arc<dyn Transport> {
        self()
    }
}

/// `onX` slots and `add_event_listener` lists of a bundled transport
#[derive(Default)]
pub(crate) struct EventSlots {
    handlers: HashMap<EventKind, Listener>,
    listeners: HashMap<EventKind, Vec<Listener>>,
}

impl EventSlots {
    pub(crate) fn handler(&self, kind: EventKind) -> Option<Listener> {
        self.handlers.get(&kind).cloned()
    }

    pub(crate) fn set_handler(&mut self, kind: EventKind, handler: Option<Listener>) {
        match handler {
            Some(h) => {
                self.handlers.insert(kind, h);
            }
            None => {
                self.handlers.remove(&kind);
            }
        }
    }

    pub(crate) fn add(&mut self, kind: EventKind, listener: Listener) {
        let list = self.listeners.entry(kind).or_default();
        if !list.iter().any(|l| l.same_as(&listener)) {
            list.push(listener);
        }
    }

    pub(crate) fn remove(&mut self, kind: EventKind, listener: &Listener) {
        if let Some(list) = self.listeners.get_mut(&kind) {
            list.retain(|l| !l.same_as(listener));
        }
    }

    /// Slot and listener list for `kind`, cloned so they can be invoked unlocked
    pub(crate) fn snapshot(&self, kind: EventKind) -> (Option<Listener>, Vec<Listener>) {
        (
            self.handler(kind),
            self.listeners.get(&kind).cloned().unwrap_or_default(),
        )
    }
}

/// Invoke the `onX` slot and then registered listeners, in that order
///
/// Shared by the bundled transports. Listener errors are logged and do not
/// stop the remaining listeners, mirroring how a browser reports an uncaught
/// exception from one handler.
pub(crate) fn fire_listeners(
    target: &dyn Transport,
    slot: Option<Listener>,
    listeners: Vec<Listener>,
    event: &ProgressEvent,
) {
    for listener in slot.into_iter().chain(listeners) {
        if let Err(e) = listener.invoke(target, event) {
            tracing::warn!(event = %event.kind, error = %e, "Event listener failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl EventHandler for Noop {
        fn handle_event(&self, _target: &dyn Transport, _event: &ProgressEvent) -> ListenerResult {
            Ok(())
        }
    }

    #[test]
    fn test_ready_state_values() {
        assert_eq!(ReadyState::Unsent.as_u16(), 0);
        assert_eq!(ReadyState::Done.as_u16(), 4);
        assert!(ReadyState::Done.is_done());
        assert!(ReadyState::Loading < ReadyState::Done);
    }

    #[test]
    fn test_completion_signals() {
        assert!(EventKind::Load.is_completion_signal());
        assert!(EventKind::ReadyStateChange.is_completion_signal());
        assert!(!EventKind::LoadEnd.is_completion_signal());
        assert_eq!(EventKind::ReadyStateChange.handler_name(), "onreadystatechange");
    }

    #[test]
    fn test_response_type_decode() {
        assert_eq!(ResponseType::parse("json"), Some(ResponseType::Json));
        assert_eq!(ResponseType::parse("xml"), None);
        assert_eq!(
            ResponseType::Json.decode(r#"{"a":1}"#),
            ResponseBody::Json(serde_json::json!({"a": 1}))
        );
        assert_eq!(ResponseType::Json.decode("nope"), ResponseBody::Null);
        assert_eq!(
            ResponseType::Default.decode("hi").as_text(),
            Some("hi")
        );
    }

    #[test]
    fn test_listener_identity() {
        let a = Listener::callback(|_: &dyn Transport, _: &ProgressEvent| Ok(()));
        let b = Listener::callback(|_: &dyn Transport, _: &ProgressEvent| Ok(()));
        let h = Listener::handler(Noop);

        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
        assert!(h.same_as(&h.clone()));
        assert!(!h.same_as(&a));
    }
}
