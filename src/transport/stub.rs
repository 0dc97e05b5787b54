// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Hand-driven transport
//!
//! Never touches the network. Tests (and embedders that already have the
//! response in hand) drive it with [`StubTransport::respond`] or by setting
//! fields and calling [`StubTransport::fire`] directly.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;

use super::{
    fire_listeners, EventKind, EventSlots, Listener, ProgressEvent, ReadyState, ResponseBody,
    ResponseType, Transport,
};
use crate::error::{Error, Result};

#[derive(Default)]
struct StubState {
    method: Option<String>,
    url: Option<String>,
    ready_state: Option<ReadyState>,
    sent: bool,
    request_headers: Vec<(String, String)>,
    request_body: Option<Bytes>,
    status: u16,
    status_text: String,
    response_url: String,
    response_type: ResponseType,
    response_text: String,
    response_headers: Vec<(String, String)>,
    events: EventSlots,
}

/// Transport whose response is supplied by the caller
///
/// Clones share state, so a test can keep one handle to drive the request
/// while an engine wraps another.
#[derive(Clone, Default)]
pub struct StubTransport {
    state: Arc<RwLock<StubState>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh stub behind a trait object; usable as a [`TransportFactory`](super::TransportFactory)
    pub fn new_shared() -> Arc<dyn Transport> {
        Arc::new(Self::new())
    }

    /// Method passed to the last `open`
    pub fn method(&self) -> Option<String> {
        self.state.read().method.clone()
    }

    /// URL passed to the last `open`
    pub fn url(&self) -> Option<String> {
        self.state.read().url.clone()
    }

    pub fn is_sent(&self) -> bool {
        self.state.read().sent
    }

    pub fn request_headers(&self) -> Vec<(String, String)> {
        self.state.read().request_headers.clone()
    }

    pub fn request_body(&self) -> Option<Bytes> {
        self.state.read().request_body.clone()
    }

    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.state.write().ready_state = Some(ready_state);
    }

    pub fn set_status(&self, status: u16, status_text: impl Into<String>) {
        let mut state = self.state.write();
        state.status = status;
        state.status_text = status_text.into();
    }

    pub fn set_response_text(&self, text: impl Into<String>) {
        self.state.write().response_text = text.into();
    }

    pub fn set_response_url(&self, url: impl Into<String>) {
        self.state.write().response_url = url.into();
    }

    pub fn add_response_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.state
            .write()
            .response_headers
            .push((name.into().to_ascii_lowercase(), value.into()));
    }

    /// Fire `kind` at the slot handler and registered listeners
    pub fn fire(&self, kind: EventKind) {
        let (slot, listeners, event) = {
            let state = self.state.read();
            let ready_state = state.ready_state.unwrap_or(ReadyState::Unsent);
            let loaded = state.response_text.len() as u64;
            let (slot, listeners) = state.events.snapshot(kind);
            (
                slot,
                listeners,
                ProgressEvent::new(kind, ready_state).with_progress(loaded, Some(loaded)),
            )
        };
        fire_listeners(self, slot, listeners, &event);
    }

    /// Complete the request the way a network transport would
    ///
    /// Walks the ready state through `HeadersReceived`, `Loading` and `Done`,
    /// firing `readystatechange` at each step, then fires `load` and
    /// `loadend`. The response URL defaults to the opened URL.
    pub fn respond(&self, status: u16, body: impl Into<String>) {
        {
            let mut state = self.state.write();
            state.status = status;
            if state.status_text.is_empty() {
                state.status_text = reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("")
                    .to_string();
            }
            if state.response_url.is_empty() {
                state.response_url = state.url.clone().unwrap_or_default();
            }
        }
        self.transition(ReadyState::HeadersReceived);

        self.state.write().response_text = body.into();
        self.transition(ReadyState::Loading);
        self.transition(ReadyState::Done);

        self.fire(EventKind::Load);
        self.fire(EventKind::LoadEnd);
    }

    /// Fail the request with a network error
    pub fn fail(&self) {
        {
            let mut state = self.state.write();
            state.status = 0;
            state.status_text.clear();
        }
        self.transition(ReadyState::Done);
        self.fire(EventKind::Error);
        self.fire(EventKind::LoadEnd);
    }

    fn transition(&self, ready_state: ReadyState) {
        self.set_ready_state(ready_state);
        self.fire(EventKind::ReadyStateChange);
    }
}

impl Transport for StubTransport {
    fn open(&self, method: &str, url: &str) -> Result<()> {
        {
            let mut state = self.state.write();
            state.method = Some(method.to_ascii_uppercase());
            state.url = Some(url.to_string());
            state.sent = false;
            state.request_headers.clear();
            state.request_body = None;
            state.status = 0;
            state.status_text.clear();
            state.response_url.clear();
            state.response_text.clear();
            state.response_headers.clear();
        }
        self.transition(ReadyState::Opened);
        Ok(())
    }

    fn set_request_header(&self, name: &str, value: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.ready_state != Some(ReadyState::Opened) || state.sent {
            return Err(Error::invalid_state(
                "setRequestHeader",
                state.ready_state.unwrap_or(ReadyState::Unsent).as_str(),
            ));
        }
        state
            .request_headers
            .push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn send(&self, body: Option<Bytes>) -> Result<()> {
        {
            let mut state = self.state.write();
            if state.ready_state != Some(ReadyState::Opened) || state.sent {
                return Err(Error::invalid_state(
                    "send",
                    state.ready_state.unwrap_or(ReadyState::Unsent).as_str(),
                ));
            }
            state.sent = true;
            state.request_body = body;
        }
        self.fire(EventKind::LoadStart);
        Ok(())
    }

    fn abort(&self) {
        let in_flight = {
            let state = self.state.read();
            state.sent && state.ready_state != Some(ReadyState::Done)
        };
        if in_flight {
            self.state.write().status = 0;
            self.transition(ReadyState::Done);
            self.fire(EventKind::Abort);
            self.fire(EventKind::LoadEnd);
        }
        let mut state = self.state.write();
        state.sent = false;
        state.ready_state = Some(ReadyState::Unsent);
    }

    fn ready_state(&self) -> ReadyState {
        self.state.read().ready_state.unwrap_or(ReadyState::Unsent)
    }

    fn status(&self) -> u16 {
        self.state.read().status
    }

    fn status_text(&self) -> String {
        self.state.read().status_text.clone()
    }

    fn response_url(&self) -> String {
        self.state.read().response_url.clone()
    }

    fn response_type(&self) -> ResponseType {
        self.state.read().response_type
    }

    fn set_response_type(&self, response_type: ResponseType) -> Result<()> {
        let mut state = self.state.write();
        if matches!(
            state.ready_state,
            Some(ReadyState::Loading) | Some(ReadyState::Done)
        ) {
            return Err(Error::invalid_state(
                "responseType",
                state.ready_state.unwrap_or(ReadyState::Unsent).as_str(),
            ));
        }
        state.response_type = response_type;
        Ok(())
    }

    fn response_text(&self) -> String {
        self.state.read().response_text.clone()
    }

    fn response(&self) -> ResponseBody {
        let state = self.state.read();
        if state.ready_state != Some(ReadyState::Done) && !state.response_type.is_textual() {
            return ResponseBody::Null;
        }
        state.response_type.decode(&state.response_text)
    }

    fn response_header(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        let values: Vec<_> = self
            .state
            .read()
            .response_headers
            .iter()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v.clone())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    fn all_response_headers(&self) -> String {
        self.state
            .read()
            .response_headers
            .iter()
            .map(|(n, v)| format!("{}: {}\r\n", n, v))
            .collect()
    }

    fn handler(&self, kind: EventKind) -> Option<Listener> {
        self.state.read().events.handler(kind)
    }

    fn set_handler(&self, kind: EventKind, handler: Option<Listener>) {
        self.state.write().events.set_handler(kind, handler);
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) {
        self.state.write().events.add(kind, listener);
    }

    fn remove_event_listener(&self, kind: EventKind, listener: &Listener) {
        self.state.write().events.remove(kind, listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Listener {
        let log = log.clone();
        Listener::callback(move |xhr: &dyn Transport, event: &ProgressEvent| {
            log.lock()
                .push(format!("{}:{}:{}", tag, event.kind, xhr.ready_state().as_u16()));
            Ok(())
        })
    }

    #[test]
    fn test_respond_event_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let xhr = StubTransport::new();
        xhr.set_handler(EventKind::ReadyStateChange, Some(recorder(&log, "slot")));
        xhr.add_event_listener(EventKind::Load, recorder(&log, "listener"));

        xhr.open("get", "https://some.api/data").unwrap();
        xhr.send(None).unwrap();
        xhr.respond(200, "ok");

        assert_eq!(
            *log.lock(),
            vec![
                "slot:readystatechange:1",
                "slot:readystatechange:2",
                "slot:readystatechange:3",
                "slot:readystatechange:4",
                "listener:load:4",
            ]
        );
        assert_eq!(xhr.method().as_deref(), Some("GET"));
        assert_eq!(xhr.response_url(), "https://some.api/data");
        assert_eq!(xhr.status_text(), "OK");
        assert_eq!(xhr.response_text(), "ok");
    }

    #[test]
    fn test_send_before_open_is_invalid() {
        let xhr = StubTransport::new();
        assert!(xhr.send(None).unwrap_err().is_invalid_state());

        xhr.open("GET", "https://some.api").unwrap();
        xhr.send(Some(Bytes::from("body"))).unwrap();
        assert!(xhr.send(None).unwrap_err().is_invalid_state());
        assert_eq!(xhr.request_body(), Some(Bytes::from("body")));
    }

    #[test]
    fn test_listener_dedup_and_removal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let xhr = StubTransport::new();
        let listener = recorder(&log, "l");
        xhr.add_event_listener(EventKind::Load, listener.clone());
        xhr.add_event_listener(EventKind::Load, listener.clone());

        xhr.fire(EventKind::Load);
        assert_eq!(log.lock().len(), 1);

        xhr.remove_event_listener(EventKind::Load, &listener);
        xhr.fire(EventKind::Load);
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_response_headers() {
        let xhr = StubTransport::new();
        xhr.add_response_header("X-Cache", "hit");
        xhr.add_response_header("x-cache", "stale");

        assert_eq!(xhr.response_header("x-cache").as_deref(), Some("hit, stale"));
        assert_eq!(xhr.all_response_headers(), "x-cache: hit\r\nx-cache: stale\r\n");
        assert_eq!(xhr.response_header("missing"), None);
    }

    #[test]
    fn test_json_response() {
        let xhr = StubTransport::new();
        xhr.set_response_type(ResponseType::Json).unwrap();
        xhr.open("GET", "https://some.api").unwrap();
        xhr.send(None).unwrap();
        xhr.respond(200, r#"{"hello":"world"}"#);

        assert_eq!(
            xhr.response(),
            ResponseBody::Json(serde_json::json!({"hello": "world"}))
        );
    }
}
