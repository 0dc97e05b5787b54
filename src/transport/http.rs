// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Network transport backed by [`HttpClient`]
//!
//! `send` spawns the request on the ambient tokio runtime; the spawned task
//! walks the ready state and fires events once the response is buffered.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::{
    fire_listeners, EventKind, EventSlots, Listener, ProgressEvent, ReadyState, ResponseBody,
    ResponseType, Transport,
};
use crate::error::{Error, Result};
use crate::http::{HttpClient, Request, Response};

#[derive(Default)]
struct HttpState {
    ready_state: Option<ReadyState>,
    /// Request built by `open`, taken by `send`
    pending: Option<Request>,
    sent: bool,
    timeout: Option<Duration>,
    response: Option<Response>,
    response_type: ResponseType,
    /// Bumped by `open`/`abort` so a stale task cannot complete a newer request
    generation: u64,
    events: EventSlots,
}

struct Inner {
    client: HttpClient,
    state: RwLock<HttpState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// XHR-style transport that performs real HTTP requests
///
/// Cheap to clone; clones refer to the same request.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<Inner>,
}

impl HttpTransport {
    pub fn new(client: HttpClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                state: RwLock::new(HttpState::default()),
                task: Mutex::new(None),
            }),
        }
    }

    /// Per-request timeout, overriding the client default
    pub fn set_timeout(&self, timeout: Option<Duration>) {
        self.inner.state.write().timeout = timeout;
    }

    fn fire(&self, kind: EventKind) {
        let (slot, listeners, event) = {
            let state = self.inner.state.read();
            let ready_state = state.ready_state.unwrap_or(ReadyState::Unsent);
            let loaded = state
                .response
                .as_ref()
                .map(|r| r.body_len() as u64)
                .unwrap_or(0);
            let (slot, listeners) = state.events.snapshot(kind);
            let event = ProgressEvent::new(kind, ready_state).with_progress(loaded, Some(loaded));
            (slot, listeners, event)
        };
        fire_listeners(self, slot, listeners, &event);
    }

    fn transition(&self, ready_state: ReadyState) {
        self.inner.state.write().ready_state = Some(ready_state);
        self.fire(EventKind::ReadyStateChange);
    }

    fn complete(&self, generation: u64, result: Result<Response>) {
        {
            let mut state = self.inner.state.write();
            if state.generation != generation {
                return;
            }
            if let Ok(ref response) = result {
                state.response = Some(response.clone());
            }
        }

        match result {
            Ok(_) => {
                self.transition(ReadyState::HeadersReceived);
                self.transition(ReadyState::Loading);
                self.transition(ReadyState::Done);
                self.fire(EventKind::Load);
            }
            Err(e) => {
                let timed_out = matches!(&e, Error::Http(inner) if inner.is_timeout());
                tracing::debug!(error = %e, timed_out, "HTTP transport request failed");
                self.transition(ReadyState::Done);
                self.fire(if timed_out {
                    EventKind::Timeout
                } else {
                    EventKind::Error
                });
            }
        }
        self.fire(EventKind::LoadEnd);
    }

    fn state_name(&self) -> &'static str {
        self.ready_state().as_str()
    }
}

impl Transport for HttpTransport {
    fn open(&self, method: &str, url: &str) -> Result<()> {
        let request = Request::new(method, url)?;
        if let Some(task) = self.inner.task.lock().take() {
            task.abort();
        }
        {
            let mut state = self.inner.state.write();
            state.generation += 1;
            state.pending = Some(request);
            state.sent = false;
            state.response = None;
        }
        self.transition(ReadyState::Opened);
        Ok(())
    }

    fn set_request_header(&self, name: &str, value: &str) -> Result<()> {
        let mut state = self.inner.state.write();
        match state.pending.take() {
            Some(request) if !state.sent => {
                state.pending = Some(request.header(name, value));
                Ok(())
            }
            other => {
                state.pending = other;
                Err(Error::invalid_state(
                    "setRequestHeader",
                    state.ready_state.unwrap_or(ReadyState::Unsent).as_str(),
                ))
            }
        }
    }

    fn send(&self, body: Option<Bytes>) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::config("HttpTransport::send requires a tokio runtime"))?;

        let (mut request, generation) = {
            let mut state = self.inner.state.write();
            if state.sent || state.ready_state != Some(ReadyState::Opened) {
                drop(state);
                return Err(Error::invalid_state("send", self.state_name()));
            }
            let request = match state.pending.take() {
                Some(request) => request,
                None => {
                    drop(state);
                    return Err(Error::invalid_state("send", self.state_name()));
                }
            };
            state.sent = true;
            let request = match state.timeout {
                Some(timeout) => request.timeout(timeout),
                None => request,
            };
            (request, state.generation)
        };
        if let Some(body) = body {
            request = request.body(body);
        }

        tracing::debug!(method = %request.method, url = %request.url, "HTTP transport send");
        self.fire(EventKind::LoadStart);

        let this = self.clone();
        let task = runtime.spawn(async move {
            let result = this.inner.client.execute(request).await;
            this.complete(generation, result);
        });
        *self.inner.task.lock() = Some(task);
        Ok(())
    }

    fn abort(&self) {
        if let Some(task) = self.inner.task.lock().take() {
            task.abort();
        }
        let in_flight = {
            let mut state = self.inner.state.write();
            state.generation += 1;
            let in_flight = state.sent && state.ready_state != Some(ReadyState::Done);
            if in_flight {
                state.response = None;
            }
            in_flight
        };
        if in_flight {
            self.transition(ReadyState::Done);
            self.fire(EventKind::Abort);
            self.fire(EventKind::LoadEnd);
        }
        let mut state = self.inner.state.write();
        state.sent = false;
        state.pending = None;
        state.ready_state = Some(ReadyState::Unsent);
    }

    fn ready_state(&self) -> ReadyState {
        self.inner
            .state
            .read()
            .ready_state
            .unwrap_or(ReadyState::Unsent)
    }

    fn status(&self) -> u16 {
        self.inner
            .state
            .read()
            .response
            .as_ref()
            .map(Response::status_code)
            .unwrap_or(0)
    }

    fn status_text(&self) -> String {
        self.inner
            .state
            .read()
            .response
            .as_ref()
            .map(|r| r.status_text().to_string())
            .unwrap_or_default()
    }

    fn response_url(&self) -> String {
        self.inner
            .state
            .read()
            .response
            .as_ref()
            .map(|r| r.url_str().to_string())
            .unwrap_or_default()
    }

    fn response_type(&self) -> ResponseType {
        self.inner.state.read().response_type
    }

    fn set_response_type(&self, response_type: ResponseType) -> Result<()> {
        let mut state = self.inner.state.write();
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
        let state = self.inner.state.read();
        match (&state.response, state.ready_state) {
            (Some(response), Some(ReadyState::Loading | ReadyState::Done)) => response.text_lossy(),
            _ => String::new(),
        }
    }

    fn response(&self) -> ResponseBody {
        let state = self.inner.state.read();
        match (&state.response, state.ready_state) {
            (Some(response), Some(ReadyState::Done)) => match state.response_type {
                ResponseType::ArrayBuffer | ResponseType::Blob => {
                    ResponseBody::Bytes(response.body.clone())
                }
                other => other.decode(&response.text_lossy()),
            },
            _ => ResponseBody::Null,
        }
    }

    fn response_header(&self, name: &str) -> Option<String> {
        let state = self.inner.state.read();
        let response = state.response.as_ref()?;
        let values: Vec<_> = response
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    fn all_response_headers(&self) -> String {
        self.inner
            .state
            .read()
            .response
            .as_ref()
            .map(Response::header_block)
            .unwrap_or_default()
    }

    fn handler(&self, kind: EventKind) -> Option<Listener> {
        self.inner.state.read().events.handler(kind)
    }

    fn set_handler(&self, kind: EventKind, handler: Option<Listener>) {
        self.inner.state.write().events.set_handler(kind, handler);
    }

    fn add_event_listener(&self, kind: EventKind, listener: Listener) {
        self.inner.state.write().events.add(kind, listener);
    }

    fn remove_event_listener(&self, kind: EventKind, listener: &Listener) {
        self.inner.state.write().events.remove(kind, listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_send_without_runtime() {
        let xhr = HttpTransport::new(HttpClient::new().unwrap());
        xhr.open("GET", "https://example.com").unwrap();
        assert!(matches!(xhr.send(None), Err(Error::Config(_))));
    }

    #[test]
    fn test_open_rejects_bad_url() {
        let xhr = HttpTransport::new(HttpClient::new().unwrap());
        assert!(matches!(xhr.open("GET", "::"), Err(Error::Url(_))));
        assert_eq!(xhr.ready_state(), ReadyState::Unsent);
    }

    #[tokio::test]
    async fn test_load_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data"))
            .and(header("x-requested-with", "XMLHttpRequest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-cache", "miss")
                    .set_body_string(r#"{"hello":"world"}"#),
            )
            .mount(&server)
            .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let xhr = HttpTransport::new(HttpClient::new().unwrap());
        xhr.set_handler(
            EventKind::Load,
            Some(Listener::callback(move |target: &dyn Transport, _: &ProgressEvent| {
                tx.send((target.status(), target.response_text()))?;
                Ok(())
            })),
        );

        xhr.open("GET", &format!("{}/data", server.uri())).unwrap();
        xhr.set_request_header("x-requested-with", "XMLHttpRequest")
            .unwrap();
        xhr.send(None).unwrap();

        let (status, text) = rx.recv().await.unwrap();
        assert_eq!(status, 200);
        assert_eq!(text, r#"{"hello":"world"}"#);
        assert_eq!(xhr.ready_state(), ReadyState::Done);
        assert_eq!(xhr.response_header("x-cache").as_deref(), Some("miss"));
        assert!(xhr.response_url().ends_with("/data"));
    }

    #[tokio::test]
    async fn test_network_failure_fires_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let xhr = HttpTransport::new(HttpClient::new().unwrap());
        let on_error = tx.clone();
        xhr.add_event_listener(
            EventKind::Error,
            Listener::callback(move |_: &dyn Transport, event: &ProgressEvent| {
                on_error.send(event.kind)?;
                Ok(())
            }),
        );
        xhr.add_event_listener(
            EventKind::Load,
            Listener::callback(move |_: &dyn Transport, event: &ProgressEvent| {
                tx.send(event.kind)?;
                Ok(())
            }),
        );

        // Port 9 (discard) is not listening on the loopback interface
        xhr.open("GET", "http://127.0.0.1:9/").unwrap();
        xhr.send(None).unwrap();

        assert_eq!(rx.recv().await, Some(EventKind::Error));
        assert_eq!(xhr.status(), 0);
        assert_eq!(xhr.ready_state(), ReadyState::Done);
    }
}
