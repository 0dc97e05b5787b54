// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Response transforms
//!
//! A transform looks at a finished transport and returns the fields to
//! override, either right away or later. Both shapes are carried by
//! [`Deferred`] so the pipeline treats them the same way.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::transport::{ReadyState, ResponseType, Transport};

/// Override payload that may not be available yet
pub struct Deferred {
    inner: BoxFuture<'static, Result<Value>>,
}

impl Deferred {
    /// An already-settled payload
    pub fn ready(payload: impl Into<Value>) -> Self {
        Self {
            inner: future::ready(Ok(payload.into())).boxed(),
        }
    }

    /// An already-rejected transform
    pub fn rejected(error: Error) -> Self {
        Self {
            inner: future::ready(Err(error)).boxed(),
        }
    }

    /// A payload produced by a future
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            inner: future.boxed(),
        }
    }

    pub(crate) fn into_future(self) -> BoxFuture<'static, Result<Value>> {
        self.inner
    }
}

impl From<Value> for Deferred {
    fn from(payload: Value) -> Self {
        Deferred::ready(payload)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

/// Rewrites the outcome of a finished request
///
/// Receives the underlying transport, not the facade, so it always sees the
/// real response.
pub trait ResponseTransform: Send + Sync {
    fn transform(&self, xhr: &dyn Transport) -> Deferred;
}

impl<F> ResponseTransform for F
where
    F: Fn(&dyn Transport) -> Deferred + Send + Sync,
{
    fn transform(&self, xhr: &dyn Transport) -> Deferred {
        self(xhr)
    }
}

/// Owned copy of a transport's response, for transforms that outlive the borrow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub ready_state: ReadyState,
    pub status: u16,
    pub status_text: String,
    pub response_url: String,
    pub response_type: ResponseType,
    pub response_text: String,
    pub headers: String,
}

impl ResponseSnapshot {
    pub fn capture(xhr: &dyn Transport) -> Self {
        Self {
            ready_state: xhr.ready_state(),
            status: xhr.status(),
            status_text: xhr.status_text(),
            response_url: xhr.response_url(),
            response_type: xhr.response_type(),
            response_text: xhr.response_text(),
            headers: xhr.all_response_headers(),
        }
    }
}

/// Transform written as an async function over a [`ResponseSnapshot`]
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use swizzle::intercept::{AsyncTransform, ResponseSnapshot};
///
/// struct Redact;
///
/// #[async_trait]
/// impl AsyncTransform for Redact {
///     async fn transform(&self, response: ResponseSnapshot) -> swizzle::Result<Value> {
///         let body = response.response_text.replace("secret", "******");
///         Ok(json!({ "responseText": body }))
///     }
/// }
/// ```
#[async_trait]
pub trait AsyncTransform: Send + Sync + 'static {
    async fn transform(&self, response: ResponseSnapshot) -> Result<Value>;
}

/// Adapts an [`AsyncTransform`] to [`ResponseTransform`]
pub struct AsyncAdapter<T> {
    inner: Arc<T>,
}

impl<T: AsyncTransform> AsyncAdapter<T> {
    pub fn new(transform: T) -> Self {
        Self {
            inner: Arc::new(transform),
        }
    }
}

impl<T: AsyncTransform> ResponseTransform for AsyncAdapter<T> {
    fn transform(&self, xhr: &dyn Transport) -> Deferred {
        let snapshot = ResponseSnapshot::capture(xhr);
        let inner = self.inner.clone();
        Deferred::from_future(async move { inner.transform(snapshot).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::StubTransport;
    use serde_json::json;

    struct Upper;

    #[async_trait]
    impl AsyncTransform for Upper {
        async fn transform(&self, response: ResponseSnapshot) -> Result<Value> {
            tokio::task::yield_now().await;
            Ok(json!({ "responseText": response.response_text.to_uppercase() }))
        }
    }

    #[test]
    fn test_ready_settles_immediately() {
        let mut fut = Deferred::ready(json!({ "status": 201 })).into_future();
        let settled = (&mut fut).now_or_never().unwrap().unwrap();
        assert_eq!(settled, json!({ "status": 201 }));
    }

    #[test]
    fn test_rejected_settles_with_error() {
        let fut = Deferred::rejected(Error::transform("nope")).into_future();
        assert!(matches!(fut.now_or_never(), Some(Err(Error::Transform(_)))));
    }

    #[test]
    fn test_closure_transform() {
        let transform =
            |xhr: &dyn Transport| Deferred::ready(json!({ "statusText": xhr.status_text() }));
        let xhr = StubTransport::new();
        xhr.set_status(200, "Fine");

        let fut = transform.transform(&xhr).into_future();
        assert_eq!(
            fut.now_or_never().unwrap().unwrap(),
            json!({ "statusText": "Fine" })
        );
    }

    #[test]
    fn test_future_payload_pending_until_resolved() {
        let (tx, rx) = tokio::sync::oneshot::channel::<Value>();
        let deferred = Deferred::from_future(async move {
            rx.await.map_err(|e| Error::transform(e.to_string()))
        });

        let mut fut = tokio_test::task::spawn(deferred.into_future());
        tokio_test::assert_pending!(fut.poll());

        tx.send(json!({ "status": 204 })).unwrap();
        assert!(fut.is_woken());
        let settled = tokio_test::assert_ready!(fut.poll());
        assert_eq!(settled.unwrap(), json!({ "status": 204 }));
    }

    #[tokio::test]
    async fn test_async_adapter_uses_snapshot() {
        let xhr = StubTransport::new();
        xhr.open("GET", "https://some.api").unwrap();
        xhr.send(None).unwrap();
        xhr.respond(200, "quiet");

        let adapter = AsyncAdapter::new(Upper);
        let deferred = adapter.transform(&xhr);
        xhr.set_response_text("changed after capture");

        let payload = deferred.into_future().await.unwrap();
        assert_eq!(payload, json!({ "responseText": "QUIET" }));
    }
}
