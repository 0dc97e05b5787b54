// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Completion dispatch and the transform pipeline
//!
//! Each request gets one trampoline per completion signal, installed in the
//! underlying transport's `onload` / `onreadystatechange` slots. When the
//! transport fires one, the trampoline runs the transform (at most once per
//! completion cycle), stores the validated overrides, and only then invokes
//! the caller's listeners in registration order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::config::{EngineConfig, RejectionPolicy};
use super::facade::InterceptedXhr;
use super::overrides::{OverrideSet, ResponseField};
use super::registry::ListenerRegistry;
use super::trace::Tracer;
use crate::error::Error;
use crate::transport::{EventKind, Listener, ProgressEvent, Transport};

/// Where the current completion cycle stands
enum Phase {
    /// No terminal signal seen yet
    Idle,
    /// Transform running; signals that arrive meanwhile wait here in order
    Pending(Vec<ProgressEvent>),
    /// Overrides stored; further signals dispatch immediately
    Settled,
    /// Dispatch will never happen for this cycle
    Stalled,
}

struct Cycle {
    /// Bumped on every `open`; results for an older cycle are discarded
    generation: u64,
    phase: Phase,
}

/// How a transform run ended
enum Settlement {
    /// Transform not configured or filtered out
    Skipped,
    Payload(Value),
    Rejected(Error),
}

/// What a completion signal should do, decided under the cycle lock
enum Next {
    Start(u64),
    Queued,
    Dispatch,
    Stalled,
}

/// State for one wrapped request
pub(crate) struct RequestInstance {
    pub(crate) id: u64,
    pub(crate) underlying: Arc<dyn Transport>,
    pub(crate) config: Arc<EngineConfig>,
    pub(crate) overrides: RwLock<OverrideSet>,
    pub(crate) listeners: Mutex<ListenerRegistry>,
    open_trace: RwLock<Option<String>>,
    tracer: Tracer,
    cycle: Mutex<Cycle>,
}

impl RequestInstance {
    /// Wrap `underlying` and point its completion slots at this instance
    pub(crate) fn install(
        id: u64,
        underlying: Arc<dyn Transport>,
        config: Arc<EngineConfig>,
        tracer: Tracer,
    ) -> Arc<Self> {
        let instance = Arc::new(Self {
            id,
            underlying,
            config,
            overrides: RwLock::new(OverrideSet::default()),
            listeners: Mutex::new(ListenerRegistry::default()),
            open_trace: RwLock::new(None),
            tracer,
            cycle: Mutex::new(Cycle {
                generation: 0,
                phase: Phase::Idle,
            }),
        });

        for kind in [EventKind::Load, EventKind::ReadyStateChange] {
            instance
                .underlying
                .set_handler(kind, Some(trampoline(&instance, kind)));
        }
        instance
    }

    /// Start a new completion cycle; called when the request is (re)opened
    pub(crate) fn begin_cycle(&self, method: &str, url: &str) {
        {
            let mut cycle = self.cycle.lock();
            cycle.generation += 1;
            cycle.phase = Phase::Idle;
            *self.overrides.write() = OverrideSet::default();
        }
        if self.tracer.is_enabled() {
            *self.open_trace.write() = Some(format!("{} {}", method.to_ascii_uppercase(), url));
        }
    }

    pub(crate) fn trace<F>(&self, message: F)
    where
        F: FnOnce() -> String,
    {
        if self.tracer.is_enabled() {
            self.tracer
                .emit(self.id, self.open_trace.read().clone(), message);
        }
    }

    fn on_signal(self: &Arc<Self>, kind: EventKind, event: &ProgressEvent) {
        let ready_state = self.underlying.ready_state();
        match kind {
            EventKind::ReadyStateChange => self.trace(|| {
                format!("{} readyState={}", kind.handler_name(), ready_state.as_u16())
            }),
            _ => self.trace(|| kind.handler_name().to_string()),
        }

        if kind == EventKind::ReadyStateChange && !ready_state.is_done() {
            return;
        }

        let next = {
            let mut guard = self.cycle.lock();
            let cycle = &mut *guard;
            match cycle.phase {
                Phase::Idle => {
                    cycle.phase = Phase::Pending(vec![event.clone()]);
                    Next::Start(cycle.generation)
                }
                Phase::Pending(ref mut queued) => {
                    queued.push(event.clone());
                    Next::Queued
                }
                Phase::Settled => Next::Dispatch,
                Phase::Stalled => Next::Stalled,
            }
        };

        match next {
            Next::Start(generation) => self.run_pipeline(generation),
            Next::Queued => {
                self.trace(|| format!("{} waiting on pending transform", kind.handler_name()))
            }
            Next::Dispatch => self.dispatch(event),
            Next::Stalled => {
                self.trace(|| format!("{} ignored, cycle stalled", kind.handler_name()))
            }
        }
    }

    fn run_pipeline(self: &Arc<Self>, generation: u64) {
        let url = self.underlying.response_url();
        let transform = match self.config.transform {
            Some(ref transform) if self.config.applies_to(&url) => transform.clone(),
            _ => {
                self.trace(|| format!("no transform applies to '{}'", url));
                self.settle(generation, Settlement::Skipped);
                return;
            }
        };

        tracing::debug!(request_id = self.id, url = %url, "Running response transform");
        let mut pending = transform.transform(self.underlying.as_ref()).into_future();

        if let Some(outcome) = (&mut pending).now_or_never() {
            self.settle(generation, settlement(outcome));
            return;
        }

        self.trace(|| "transform deferred".to_string());
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let instance = self.clone();
                runtime.spawn(async move {
                    let outcome = pending.await;
                    instance.settle(generation, settlement(outcome));
                });
            }
            Err(_) => {
                tracing::warn!(
                    request_id = self.id,
                    "Deferred transform needs a tokio runtime; completion stalled"
                );
                self.trace(|| "no runtime to drive deferred transform, cycle stalled".to_string());
                self.stall(generation);
            }
        }
    }

    fn settle(self: &Arc<Self>, generation: u64, settlement: Settlement) {
        let validated = match settlement {
            Settlement::Skipped => None,
            Settlement::Payload(payload) => Some(OverrideSet::apply_validated(&payload)),
            Settlement::Rejected(e) => {
                if self.cycle.lock().generation != generation {
                    self.trace(|| "discarding transform result from a previous cycle".to_string());
                    return;
                }
                tracing::warn!(request_id = self.id, error = %e, "Response transform rejected");
                match self.config.rejection {
                    RejectionPolicy::DispatchOriginal => {
                        self.trace(|| format!("{}, dispatching original response", e));
                        None
                    }
                    RejectionPolicy::Stall => {
                        self.trace(|| format!("{}, cycle stalled", e));
                        self.stall(generation);
                        return;
                    }
                }
            }
        };

        let queued = {
            let mut cycle = self.cycle.lock();
            if cycle.generation != generation {
                drop(cycle);
                self.trace(|| "discarding transform result from a previous cycle".to_string());
                return;
            }
            if let Some(ref validated) = validated {
                *self.overrides.write() = validated.overrides.clone();
            }
            match std::mem::replace(&mut cycle.phase, Phase::Settled) {
                Phase::Pending(queued) => queued,
                _ => Vec::new(),
            }
        };

        if let Some(validated) = validated {
            if !validated.dropped.is_empty() {
                self.trace(|| format!("dropped override fields: {}", validated.dropped.join(", ")));
            }
            self.trace(|| {
                let fields: Vec<&str> = validated
                    .overrides
                    .fields()
                    .into_iter()
                    .map(ResponseField::name)
                    .collect();
                format!("transform settled, overriding [{}]", fields.join(", "))
            });
        }

        for event in &queued {
            self.dispatch(event);
        }
    }

    fn stall(&self, generation: u64) {
        let mut cycle = self.cycle.lock();
        if cycle.generation == generation {
            cycle.phase = Phase::Stalled;
        }
    }

    /// Invoke every listener registered for `event.kind`, in order
    ///
    /// The first listener error or panic ends this dispatch; it is reported
    /// and never propagated to the transport that fired the signal. Panics are
    /// only contained when unwinding is enabled.
    fn dispatch(self: &Arc<Self>, event: &ProgressEvent) {
        let listeners = self.listeners.lock().snapshot(event.kind);
        if listeners.is_empty() {
            self.trace(|| format!("no {} listeners registered", event.kind.handler_name()));
            return;
        }

        let target = InterceptedXhr::from_instance(self.clone());
        for (index, listener) in listeners.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.invoke(&target, event)))
                .unwrap_or_else(|payload| {
                    Err(anyhow::anyhow!("panicked: {}", panic_message(&*payload)))
                });
            if let Err(e) = outcome {
                tracing::warn!(
                    request_id = self.id,
                    event = %event.kind,
                    listener = index,
                    error = %e,
                    "Completion listener failed"
                );
                self.trace(|| {
                    format!("{} listener #{} failed: {:#}", event.kind.handler_name(), index, e)
                });
                break;
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload")
}

fn settlement(outcome: crate::error::Result<Value>) -> Settlement {
    match outcome {
        Ok(payload) => Settlement::Payload(payload),
        Err(e) => Settlement::Rejected(e),
    }
}

/// Slot handler that forwards a completion signal to its instance
///
/// Holds the instance weakly: the underlying transport owns the trampoline,
/// and the instance owns the transport.
fn trampoline(instance: &Arc<RequestInstance>, kind: EventKind) -> Listener {
    let weak: Weak<RequestInstance> = Arc::downgrade(instance);
    let id = instance.id;
    let tracer = instance.tracer.clone();

    Listener::callback(move |_: &dyn Transport, event: &ProgressEvent| {
        match weak.upgrade() {
            Some(instance) => instance.on_signal(kind, event),
            None => tracer.emit(id, None, || {
                format!("{} after every handle was dropped", kind.handler_name())
            }),
        }
        Ok(())
    })
}
