// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Completion listener registry
//!
//! Assigning `onload` and calling `add_event_listener("load", ..)` land in the
//! same ordered list, so dispatch order is registration order regardless of
//! which style registered a listener.

use std::collections::HashMap;

use crate::transport::{EventKind, Listener};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Registration {
    /// Assigned through the `onX` slot
    Slot,
    /// Added through `add_event_listener`
    EventListener,
}

#[derive(Debug, Clone)]
struct ListenerRecord {
    registration: Registration,
    listener: Listener,
}

#[derive(Debug, Default)]
pub(crate) struct ListenerRegistry {
    signals: HashMap<EventKind, Vec<ListenerRecord>>,
}

impl ListenerRegistry {
    /// Assign the slot listener, replacing the previous one in place
    pub(crate) fn set_slot(&mut self, kind: EventKind, listener: Option<Listener>) {
        let records = self.signals.entry(kind).or_default();
        let position = records
            .iter()
            .position(|r| r.registration == Registration::Slot);

        match (position, listener) {
            (Some(i), Some(listener)) => records[i].listener = listener,
            (Some(i), None) => {
                records.remove(i);
            }
            (None, Some(listener)) => records.push(ListenerRecord {
                registration: Registration::Slot,
                listener,
            }),
            (None, None) => {}
        }
    }

    /// Append a listener; returns false when it was already registered
    pub(crate) fn add(&mut self, kind: EventKind, listener: Listener) -> bool {
        let records = self.signals.entry(kind).or_default();
        let duplicate = records.iter().any(|r| {
            r.registration == Registration::EventListener && r.listener.same_as(&listener)
        });
        if duplicate {
            return false;
        }
        records.push(ListenerRecord {
            registration: Registration::EventListener,
            listener,
        });
        true
    }

    /// Remove a listener added with [`add`](Self::add)
    pub(crate) fn remove(&mut self, kind: EventKind, listener: &Listener) -> bool {
        let Some(records) = self.signals.get_mut(&kind) else {
            return false;
        };
        let before = records.len();
        records.retain(|r| {
            !(r.registration == Registration::EventListener && r.listener.same_as(listener))
        });
        records.len() != before
    }

    /// Listeners for `kind` in dispatch order
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<Listener> {
        self.signals
            .get(&kind)
            .map(|records| records.iter().map(|r| r.listener.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn len(&self, kind: EventKind) -> usize {
        self.signals.get(&kind).map(Vec::len).unwrap_or(0)
    }
}
