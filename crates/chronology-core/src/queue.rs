//! Per-subject event queue.
//!
//! A [`Queue`] is built for one operation on one subject and then dropped.
//! It lazily loads the persisted [`EventList`] and the available actions,
//! and caches both for its lifetime.
//!
//! Saving takes a full replacement submission. Every well-formed row is
//! normalized and registered with the [`Scheduler`]; events that were
//! persisted before but are absent from the submission are deregistered; the
//! new list is then persisted regardless of how dispatch went. Dispatch
//! failures are collected in the returned [`SaveReport`].
//!
//! There is no locking: two saves of the same subject racing each other
//! resolve as last-writer-wins.

use crate::action::{ActionMap, ActionRegistry};
use crate::error::Result;
use crate::event::{decode_event_list, encode_event_list, Event, EventContext, EventList, RawEntry};
use crate::sanitize::sanitize_text;
use crate::scheduler::Scheduler;
use crate::store::MetaStore;
use crate::subject::Subject;
use crate::timestamp;
use chrono::FixedOffset;
use serde::Serialize;
use std::collections::HashSet;

/// Metadata key the queue is stored under.
pub const QUEUE_META_KEY: &str = "_chronology_queue";

// ---------------------------------------------------------------------------
// SaveReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchFailure {
    pub event: Event,
    pub reason: String,
}

/// Outcome of [`Queue::save_items`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SaveReport {
    /// The list written to storage, in submitted order.
    pub persisted: EventList,
    /// Submitted rows discarded as malformed.
    pub dropped: usize,
    pub registered: Vec<Event>,
    pub register_failures: Vec<DispatchFailure>,
    pub deregistered: Vec<Event>,
    pub deregister_failures: Vec<DispatchFailure>,
}

impl SaveReport {
    /// True when every register and deregister call succeeded.
    pub fn is_clean(&self) -> bool {
        self.register_failures.is_empty() && self.deregister_failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

pub struct Queue<'a> {
    subject: Subject,
    offset: FixedOffset,
    store: &'a dyn MetaStore,
    scheduler: &'a dyn Scheduler,
    registry: &'a ActionRegistry,
    actions: Option<ActionMap>,
    items: Option<EventList>,
}

impl<'a> Queue<'a> {
    pub fn new(
        subject: Subject,
        store: &'a dyn MetaStore,
        scheduler: &'a dyn Scheduler,
        registry: &'a ActionRegistry,
    ) -> Self {
        Self {
            subject,
            offset: timestamp::utc(),
            store,
            scheduler,
            registry,
            actions: None,
            items: None,
        }
    }

    /// Read submitted wall-clock timestamps in `offset` instead of UTC.
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Context passed to the scheduler for every event of this subject.
    pub fn context(&self) -> EventContext {
        EventContext::for_subject(self.subject.id)
    }

    /// Actions that may be scheduled for this subject.
    ///
    /// Resolved once; later calls return the cached map even if the registry
    /// would now answer differently.
    pub fn get_actions(&mut self) -> &ActionMap {
        let actions = match self.actions.take() {
            Some(actions) => actions,
            None => self.registry.resolve(&self.subject),
        };
        self.actions.insert(actions)
    }

    /// The persisted events for this subject, loaded on first call.
    pub fn get_items(&mut self) -> Result<&EventList> {
        let items = match self.items.take() {
            Some(items) => items,
            None => {
                let stored = self.store.read(self.subject.id, QUEUE_META_KEY)?;
                let items = decode_event_list(stored);
                tracing::debug!(subject = %self.subject, count = items.len(), "loaded queue");
                items
            }
        };
        Ok(self.items.insert(items))
    }

    /// Replace this subject's events with `raw`.
    ///
    /// Only a storage failure is returned as an error. Afterwards
    /// [`get_items`](Self::get_items) returns the persisted list.
    pub fn save_items<I>(&mut self, raw: I) -> Result<SaveReport>
    where
        I: IntoIterator<Item = RawEntry>,
    {
        let current = self.get_items()?.clone();
        let context = self.context();
        let mut report = SaveReport::default();
        let mut next = EventList::new();

        for entry in raw {
            let Some(event) = self.normalize(&entry) else {
                report.dropped += 1;
                continue;
            };
            match self
                .scheduler
                .register(event.timestamp, &event.action, &context)
            {
                Ok(()) => report.registered.push(event.clone()),
                Err(e) => {
                    tracing::warn!(subject = %self.subject, event = %event, error = %e, "failed to register event");
                    report.register_failures.push(DispatchFailure {
                        event: event.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            next.push(event);
        }

        let kept: HashSet<&Event> = next.iter().collect();
        for event in current.iter().filter(|e| !kept.contains(e)) {
            match self
                .scheduler
                .deregister(event.timestamp, &event.action, &context)
            {
                Ok(()) => report.deregistered.push(event.clone()),
                Err(e) => {
                    tracing::warn!(subject = %self.subject, event = %event, error = %e, "failed to deregister event");
                    report.deregister_failures.push(DispatchFailure {
                        event: event.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.store
            .write(self.subject.id, QUEUE_META_KEY, encode_event_list(&next)?)?;
        tracing::info!(
            subject = %self.subject,
            persisted = next.len(),
            registered = report.registered.len(),
            deregistered = report.deregistered.len(),
            failures = report.register_failures.len() + report.deregister_failures.len(),
            "saved queue"
        );

        report.persisted = next.clone();
        self.items = Some(next);
        Ok(report)
    }

    /// Validate and normalize one submitted row. `None` drops it.
    fn normalize(&self, entry: &RawEntry) -> Option<Event> {
        let raw_timestamp = entry.timestamp.as_deref().filter(|s| !is_blank(s))?;
        let raw_action = entry.action.as_deref().filter(|s| !is_blank(s))?;

        let timestamp = match timestamp::to_utc_epoch(raw_timestamp, self.offset) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::debug!(error = %e, "dropping row with unreadable timestamp");
                return None;
            }
        };
        let action = sanitize_text(raw_action);
        if action.is_empty() {
            tracing::debug!(raw = raw_action, "dropping row whose action sanitizes to nothing");
            return None;
        }
        Some(Event { timestamp, action })
    }
}

/// Empty after trimming, or the falsy string `"0"`.
fn is_blank(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s == "0"
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
