//! Per-subject scheduled-event queues.
//!
//! Each subject owns an ordered list of future [`Event`]s. A [`Queue`]
//! reconciles a submitted list against the persisted one: new events are
//! registered with a [`Scheduler`], stale ones are deregistered, and the
//! result is written to a [`MetaStore`]. An [`ActionRegistry`] decides which
//! actions may be scheduled for a subject.

pub mod action;
pub mod config;
pub mod cron;
pub mod error;
pub mod event;
pub mod io;
pub mod paths;
pub mod queue;
pub mod sanitize;
pub mod scheduler;
pub mod store;
pub mod subject;
pub mod timestamp;

pub use action::{ActionDescriptor, ActionMap, ActionProvider, ActionRegistry};
pub use error::{ChronologyError, Result};
pub use event::{Event, EventContext, EventList, RawEntry};
pub use queue::{Queue, SaveReport, QUEUE_META_KEY};
pub use scheduler::Scheduler;
pub use store::MetaStore;
pub use subject::{Subject, SubjectSupport};
