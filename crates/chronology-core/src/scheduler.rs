use crate::error::Result;
use crate::event::EventContext;

/// External timer facility that invokes `action` with `context` at or after
/// `run_at` (Unix seconds, UTC).
///
/// Delivery timing and at-least/at-most-once guarantees belong to the
/// implementation.
pub trait Scheduler {
    fn register(&self, run_at: i64, action: &str, context: &EventContext) -> Result<()>;

    fn deregister(&self, run_at: i64, action: &str, context: &EventContext) -> Result<()>;
}
