//! Local timer facility backed by redb.
//!
//! # Table design
//!
//! A single `JOBS` table uses a variable-length composite key:
//! ```text
//! [ run_at: u64 big-endian (8 bytes) | subject_id: u64 big-endian (8 bytes) | action bytes ]
//! ```
//!
//! Byte ordering equals run time ordering, so `..prefix(now + 1)` returns
//! every job due by `now`. Registering the same `(run_at, subject, action)`
//! twice overwrites the first registration.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::error::{ChronologyError, Result};
use crate::event::EventContext;
use crate::scheduler::Scheduler;

// ---------------------------------------------------------------------------
// Table definition
// ---------------------------------------------------------------------------

/// Key: composite (run_at ++ subject_id ++ action)
/// Value: JSON-encoded ScheduledJob
const JOBS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("jobs");

// ---------------------------------------------------------------------------
// ScheduledJob
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub run_at: i64,
    pub action: String,
    pub context: EventContext,
    pub registered_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

/// Big-endian `run_at` with the sign bit flipped, so byte order matches
/// numeric order for pre-epoch times too.
fn time_prefix(run_at: i64) -> [u8; 8] {
    ((run_at as u64) ^ (1u64 << 63)).to_be_bytes()
}

fn job_key(run_at: i64, context: &EventContext, action: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + action.len());
    key.extend_from_slice(&time_prefix(run_at));
    key.extend_from_slice(&context.subject_id.to_be_bytes());
    key.extend_from_slice(action.as_bytes());
    key
}

/// Exclusive upper bound covering every job with `run_at <= now`.
///
/// Sorts after any key with the same time prefix: the trailing `0xFF` sits
/// where the action's UTF-8 bytes start, and UTF-8 never contains `0xFF`.
fn due_bound(now: i64) -> Vec<u8> {
    let mut bound = time_prefix(now).to_vec();
    bound.extend_from_slice(&[0xFF; 9]);
    bound
}

fn db_err(e: impl std::fmt::Display) -> ChronologyError {
    ChronologyError::CronDb(e.to_string())
}

fn decode_job(bytes: &[u8]) -> Result<ScheduledJob> {
    serde_json::from_slice(bytes).map_err(db_err)
}

// ---------------------------------------------------------------------------
// CronDb
// ---------------------------------------------------------------------------

/// Persistent store of pending single-run jobs.
pub struct CronDb {
    db: Database,
}

impl CronDb {
    /// Open or create the redb database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        // Ensure the table exists before any reads
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(JOBS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    /// All registered jobs, in run time order.
    pub fn list_all(&self) -> Result<Vec<ScheduledJob>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(JOBS).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            result.push(decode_job(v.value())?);
        }
        Ok(result)
    }

    /// Jobs registered with a given subject's context.
    pub fn list_for_subject(&self, subject_id: u64) -> Result<Vec<ScheduledJob>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|job| job.context.subject_id == subject_id)
            .collect())
    }

    /// Jobs with `run_at <= now`, without removing them.
    pub fn due(&self, now: i64) -> Result<Vec<ScheduledJob>> {
        let upper = due_bound(now);
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(JOBS).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in table.range(..upper.as_slice()).map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            result.push(decode_job(v.value())?);
        }
        Ok(result)
    }

    /// Remove and return every job with `run_at <= now`.
    ///
    /// Removal and read happen in one write transaction, so a job is handed
    /// out at most once.
    pub fn take_due(&self, now: i64) -> Result<Vec<ScheduledJob>> {
        let upper = due_bound(now);
        let wt = self.db.begin_write().map_err(db_err)?;
        let mut taken = Vec::new();
        {
            let mut table = wt.open_table(JOBS).map_err(db_err)?;
            let mut keys = Vec::new();
            for entry in table.range(..upper.as_slice()).map_err(db_err)? {
                let (k, v) = entry.map_err(db_err)?;
                keys.push(k.value().to_vec());
                taken.push(decode_job(v.value())?);
            }
            for key in &keys {
                table.remove(key.as_slice()).map_err(db_err)?;
            }
        }
        wt.commit().map_err(db_err)?;
        Ok(taken)
    }

    /// Cancel every job registered for a subject. Returns how many were removed.
    pub fn clear_subject(&self, subject_id: u64) -> Result<usize> {
        let wt = self.db.begin_write().map_err(db_err)?;
        let removed;
        {
            let mut table = wt.open_table(JOBS).map_err(db_err)?;
            let mut keys = Vec::new();
            for entry in table.iter().map_err(db_err)? {
                let (k, v) = entry.map_err(db_err)?;
                if decode_job(v.value())?.context.subject_id == subject_id {
                    keys.push(k.value().to_vec());
                }
            }
            for key in &keys {
                table.remove(key.as_slice()).map_err(db_err)?;
            }
            removed = keys.len();
        }
        wt.commit().map_err(db_err)?;
        Ok(removed)
    }
}

impl Scheduler for CronDb {
    fn register(&self, run_at: i64, action: &str, context: &EventContext) -> Result<()> {
        let job = ScheduledJob {
            run_at,
            action: action.to_string(),
            context: *context,
            registered_at: Utc::now(),
        };
        let key = job_key(run_at, context, action);
        let value = serde_json::to_vec(&job).map_err(db_err)?;

        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(JOBS).map_err(db_err)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn deregister(&self, run_at: i64, action: &str, context: &EventContext) -> Result<()> {
        let key = job_key(run_at, context, action);
        let wt = self.db.begin_write().map_err(db_err)?;
        let found = {
            let mut table = wt.open_table(JOBS).map_err(db_err)?;
            let removed = table.remove(key.as_slice()).map_err(db_err)?;
            removed.is_some()
        };
        if !found {
            wt.abort().map_err(db_err)?;
            return Err(ChronologyError::NotScheduled {
                run_at,
                action: action.to_string(),
            });
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, CronDb) {
        let dir = TempDir::new().unwrap();
        let db = CronDb::open(&dir.path().join("cron.db")).unwrap();
        (dir, db)
    }

    fn ctx(subject_id: u64) -> EventContext {
        EventContext::for_subject(subject_id)
    }

    #[test]
    fn register_then_list() {
        let (_dir, db) = open_tmp();
        db.register(200, "publish_post", &ctx(1)).unwrap();
        db.register(100, "trash_post", &ctx(1)).unwrap();

        let jobs = db.list_all().unwrap();
        assert_eq!(jobs.len(), 2);
        // key order = run_at ascending
        assert_eq!(jobs[0].action, "trash_post");
        assert_eq!(jobs[1].action, "publish_post");
        assert_eq!(jobs[1].context, ctx(1));
    }

    #[test]
    fn reregistering_overwrites() {
        let (_dir, db) = open_tmp();
        db.register(100, "publish_post", &ctx(1)).unwrap();
        db.register(100, "publish_post", &ctx(1)).unwrap();
        assert_eq!(db.list_all().unwrap().len(), 1);
    }

    #[test]
    fn same_event_for_two_subjects_is_two_jobs() {
        let (_dir, db) = open_tmp();
        db.register(100, "publish_post", &ctx(1)).unwrap();
        db.register(100, "publish_post", &ctx(2)).unwrap();
        assert_eq!(db.list_for_subject(1).unwrap().len(), 1);
        assert_eq!(db.list_for_subject(2).unwrap().len(), 1);
    }

    #[test]
    fn deregister_removes_only_matching_job() {
        let (_dir, db) = open_tmp();
        db.register(100, "publish_post", &ctx(1)).unwrap();
        db.register(100, "trash_post", &ctx(1)).unwrap();

        db.deregister(100, "publish_post", &ctx(1)).unwrap();

        let jobs = db.list_all().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].action, "trash_post");
    }

    #[test]
    fn deregister_unknown_job_fails() {
        let (_dir, db) = open_tmp();
        db.register(100, "publish_post", &ctx(1)).unwrap();

        let err = db.deregister(100, "publish_post", &ctx(2)).unwrap_err();
        assert!(matches!(err, ChronologyError::NotScheduled { run_at: 100, .. }));
        assert_eq!(db.list_all().unwrap().len(), 1);
    }

    #[test]
    fn due_includes_boundary_and_excludes_future() {
        let (_dir, db) = open_tmp();
        db.register(99, "a", &ctx(1)).unwrap();
        db.register(100, "b", &ctx(2)).unwrap();
        db.register(101, "c", &ctx(1)).unwrap();

        let due = db.due(100).unwrap();
        let actions: Vec<_> = due.iter().map(|j| j.action.as_str()).collect();
        assert_eq!(actions, vec!["a", "b"]);
        assert_eq!(db.list_all().unwrap().len(), 3, "due() must not remove");
    }

    #[test]
    fn take_due_removes_what_it_returns() {
        let (_dir, db) = open_tmp();
        db.register(50, "a", &ctx(1)).unwrap();
        db.register(500, "b", &ctx(1)).unwrap();

        let taken = db.take_due(100).unwrap();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].action, "a");
        assert!(db.take_due(100).unwrap().is_empty());
        assert_eq!(db.list_all().unwrap().len(), 1);
    }

    #[test]
    fn clear_subject_bulk_cancels() {
        let (_dir, db) = open_tmp();
        db.register(10, "a", &ctx(1)).unwrap();
        db.register(20, "b", &ctx(1)).unwrap();
        db.register(30, "c", &ctx(2)).unwrap();

        assert_eq!(db.clear_subject(1).unwrap(), 2);
        let remaining = db.list_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].context.subject_id, 2);
    }

    #[test]
    fn empty_db_has_nothing_due() {
        let (_dir, db) = open_tmp();
        assert!(db.due(i64::MAX).unwrap().is_empty());
        assert_eq!(db.clear_subject(1).unwrap(), 0);
    }

    #[test]
    fn registrations_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cron.db");
        {
            let db = CronDb::open(&path).unwrap();
            db.register(100, "publish_post", &ctx(4)).unwrap();
        }
        let db = CronDb::open(&path).unwrap();
        assert_eq!(db.list_for_subject(4).unwrap().len(), 1);
    }

    #[test]
    fn pre_epoch_jobs_keep_distinct_keys() {
        let (_dir, db) = open_tmp();
        db.register(-100, "publish_post", &ctx(1)).unwrap();
        db.register(-200, "publish_post", &ctx(1)).unwrap();
        db.deregister(-100, "publish_post", &ctx(1)).unwrap();

        let jobs = db.list_all().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].run_at, -200);
    }

    #[test]
    fn time_order_spans_the_epoch() {
        let (_dir, db) = open_tmp();
        db.register(50, "b", &ctx(1)).unwrap();
        db.register(-50, "a", &ctx(1)).unwrap();
        db.register(0, "z", &ctx(1)).unwrap();

        let order: Vec<i64> = db.list_all().unwrap().iter().map(|j| j.run_at).collect();
        assert_eq!(order, vec![-50, 0, 50]);
        assert_eq!(db.due(0).unwrap().len(), 2);
    }

    #[test]
    fn everything_is_due_at_the_end_of_time() {
        let (_dir, db) = open_tmp();
        db.register(i64::MAX, "last", &ctx(u64::MAX)).unwrap();
        db.register(i64::MIN, "first", &ctx(1)).unwrap();
        assert_eq!(db.due(i64::MAX).unwrap().len(), 2);
        assert!(db.due(i64::MIN).unwrap().iter().all(|j| j.action == "first"));
    }
}
