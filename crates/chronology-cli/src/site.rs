use anyhow::Context;
use chrono::FixedOffset;
use chronology_core::{
    config::Config, cron::CronDb, paths, store::FileMetaStore, timestamp, ActionRegistry,
    Queue, Subject, SubjectSupport,
};
use std::path::Path;

/// Everything a command needs to work on one site's queues.
pub struct Site {
    pub config: Config,
    pub store: FileMetaStore,
    pub cron: CronDb,
    pub registry: ActionRegistry,
    pub support: SubjectSupport,
    pub offset: FixedOffset,
}

impl Site {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let config = Config::load(root).context("failed to load config")?;
        let offset = config
            .utc_offset()
            .context("site.utc_offset in config.yaml is invalid")?;
        let cron = CronDb::open(&paths::cron_db_path(root))
            .context("failed to open cron database")?;
        Ok(Self {
            store: FileMetaStore::new(root),
            registry: config.action_registry(),
            support: config.subject_support(),
            cron,
            offset,
            config,
        })
    }

    /// Build a subject, refusing kinds the site has not enabled.
    pub fn subject(&self, id: u64, kind: &str) -> anyhow::Result<Subject> {
        let subject = Subject::new(id, kind);
        self.support.ensure(&subject)?;
        Ok(subject)
    }

    pub fn queue(&self, subject: Subject) -> Queue<'_> {
        Queue::new(subject, &self.store, &self.cron, &self.registry).with_utc_offset(self.offset)
    }

    /// Parse `--at`, defaulting to now.
    pub fn instant(&self, at: Option<&str>) -> anyhow::Result<i64> {
        match at {
            Some(raw) => Ok(timestamp::to_utc_epoch(raw, self.offset)?),
            None => Ok(chrono::Utc::now().timestamp()),
        }
    }

    pub fn local(&self, ts: i64) -> String {
        timestamp::format_local(ts, self.offset)
    }
}
