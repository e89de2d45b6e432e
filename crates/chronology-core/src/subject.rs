use crate::error::{ChronologyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// The thing a queue is attached to: an id plus its concrete type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,
    pub kind: String,
}

impl Subject {
    pub fn new(id: u64, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

// ---------------------------------------------------------------------------
// SubjectSupport
// ---------------------------------------------------------------------------

/// Subject kinds that carry an event queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectSupport {
    kinds: BTreeSet<String>,
}

impl SubjectSupport {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut support = Self::default();
        for kind in kinds {
            support.add(kind);
        }
        support
    }

    pub fn add(&mut self, kind: impl Into<String>) {
        let kind = kind.into();
        tracing::debug!(kind = %kind, "registering subject type support");
        self.kinds.insert(kind);
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    pub fn ensure(&self, subject: &Subject) -> Result<()> {
        if self.supports(&subject.kind) {
            Ok(())
        } else {
            Err(ChronologyError::UnsupportedKind(subject.kind.clone()))
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.iter().map(String::as_str)
    }
}
