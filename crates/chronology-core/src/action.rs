//! Schedulable actions and the registry that decides which are offered for
//! a subject.
//!
//! Providers contribute [`ActionDescriptor`]s. Global providers run first,
//! then the providers registered for the subject's kind, each in registration
//! order. Results merge into one slug-keyed map where later contributions win.
//! Nothing is validated here.

use crate::subject::Subject;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// ---------------------------------------------------------------------------
// ActionDescriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub slug: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl ActionDescriptor {
    pub fn new(slug: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: label.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Actions available to one subject, keyed by slug.
///
/// Iteration is in slug order, whatever order providers contributed them in.
pub type ActionMap = BTreeMap<String, ActionDescriptor>;

// ---------------------------------------------------------------------------
// ActionProvider
// ---------------------------------------------------------------------------

/// A contributor of schedulable actions.
pub trait ActionProvider {
    fn actions(&self, subject: &Subject) -> Vec<ActionDescriptor>;
}

impl<F> ActionProvider for F
where
    F: Fn(&Subject) -> Vec<ActionDescriptor>,
{
    fn actions(&self, subject: &Subject) -> Vec<ActionDescriptor> {
        self(subject)
    }
}

/// A fixed list, as declared in configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticActions(pub Vec<ActionDescriptor>);

impl ActionProvider for StaticActions {
    fn actions(&self, _subject: &Subject) -> Vec<ActionDescriptor> {
        self.0.clone()
    }
}

// ---------------------------------------------------------------------------
// ActionRegistry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ActionRegistry {
    global: Vec<Box<dyn ActionProvider>>,
    by_kind: HashMap<String, Vec<Box<dyn ActionProvider>>>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self
            .by_kind
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        kinds.sort_unstable();
        f.debug_struct("ActionRegistry")
            .field("global", &self.global.len())
            .field("by_kind", &kinds)
            .finish()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider consulted for every subject.
    pub fn register_global(&mut self, provider: impl ActionProvider + 'static) -> &mut Self {
        self.global.push(Box::new(provider));
        self
    }

    /// Add a provider consulted only for subjects of `kind`.
    pub fn register_for_kind(
        &mut self,
        kind: impl Into<String>,
        provider: impl ActionProvider + 'static,
    ) -> &mut Self {
        self.by_kind
            .entry(kind.into())
            .or_default()
            .push(Box::new(provider));
        self
    }

    /// Compute the actions offered for `subject`.
    pub fn resolve(&self, subject: &Subject) -> ActionMap {
        let kind_providers = self
            .by_kind
            .get(&subject.kind)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let mut actions = ActionMap::new();
        for provider in self.global.iter().chain(kind_providers) {
            for descriptor in provider.actions(subject) {
                actions.insert(descriptor.slug.clone(), descriptor);
            }
        }
        tracing::debug!(subject = %subject, count = actions.len(), "resolved actions");
        actions
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
