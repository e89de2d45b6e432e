use crate::action::{ActionDescriptor, ActionRegistry, StaticActions};
use crate::error::{ChronologyError, Result};
use crate::paths;
use crate::subject::SubjectSupport;
use crate::timestamp;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SiteConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    /// Offset used to read wall-clock timestamps from editors, e.g. `+02:00`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

// ---------------------------------------------------------------------------
// ActionsConfig
// ---------------------------------------------------------------------------

/// Actions declared in configuration. Each list becomes one provider in the
/// registry: `global` for every subject, `by_kind` per subject type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionsConfig {
    #[serde(default)]
    pub global: Vec<ActionDescriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_kind: BTreeMap<String, Vec<ActionDescriptor>>,
}

fn default_actions() -> ActionsConfig {
    ActionsConfig {
        global: vec![
            ActionDescriptor::new("publish_post", "Publish")
                .with_description("Make this content available to the public"),
            ActionDescriptor::new("unpublish_post", "Unpublish")
                .with_description("Return this content to draft"),
        ],
        by_kind: BTreeMap::new(),
    }
}

fn default_subject_types() -> Vec<String> {
    vec!["post".to_string()]
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub site: SiteConfig,
    /// Subject kinds that carry an event queue.
    #[serde(default = "default_subject_types")]
    pub subject_types: Vec<String>,
    #[serde(default)]
    pub actions: ActionsConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            site: SiteConfig {
                name: site_name.into(),
                utc_offset: default_utc_offset(),
            },
            subject_types: default_subject_types(),
            actions: default_actions(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ChronologyError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset> {
        timestamp::parse_utc_offset(&self.site.utc_offset)
    }

    pub fn subject_support(&self) -> SubjectSupport {
        SubjectSupport::new(self.subject_types.iter().cloned())
    }

    /// Build a registry with one provider per configured list, global first.
    pub fn action_registry(&self) -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        if !self.actions.global.is_empty() {
            registry.register_global(StaticActions(self.actions.global.clone()));
        }
        for (kind, actions) in &self.actions.by_kind {
            registry.register_for_kind(kind.clone(), StaticActions(actions.clone()));
        }
        registry
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // 1. The site offset must parse, or every save would be rejected.
        if let Err(e) = self.utc_offset() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: e.to_string(),
            });
        }

        // 2. A site with no supported types can never hold a queue.
        if self.subject_types.is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "subject_types is empty; no subject can be scheduled".to_string(),
            });
        }

        // 3. Per-kind actions for a kind that is not supported are unreachable.
        for kind in self.actions.by_kind.keys() {
            if !self.subject_types.contains(kind) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "actions.by_kind has '{}' which is not listed in subject_types",
                        kind
                    ),
                });
            }
        }

        // 4. Descriptors with empty slugs or labels, and duplicates in one list.
        let lists = std::iter::once(("global", &self.actions.global)).chain(
            self.actions
                .by_kind
                .iter()
                .map(|(k, v)| (k.as_str(), v)),
        );
        for (scope, list) in lists {
            let mut seen = HashSet::new();
            for descriptor in list {
                if descriptor.slug.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!("action with an empty slug in '{scope}'"),
                    });
                } else if !seen.insert(descriptor.slug.as_str()) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "action '{}' is declared twice in '{scope}'; the later one wins",
                            descriptor.slug
                        ),
                    });
                }
                if descriptor.label.trim().is_empty() {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "action '{}' in '{scope}' has an empty label",
                            descriptor.slug
                        ),
                    });
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
