use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CHRONOLOGY_DIR: &str = ".chronology";
pub const META_DIR: &str = ".chronology/meta";

pub const CONFIG_FILE: &str = ".chronology/config.yaml";
pub const CRON_DB_FILE: &str = ".chronology/cron.db";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn chronology_dir(root: &Path) -> PathBuf {
    root.join(CHRONOLOGY_DIR)
}

pub fn meta_dir(root: &Path) -> PathBuf {
    root.join(META_DIR)
}

/// Metadata document for one subject: `.chronology/meta/<id>.yaml`.
pub fn subject_meta_path(root: &Path, subject_id: u64) -> PathBuf {
    meta_dir(root).join(format!("{subject_id}.yaml"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn cron_db_path(root: &Path) -> PathBuf {
    root.join(CRON_DB_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_meta_path_is_keyed_by_id() {
        let root = Path::new("/tmp/site");
        assert_eq!(
            subject_meta_path(root, 42),
            PathBuf::from("/tmp/site/.chronology/meta/42.yaml")
        );
    }

    #[test]
    fn config_and_cron_live_under_chronology_dir() {
        let root = Path::new("/srv");
        assert!(config_path(root).starts_with(chronology_dir(root)));
        assert!(cron_db_path(root).starts_with(chronology_dir(root)));
    }
}
