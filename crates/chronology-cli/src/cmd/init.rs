use anyhow::Context;
use chronology_core::{config::Config, io, paths, timestamp};
use std::path::Path;

pub fn run(root: &Path, name: Option<&str>, utc_offset: Option<&str>) -> anyhow::Result<()> {
    let site_name = match name {
        Some(n) => n.to_string(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "site".to_string()),
    };
    if let Some(offset) = utc_offset {
        timestamp::parse_utc_offset(offset)?;
    }

    println!("Initializing chronology in: {}", root.display());

    for dir in [paths::CHRONOLOGY_DIR, paths::META_DIR] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        let mut cfg = Config::new(site_name);
        if let Some(offset) = utc_offset {
            cfg.site.utc_offset = offset.to_string();
        }
        cfg.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    Ok(())
}
