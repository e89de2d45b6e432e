use crate::output::print_json;
use anyhow::Context;
use chronology_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let support = config.subject_support();
    let kinds: Vec<&str> = support.kinds().collect();

    if json {
        return print_json(&kinds);
    }
    if kinds.is_empty() {
        println!("No subject types support scheduled events.");
    }
    for kind in kinds {
        println!("{kind}");
    }
    Ok(())
}
