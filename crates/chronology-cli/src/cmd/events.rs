use crate::output::{print_json, print_table, print_warning};
use crate::site::Site;
use anyhow::Context;
use chronology_core::{event::parse_submission, RawEntry, SaveReport};
use clap::Subcommand;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum EventsSubcommand {
    /// List a subject's scheduled events
    List {
        id: u64,
        /// Subject type
        #[arg(long, default_value = "post")]
        kind: String,
    },
    /// Replace a subject's scheduled events with a new list
    Save {
        id: u64,
        /// Subject type
        #[arg(long, default_value = "post")]
        kind: String,
        /// Event as WHEN=ACTION, e.g. "2026-11-01 09:00=publish_post" (repeatable)
        #[arg(long = "event", value_name = "WHEN=ACTION")]
        events: Vec<String>,
        /// JSON file holding a list or map of {timestamp, action} rows
        #[arg(long)]
        file: Option<PathBuf>,
        /// Exit non-zero if any event could not be registered or deregistered
        #[arg(long)]
        strict: bool,
    },
    /// Remove every scheduled event from a subject
    Clear {
        id: u64,
        /// Subject type
        #[arg(long, default_value = "post")]
        kind: String,
        /// Exit non-zero if any event could not be deregistered
        #[arg(long)]
        strict: bool,
    },
}

pub fn run(root: &Path, subcmd: EventsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        EventsSubcommand::List { id, kind } => list(root, id, &kind, json),
        EventsSubcommand::Save {
            id,
            kind,
            events,
            file,
            strict,
        } => {
            let mut rows = match file {
                Some(path) => read_submission(&path)?,
                None => Vec::new(),
            };
            rows.extend(events.iter().map(|e| parse_event_arg(e)));
            save(root, id, &kind, rows, strict, json)
        }
        EventsSubcommand::Clear { id, kind, strict } => {
            save(root, id, &kind, Vec::new(), strict, json)
        }
    }
}

/// Split `WHEN=ACTION`. Without `=` the row has no action and will be dropped.
fn parse_event_arg(arg: &str) -> RawEntry {
    match arg.split_once('=') {
        Some((when, action)) => RawEntry::new(when.trim(), action.trim()),
        None => RawEntry {
            timestamp: Some(arg.to_string()),
            action: None,
        },
    }
}

fn read_submission(path: &Path) -> anyhow::Result<Vec<RawEntry>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&data)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Ok(parse_submission(&value)?)
}

fn list(root: &Path, id: u64, kind: &str, json: bool) -> anyhow::Result<()> {
    let site = Site::open(root)?;
    let subject = site.subject(id, kind)?;
    let label = subject.to_string();
    let mut queue = site.queue(subject);
    let actions = queue.get_actions().clone();
    let items = queue.get_items().context("failed to load events")?;

    if json {
        return print_json(items);
    }

    if items.is_empty() {
        println!("No events scheduled for {label}.");
        return Ok(());
    }

    let rows = items
        .iter()
        .map(|e| {
            vec![
                site.local(e.timestamp),
                e.timestamp.to_string(),
                e.action.clone(),
                actions
                    .get(&e.action)
                    .map(|a| a.label.clone())
                    .unwrap_or_else(|| "(unknown)".to_string()),
            ]
        })
        .collect();
    print_table(&["WHEN", "TIMESTAMP", "ACTION", "LABEL"], rows);
    Ok(())
}

fn save(
    root: &Path,
    id: u64,
    kind: &str,
    rows: Vec<RawEntry>,
    strict: bool,
    json: bool,
) -> anyhow::Result<()> {
    let site = Site::open(root)?;
    let subject = site.subject(id, kind)?;
    let label = subject.to_string();
    let mut queue = site.queue(subject);

    let report = queue.save_items(rows).context("failed to save events")?;

    if json {
        print_json(&report)?;
    } else {
        print_report(&site, &label, &report);
    }

    if strict && !report.is_clean() {
        anyhow::bail!(
            "{} event(s) could not be dispatched",
            report.register_failures.len() + report.deregister_failures.len()
        );
    }
    Ok(())
}

fn print_report(site: &Site, label: &str, report: &SaveReport) {
    println!("Saved {} event(s) for {label}.", report.persisted.len());
    for e in &report.registered {
        println!("  registered:   {} at {}", e.action, site.local(e.timestamp));
    }
    for e in &report.deregistered {
        println!("  deregistered: {} at {}", e.action, site.local(e.timestamp));
    }
    if report.dropped > 0 {
        println!("  dropped {} incomplete row(s)", report.dropped);
    }
    for f in &report.register_failures {
        print_warning(format_args!(
            "could not register {} at {}: {}",
            f.event.action,
            site.local(f.event.timestamp),
            f.reason
        ));
    }
    for f in &report.deregister_failures {
        print_warning(format_args!(
            "could not deregister {} at {}: {}",
            f.event.action,
            site.local(f.event.timestamp),
            f.reason
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_arg_splits_on_first_equals() {
        assert_eq!(
            parse_event_arg("2026-11-01 09:00 = publish_post"),
            RawEntry::new("2026-11-01 09:00", "publish_post")
        );
        assert_eq!(
            parse_event_arg("1700000000=notify=all"),
            RawEntry::new("1700000000", "notify=all")
        );
    }

    #[test]
    fn event_arg_without_action_has_none() {
        let entry = parse_event_arg("2026-11-01 09:00");
        assert_eq!(entry.timestamp.as_deref(), Some("2026-11-01 09:00"));
        assert_eq!(entry.action, None);
    }
}
