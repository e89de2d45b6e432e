use crate::output::{print_json, print_table};
use crate::site::Site;
use anyhow::Context;
use chronology_core::cron::ScheduledJob;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum CronSubcommand {
    /// List every pending job
    List {
        /// Only jobs for this subject id
        #[arg(long)]
        subject: Option<u64>,
    },
    /// List jobs whose time has come
    Due {
        /// Reference time in site-local time or epoch seconds (default: now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Fire due jobs: remove them from the timer and report each one
    Run {
        /// Reference time in site-local time or epoch seconds (default: now)
        #[arg(long)]
        at: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: CronSubcommand, json: bool) -> anyhow::Result<()> {
    let site = Site::open(root)?;
    match subcmd {
        CronSubcommand::List { subject } => {
            let jobs = match subject {
                Some(id) => site.cron.list_for_subject(id),
                None => site.cron.list_all(),
            }
            .context("failed to list jobs")?;
            print_jobs(&site, &jobs, json, "No jobs scheduled.")
        }
        CronSubcommand::Due { at } => {
            let now = site.instant(at.as_deref())?;
            let jobs = site.cron.due(now).context("failed to list due jobs")?;
            print_jobs(&site, &jobs, json, "No jobs due.")
        }
        CronSubcommand::Run { at } => {
            let now = site.instant(at.as_deref())?;
            let jobs = site.cron.take_due(now).context("failed to take due jobs")?;
            for job in &jobs {
                tracing::info!(
                    subject = job.context.subject_id,
                    action = %job.action,
                    run_at = job.run_at,
                    "fired"
                );
            }
            print_jobs(&site, &jobs, json, "Nothing to run.")
        }
    }
}

fn print_jobs(site: &Site, jobs: &[ScheduledJob], json: bool, empty: &str) -> anyhow::Result<()> {
    if json {
        return print_json(&jobs);
    }
    if jobs.is_empty() {
        println!("{empty}");
        return Ok(());
    }
    let rows = jobs
        .iter()
        .map(|j| {
            vec![
                site.local(j.run_at),
                j.context.subject_id.to_string(),
                j.action.clone(),
            ]
        })
        .collect();
    print_table(&["WHEN", "SUBJECT", "ACTION"], rows);
    Ok(())
}
