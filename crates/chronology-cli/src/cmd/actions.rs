use crate::output::{print_json, print_table};
use crate::site::Site;
use std::path::Path;

pub fn run(root: &Path, id: u64, kind: &str, json: bool) -> anyhow::Result<()> {
    let site = Site::open(root)?;
    let subject = site.subject(id, kind)?;
    let label = subject.to_string();
    let mut queue = site.queue(subject);
    let actions = queue.get_actions();

    if json {
        let list: Vec<_> = actions.values().collect();
        return print_json(&list);
    }

    if actions.is_empty() {
        println!("No actions can be scheduled for {label}.");
        return Ok(());
    }

    let rows = actions
        .values()
        .map(|a| vec![a.slug.clone(), a.label.clone(), a.description.clone()])
        .collect();
    print_table(&["SLUG", "LABEL", "DESCRIPTION"], rows);
    Ok(())
}
