use cadence_core::Engine;
use clap::Args;
use tracing::info;

use super::{print_json, SnapshotArgs};

#[derive(Args, Debug)]
pub struct ReplanArgs {
    /// Write the re-estimated minutes back to the snapshot file
    #[arg(long)]
    pub apply: bool,
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
}

pub fn run(args: ReplanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut loaded = args.snapshot.load()?;
    let report = Engine::replan(&loaded.ctx)?;

    if args.apply && report.changed_items_count() > 0 {
        let updated = loaded.snapshot.apply_changes(&report.changes);
        loaded.snapshot.save(&loaded.path)?;
        info!(updated, path = %loaded.path.display(), "saved re-estimated snapshot");
    }

    if args.snapshot.json {
        return print_json(&report);
    }

    for delta in &report.projects {
        let marker = if delta.level_changed() { " *" } else { "" };
        println!(
            "{:<24} {} -> {}  remaining {} -> {} min  ({} item(s) changed){marker}",
            delta.project_name,
            delta.before.level,
            delta.after.level,
            delta.before.remaining_min,
            delta.after.remaining_min,
            delta.changed_items_count,
        );
    }
    for (project, changes) in report.changes_by_project() {
        for c in changes {
            println!(
                "  {project}/{}: {} -> {} min",
                c.work_item_id, c.old_planned_min, c.new_planned_min
            );
        }
    }
    if report.changed_items_count() == 0 {
        println!("Estimates are settled; nothing to change.");
    } else if args.apply {
        println!("Saved {} change(s) to {}", report.changed_items_count(), loaded.path.display());
    }
    Ok(())
}
