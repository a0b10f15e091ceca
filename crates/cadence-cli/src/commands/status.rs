use cadence_core::Engine;

use super::{describe_risk, print_json, SnapshotArgs};

pub fn run(args: SnapshotArgs) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = args.load()?;
    let report = Engine::status(&loaded.ctx)?;

    if args.json {
        return print_json(&report);
    }
    if report.projects.is_empty() {
        println!("No active projects.");
        return Ok(());
    }

    println!("Mode: {}", report.mode);
    for status in &report.projects {
        let agg = &status.aggregate;
        println!();
        println!("{} ({})", agg.project_name, agg.project_id);
        println!(
            "  progress {:.1}%  elapsed {:.1}%  {}/{} items open",
            agg.progress_pct, agg.time_elapsed_pct, agg.open_item_count, agg.item_count
        );
        println!("  {}", describe_risk(&status.risk));
    }
    Ok(())
}
