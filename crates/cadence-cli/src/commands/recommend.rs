use cadence_core::{Blocker, CoreError, Engine, Reason, Recommendation};
use clap::Args;
use serde_json::json;

use super::{describe_risk, print_json, SnapshotArgs};

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Minutes available right now (defaults to `defaults.available_min`)
    #[arg(long, short)]
    pub minutes: Option<i64>,
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
}

pub fn run(args: RecommendArgs) -> Result<(), Box<dyn std::error::Error>> {
    let loaded = args.snapshot.load()?;
    let minutes = args.minutes.unwrap_or(loaded.config.defaults.available_min);

    match Engine::recommend(&loaded.ctx, minutes) {
        Ok(rec) if args.snapshot.json => print_json(&rec),
        Ok(rec) => {
            print_recommendation(&rec);
            Ok(())
        }
        Err(CoreError::NoEligibleWork { blockers }) => {
            if args.snapshot.json {
                print_json(&json!({
                    "status": "no_eligible_work",
                    "available_min": minutes,
                    "blockers": blockers,
                }))
            } else {
                println!("Nothing to work on right now.");
                print_blockers(&blockers);
                Ok(())
            }
        }
        Err(e) => Err(e.into()),
    }
}

fn print_recommendation(rec: &Recommendation) {
    println!(
        "Mode: {}  ({} of {} min allocated)",
        rec.mode, rec.total_allocated_min, rec.available_min
    );
    println!();
    for slice in &rec.slices {
        println!(
            "  {:>4} min  {}  [{}]",
            slice.allocated_min, slice.title, slice.project_name
        );
        if !slice.reasons.is_empty() {
            let reasons: Vec<String> = slice.reasons.iter().map(Reason::describe).collect();
            println!("            {}", reasons.join("; "));
        }
    }
    print_blockers(&rec.blockers);
    if !rec.risks.is_empty() {
        println!();
        println!("Projects:");
        for status in &rec.risks {
            println!(
                "  {:<24} {}",
                status.aggregate.project_name,
                describe_risk(&status.risk)
            );
        }
    }
}

fn print_blockers(blockers: &[Blocker]) {
    if blockers.is_empty() {
        return;
    }
    println!();
    println!("Blocked:");
    for b in blockers {
        println!("  {:<12} {:<30} {}", b.entity_id, b.code.as_str(), b.message);
    }
}
