//! Integration tests for the recommend, status and replan workflows.
//!
//! Snapshots are built from JSON documents the way the CLI reads them, then
//! driven through the public engine API.

use cadence_core::{
    BlockerCode, CoreError, Engine, Mode, PlanningContext, RiskLevel, Snapshot, SnapshotSource,
    ValidationError,
};
use chrono::{DateTime, Utc};
use indoc::indoc;

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn snapshot(json: &str) -> Snapshot {
    serde_json::from_str(json).unwrap()
}

fn capture(snap: &Snapshot, now: &str) -> PlanningContext {
    PlanningContext::capture(snap, at(now)).unwrap()
}

const GATED: &str = indoc! {r#"
    {
      "projects": [
        { "id": "essay", "name": "Essay", "start_date": "2026-10-01" }
      ],
      "work_items": [
        {
          "id": "draft", "project_id": "essay", "node_id": "n1", "title": "Draft",
          "planned_min": 120, "min_session_min": 15, "max_session_min": 60,
          "preferred_session_min": 30
        },
        {
          "id": "review", "project_id": "essay", "node_id": "n1", "title": "Review",
          "planned_min": 60, "min_session_min": 15, "max_session_min": 60,
          "preferred_session_min": 30, "depends_on": ["draft"]
        },
        {
          "id": "submit", "project_id": "essay", "node_id": "n2", "title": "Submit",
          "planned_min": 30, "min_session_min": 15, "max_session_min": 30,
          "preferred_session_min": 30, "depends_on": ["draft"],
          "not_before": "2026-10-20"
        }
      ]
    }
"#};

#[test]
fn test_gated_items_report_first_blocker() {
    let snap = snapshot(GATED);
    let rec = Engine::recommend(&capture(&snap, "2026-10-16T08:00:00Z"), 60).unwrap();

    assert_eq!(rec.slices.len(), 1);
    assert_eq!(rec.slices[0].work_item_id, "draft");
    assert_eq!(rec.slices[0].allocated_min, 60);

    let code = |id: &str| {
        rec.blockers
            .iter()
            .find(|b| b.entity_id == id)
            .map(|b| b.code)
    };
    assert_eq!(code("review"), Some(BlockerCode::Dependency));
    // not_before outranks the unmet dependency
    assert_eq!(code("submit"), Some(BlockerCode::NotBefore));
}

#[test]
fn test_recommendation_serializes_snake_case() {
    let snap = snapshot(GATED);
    let rec = Engine::recommend(&capture(&snap, "2026-10-16T08:00:00Z"), 60).unwrap();
    let json = serde_json::to_value(&rec).unwrap();

    assert_eq!(json["mode"], "balanced");
    assert_eq!(json["total_allocated_min"], 60);
    let codes: Vec<&str> = json["blockers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["code"].as_str().unwrap())
        .collect();
    assert!(codes.contains(&"not_before"));
    assert!(codes.contains(&"dependency"));
    assert_eq!(json["risks"][0]["risk"]["level"], "on_track");
}

#[test]
fn test_zero_minutes_is_informational() {
    let snap = snapshot(GATED);
    let err = Engine::recommend(&capture(&snap, "2026-10-16T08:00:00Z"), 0).unwrap_err();
    assert!(err.is_informational());
    let CoreError::NoEligibleWork { blockers } = err else {
        panic!("expected NoEligibleWork");
    };
    let draft = blockers.iter().find(|b| b.entity_id == "draft").unwrap();
    assert_eq!(draft.code, BlockerCode::SessionMinExceedsAvailable);
}

#[test]
fn test_recent_pace_relieves_pressure() {
    // 1000 min left, 9.67 days to go, 15% buffer: about 119 min/day needed
    let base = indoc! {r#"
        {
          "projects": [
            { "id": "p", "name": "Course", "start_date": "2026-10-15",
              "target_date": "2026-10-25" }
          ],
          "work_items": [
            {
              "id": "w", "project_id": "p", "node_id": "n", "title": "Lectures",
              "status": "in_progress", "planned_min": 1900, "logged_min": 900,
              "min_session_min": 15, "max_session_min": 90,
              "preferred_session_min": 45
            }
          ]
        }
    "#};
    let now = "2026-10-16T08:00:00Z";

    let idle = snapshot(base);
    let status = Engine::status(&capture(&idle, now)).unwrap();
    assert_eq!(status.projects[0].risk.level, RiskLevel::AtRisk);
    assert_eq!(status.projects[0].risk.remaining_min, 1000);

    let mut busy = snapshot(base);
    busy.sessions = serde_json::from_str(indoc! {r#"
        [
          { "work_item_id": "w", "project_id": "p",
            "started_at": "2026-10-15T09:00:00Z", "minutes": 900 }
        ]
    "#})
    .unwrap();
    let status = Engine::status(&capture(&busy, now)).unwrap();
    assert_eq!(status.projects[0].risk.level, RiskLevel::OnTrack);
}

#[test]
fn test_overdelivered_progress_is_not_clamped() {
    let snap = snapshot(indoc! {r#"
        {
          "projects": [
            { "id": "p", "name": "Reading", "start_date": "2026-10-01" }
          ],
          "work_items": [
            {
              "id": "ch1", "project_id": "p", "node_id": "n", "title": "Chapter 1",
              "status": "done", "planned_min": 60, "logged_min": 90,
              "min_session_min": 15, "max_session_min": 60,
              "preferred_session_min": 30
            }
          ]
        }
    "#});
    let status = Engine::status(&capture(&snap, "2026-10-16T08:00:00Z")).unwrap();
    let project = &status.projects[0];
    assert_eq!(project.aggregate.progress_pct, 150.0);
    assert_eq!(project.risk.level, RiskLevel::OnTrack);
    assert_eq!(project.risk.remaining_min, 0);
}

#[test]
fn test_critical_project_takes_all_time() {
    let snap = snapshot(indoc! {r#"
        {
          "projects": [
            { "id": "exam", "name": "Exam", "start_date": "2026-10-01",
              "target_date": "2026-10-17" },
            { "id": "hobby", "name": "Hobby", "start_date": "2026-10-01" }
          ],
          "work_items": [
            {
              "id": "revise", "project_id": "exam", "node_id": "n", "title": "Revise",
              "planned_min": 600, "min_session_min": 25, "max_session_min": 90,
              "preferred_session_min": 50
            },
            {
              "id": "sketch", "project_id": "hobby", "node_id": "n", "title": "Sketch",
              "planned_min": 120, "min_session_min": 15, "max_session_min": 60,
              "preferred_session_min": 30
            }
          ]
        }
    "#});
    let ctx = capture(&snap, "2026-10-16T08:00:00Z");
    let rec = Engine::recommend(&ctx, 120).unwrap();

    assert_eq!(rec.mode, Mode::Critical);
    assert_eq!(rec.slices.len(), 1);
    assert_eq!(rec.slices[0].work_item_id, "revise");
    assert_eq!(rec.slices[0].allocated_min, 90);
    assert_eq!(rec.unallocated_min, 30);
    assert_eq!(rec.blockers.len(), 1);
    assert_eq!(rec.blockers[0].code, BlockerCode::NotInCriticalScope);

    let status = Engine::status(&ctx).unwrap();
    assert_eq!(status.mode, Mode::Critical);
}

#[test]
fn test_repeated_replan_converges_then_settles() {
    let mut snap = snapshot(indoc! {r#"
        {
          "projects": [
            { "id": "p", "name": "Textbook", "start_date": "2026-10-01",
              "target_date": "2026-12-31" }
          ],
          "work_items": [
            {
              "id": "problems", "project_id": "p", "node_id": "n",
              "title": "Problem sets", "status": "in_progress",
              "planned_min": 100, "logged_min": 60,
              "min_session_min": 15, "max_session_min": 60,
              "preferred_session_min": 30,
              "units_total": 10, "units_done": 3
            }
          ]
        }
    "#});
    let now = "2026-10-16T08:00:00Z";

    let mut history = Vec::new();
    loop {
        let report = Engine::replan(&capture(&snap, now)).unwrap();
        if report.changed_items_count() == 0 {
            assert!(report.projects.iter().all(|d| d.before == d.after));
            break;
        }
        assert_eq!(report.projects[0].changed_items_count, 1);
        assert!(report.projects[0].after.remaining_min > report.projects[0].before.remaining_min);
        snap.apply_changes(&report.changes);
        history.push(snap.list_work_items().unwrap()[0].planned_min);
        assert!(history.len() < 100, "replan did not settle: {history:?}");
    }

    assert_eq!(&history[..2], &[130, 151]);
    assert_eq!(history.last(), Some(&200));
}

#[test]
fn test_replan_ignores_archived_projects() {
    let snap = snapshot(indoc! {r#"
        {
          "projects": [
            { "id": "live", "name": "Live", "start_date": "2026-10-01" },
            { "id": "old", "name": "Old", "start_date": "2026-01-01", "archived": true }
          ],
          "work_items": [
            {
              "id": "stale", "project_id": "old", "node_id": "n", "title": "Stale",
              "planned_min": 100, "logged_min": 60,
              "min_session_min": 15, "max_session_min": 60,
              "preferred_session_min": 30,
              "units_total": 10, "units_done": 3
            }
          ]
        }
    "#});
    let report = Engine::replan(&capture(&snap, "2026-10-16T08:00:00Z")).unwrap();
    assert_eq!(report.changed_items_count(), 0);
    assert_eq!(report.projects.len(), 1);
    assert_eq!(report.projects[0].project_id, "live");
}

#[test]
fn test_oversized_session_is_rejected_at_capture() {
    let snap = snapshot(indoc! {r#"
        {
          "projects": [
            { "id": "essay", "name": "Essay", "start_date": "2026-10-01" }
          ],
          "work_items": [
            {
              "id": "draft", "project_id": "essay", "node_id": "n1", "title": "Draft",
              "planned_min": 120, "min_session_min": 15, "max_session_min": 60,
              "preferred_session_min": 30
            }
          ],
          "sessions": [
            {
              "work_item_id": "draft", "project_id": "essay",
              "started_at": "2026-10-15T09:00:00Z", "minutes": 9223372036854775807
            }
          ]
        }
    "#});
    let err = PlanningContext::capture(&snap, at("2026-10-16T08:00:00Z")).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::SessionLength { ref work_item_id, .. })
            if work_item_id == "draft"
    ));
}
