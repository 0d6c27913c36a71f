//! End-to-end scenarios over the full pipeline, exercising the invariants
//! the output document promises.

use crate::roster::tests::fixtures::{assignments_on, base, person, run};
use serde_json::json;

#[test]
fn empty_horizon_yields_an_empty_roster() {
    let mut value = base(0);
    value["people"] = json!([person("a", &["DA"])]);
    let doc = run(&value);

    assert!(doc.error.is_none());
    assert!(doc.infeasible.is_none());
    assert_eq!(doc.assignments.as_deref(), Some(&[][..]));
    assert_eq!(doc.matrix.as_deref(), Some(&[][..]));
    let summary = doc.summary.expect("summary present");
    assert_eq!(summary.totals.assigned, 0);
    assert_eq!(summary.totals.shortage, 0);
}

#[test]
fn trivially_feasible_single_assignment() {
    let mut value = base(1);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 1 } });
    value["people"] = json!([person("a", &["DA"])]);
    let doc = run(&value);

    assert!(doc.infeasible.is_none());
    assert_eq!(assignments_on(&doc, 1), vec![("a".to_string(), "DA".to_string())]);
    let summary = doc.summary.expect("summary present");
    assert_eq!(summary.totals.assigned, 1);
    assert_eq!(summary.totals.shortage, 0);
    assert_eq!(summary.totals.excess, 0);
}

#[test]
fn impossible_demand_becomes_shortage_not_infeasibility() {
    let mut value = base(1);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 2 } });
    value["people"] = json!([person("a", &["DA"])]);
    let doc = run(&value);

    assert!(doc.infeasible.is_none(), "shortage is soft");
    assert_eq!(doc.assignments.as_ref().map(|a| a.len()), Some(1));
    let summary = doc.summary.expect("summary present");
    assert_eq!(summary.totals.shortage, 1);
    let flags = &doc.diagnostics.flags;
    assert!(flags.availability_warning, "1 available < 2 needed");
    assert!(!flags.inconsistent_summary);
}

#[test]
fn night_rest_blocks_the_following_days() {
    let mut value = base(2);
    value["needTemplate"] = json!({
        "nightDay": { "21-23": 1 },
        "earlyDay": { "7-9": 1, "0-7": 1 },
    });
    value["dayTypeByDate"] = json!(["nightDay", "earlyDay"]);
    value["people"] = json!([person("a", &["EA", "NA"])]);
    value["rules"] = json!({ "nightRest": { "NA": 2 } });
    let doc = run(&value);

    assert_eq!(assignments_on(&doc, 1), vec![("a".to_string(), "NA".to_string())]);
    assert!(assignments_on(&doc, 2).is_empty(), "rest day after the night");
    let summary = doc.summary.expect("summary present");
    assert_eq!(summary.totals.shortage, 1, "the early slot of day 2 stays open");
    let matrix = doc.matrix.expect("matrix present");
    assert_eq!(matrix[1].shifts["a"], "");
}

#[test]
fn no_early_after_day_shift_rule() {
    let mut value = base(2);
    value["needTemplate"] = json!({
        "dayOne": { "9-15": 1, "16-18": 1 },
        "dayTwo": { "7-9": 1, "9-15": 1, "16-18": 1 },
    });
    value["dayTypeByDate"] = json!(["dayOne", "dayTwo"]);
    value["people"] = json!([person("a", &["EA", "DB"])]);
    value["rules"] = json!({ "noEarlyAfterDayAB": true });
    let doc = run(&value);

    let all: Vec<String> = doc
        .assignments
        .as_ref()
        .expect("assignments present")
        .iter()
        .map(|a| a.shift.clone())
        .collect();
    assert!(!all.contains(&"EA".to_string()), "EA is blocked after DB");
    assert_eq!(assignments_on(&doc, 1), vec![("a".to_string(), "DB".to_string())]);
    let summary = doc.summary.expect("summary present");
    assert_eq!(summary.totals.shortage, 1, "7-9 on day 2 stays open");
}

#[test]
fn wish_off_violation_is_paid_when_demand_forces_it() {
    let mut value = base(3);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 1 } });
    value["people"] = json!([
        { "id": "a", "canWork": ["DA"], "requestedOffDates": [3] },
    ]);
    value["weights"] = json!({ "w_requested_off_violation": 100 });
    let doc = run(&value);

    let summary = doc.summary.clone().expect("summary present");
    assert_eq!(summary.totals.assigned, 3);
    assert_eq!(summary.totals.wish_off_violations, 1);
    assert_eq!(summary.totals.violated_preferences, 1);
    assert_eq!(summary.totals.shortage, 0);
    assert_eq!(
        assignments_on(&doc, 3),
        vec![("a".to_string(), "DA".to_string())]
    );
}

#[test]
fn strict_night_equalities_rotate_two_night_workers() {
    let mut value = base(2);
    value["needTemplate"] = json!({ "normalDay": {} });
    value["strictNight"] = json!({ "21-23": 1 });
    value["people"] = json!([person("a", &["NA"]), person("b", &["NA"])]);
    let doc = run(&value);

    assert!(doc.infeasible.is_none());
    let day1 = assignments_on(&doc, 1);
    let day2 = assignments_on(&doc, 2);
    assert_eq!(day1.len(), 1);
    assert_eq!(day2.len(), 1);
    assert_ne!(day1[0].0, day2[0].0, "night rest forces a rotation");
}

#[test]
fn unsatisfiable_strict_night_is_reported_infeasible() {
    let mut value = base(1);
    value["strictNight"] = json!({ "21-23": 1 });
    value["people"] = json!([person("a", &["DA"])]);
    let doc = run(&value);

    assert_eq!(doc.infeasible, Some(true));
    assert!(doc.reason.is_some());
    assert!(doc.assignments.is_none());
    assert!(doc.summary.is_none());
    assert!(!doc.diagnostics.log_output.is_empty());
}

#[test]
fn previous_month_carry_blocks_the_horizon_start() {
    let mut value = base(3);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 1 } });
    value["people"] = json!([person("a", &["DA"])]);
    value["previousMonthNightCarry"] = json!({ "NA": ["a"] });
    let doc = run(&value);

    assert!(assignments_on(&doc, 1).is_empty());
    assert!(assignments_on(&doc, 2).is_empty());
    assert_eq!(assignments_on(&doc, 3).len(), 1);
    let summary = doc.summary.expect("summary present");
    assert_eq!(summary.totals.shortage, 2);
    let demand = &summary.diagnostics.demand;
    assert!(demand.per_day_totals[0].carry_applied);
}

#[test]
fn hard_offs_are_never_assigned() {
    let mut value = base(14);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 1 } });
    value["people"] = json!([
        { "id": "a", "canWork": ["DA"], "fixedOffWeekdays": [0], "unavailableDates": [4] },
    ]);
    let doc = run(&value);

    for assignment in doc.assignments.as_ref().expect("assignments present") {
        assert_ne!(assignment.date, 4);
        // June 2025: Sundays are dates 1 and 8 within two weeks.
        assert_ne!(assignment.date, 1);
        assert_ne!(assignment.date, 8);
    }
}

#[test]
fn weekly_and_monthly_caps_bound_the_workload() {
    let mut value = base(7);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 1 } });
    value["people"] = json!([
        { "id": "a", "canWork": ["DA"], "weeklyMax": 2, "monthlyMax": 3 },
    ]);
    let doc = run(&value);

    let assignments = doc.assignments.expect("assignments present");
    // Weeks are [1,1] and [2,7]: at most 1 + 2, further capped at 3 monthly.
    assert_eq!(assignments.len(), 3);
    let in_tail_week = assignments.iter().filter(|a| a.date >= 2).count();
    assert!(in_tail_week <= 2);
}

#[test]
fn consecutive_day_cap_inserts_a_break() {
    let mut value = base(4);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 1 } });
    value["people"] = json!([
        { "id": "a", "canWork": ["DA"], "consecMax": 2 },
    ]);
    let doc = run(&value);

    let assignments = doc.assignments.expect("assignments present");
    assert_eq!(assignments.len(), 3, "one of four days must stay off");
    let mut worked = [false; 5];
    for a in &assignments {
        worked[a.date as usize] = true;
    }
    for window in worked[1..].windows(3) {
        assert!(window.iter().filter(|&&w| w).count() <= 2);
    }
}

#[test]
fn matrix_mirrors_assignments_exactly() {
    let mut value = base(3);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 2, "7-9": 1 } });
    value["people"] = json!([
        person("a", &["EA", "DA"]),
        person("b", &["DA"]),
        person("c", &["EA"]),
    ]);
    let doc = run(&value);

    assert_eq!(doc.people_order, vec!["a", "b", "c"]);
    let matrix = doc.matrix.as_ref().expect("matrix present");
    let assignments = doc.assignments.as_ref().expect("assignments present");
    assert_eq!(matrix.len(), 3);
    for row in matrix {
        assert_eq!(
            row.shifts.keys().collect::<Vec<_>>(),
            vec!["a", "b", "c"],
            "rows follow peopleOrder"
        );
        for (staff, code) in &row.shifts {
            let assigned = assignments
                .iter()
                .find(|a| a.date == row.date && &a.staff_id == staff);
            match assigned {
                Some(a) => assert_eq!(&a.shift, code),
                None => assert_eq!(code, ""),
            }
        }
    }
}

#[test]
fn at_most_one_shift_per_person_day() {
    let mut value = base(5);
    value["needTemplate"] = json!({
        "normalDay": { "7-9": 1, "9-15": 2, "16-18": 1, "18-21": 1 },
    });
    value["people"] = json!([
        person("a", &["EA", "DA", "DB", "LA"]),
        person("b", &["EA", "DA", "DB", "LA"]),
    ]);
    let doc = run(&value);

    let assignments = doc.assignments.expect("assignments present");
    for date in 1..=5 {
        for id in ["a", "b"] {
            let count = assignments
                .iter()
                .filter(|a| a.date == date && a.staff_id == id)
                .count();
            assert!(count <= 1, "{id} holds {count} shifts on day {date}");
        }
    }
}

#[test]
fn balance_weight_evens_out_workloads() {
    let mut value = base(3);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 1 } });
    value["people"] = json!([person("a", &["DA"]), person("b", &["DA"]), person("c", &["DA"])]);
    value["weights"] = json!({ "w_balance_workdays": 5 });
    let doc = run(&value);

    let summary = doc.summary.expect("summary present");
    assert_eq!(summary.totals.shortage, 0);
    let mut counts = [0u32; 3];
    for a in doc.assignments.as_ref().expect("assignments present") {
        let person = match a.staff_id.as_str() {
            "a" => 0,
            "b" => 1,
            _ => 2,
        };
        counts[person] += 1;
    }
    let max = counts.iter().max().unwrap();
    let min = counts.iter().min().unwrap();
    assert_eq!(max, min, "balanced workloads: {counts:?}");
}

#[test]
fn fill_preference_outweighs_a_cheap_wish_off() {
    let mut value = base(1);
    value["people"] = json!([
        { "id": "a", "canWork": ["DA"], "requestedOffDates": [1] },
    ]);

    // Without the bonus the wish-off wins and the person stays home.
    let idle = run(&value);
    assert_eq!(idle.assignments.as_ref().map(|a| a.len()), Some(0));

    value["weights"] = json!({ "w_fill_preference": 50 });
    let filled = run(&value);
    assert_eq!(filled.assignments.as_ref().map(|a| a.len()), Some(1));
    let summary = filled.summary.expect("summary present");
    assert_eq!(summary.totals.wish_off_violations, 1);
}

#[test]
fn rerunning_the_solver_is_deterministic() {
    let mut value = base(5);
    value["needTemplate"] = json!({
        "normalDay": { "7-9": 1, "21-23": 1 },
    });
    value["people"] = json!([
        person("a", &["EA", "NB"]),
        person("b", &["EA", "NC"]),
    ]);
    let first = run(&value);
    let second = run(&value);
    assert_eq!(first.assignments, second.assignments);
    assert_eq!(first.matrix, second.matrix);
}

#[test]
fn malformed_json_is_recovered_into_an_error_document() {
    use crate::roster::driver::SolveOptions;
    use crate::roster::engine::solve_document;

    let doc = solve_document("{ not json", &SolveOptions::default());
    assert_eq!(doc.infeasible, Some(true));
    let error = doc.error.expect("error body present");
    assert_eq!(error.code, "InputParse");
}

#[test]
fn validation_failure_is_recovered_into_an_error_document() {
    let mut value = base(30);
    value["people"] = json!([person("a", &["DA"]), person("a", &["DA"])]);
    let doc = run(&value);

    assert_eq!(doc.infeasible, Some(true));
    let error = doc.error.as_ref().expect("error body present");
    assert_eq!(error.code, "DuplicateId");
    assert!(doc.reason.as_ref().is_some_and(|r| r.contains("'a'")));
    assert!(doc.assignments.is_none());
}

#[test]
fn unknown_day_type_is_recovered_into_an_error_document() {
    let mut value = base(1);
    value["dayTypeByDate"] = json!(["mystery"]);
    value["people"] = json!([person("a", &["DA"])]);
    let doc = run(&value);

    assert_eq!(doc.infeasible, Some(true));
    assert_eq!(doc.error.as_ref().map(|e| e.code.as_str()), Some("CatalogueMismatch"));
    assert_eq!(doc.people_order, vec!["a"], "normalised people survive into the error document");
}

#[test]
fn per_person_weight_overrides_the_global_default() {
    // Two candidates for one slot; only the cheap wish-off gets violated.
    let mut value = base(1);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 1 } });
    value["people"] = json!([
        { "id": "pricey", "canWork": ["DA"], "requestedOffDates": [1], "requestedOffWeight": 500 },
        { "id": "cheap", "canWork": ["DA"], "requestedOffDates": [1] },
    ]);
    let doc = run(&value);

    assert_eq!(
        assignments_on(&doc, 1),
        vec![("cheap".to_string(), "DA".to_string())]
    );
    let summary = doc.summary.expect("summary present");
    assert_eq!(summary.totals.wish_off_violations, 1);
}
