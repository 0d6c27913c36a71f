use crate::model::catalogue::SlotId;
use crate::roster::calendar::{carry_dawn_cover, expand};
use crate::roster::tests::fixtures::{base, parse, person};
use crate::roster::validate::validate;
use serde_json::json;

#[test]
fn copies_template_rows_per_day_type() {
    let mut value = base(3);
    value["needTemplate"] = json!({
        "normalDay": { "9-15": 2, "16-18": 1 },
        "bathDay": { "9-15": 3, "7-9": 1 },
    });
    value["dayTypeByDate"] = json!(["normalDay", "bathDay", "normalDay"]);
    let normalized = validate(&parse(&value)).expect("valid");
    let demand = expand(&normalized).expect("expands");

    assert_eq!(demand.need(1, SlotId::S0915), 2);
    assert_eq!(demand.need(2, SlotId::S0915), 3);
    assert_eq!(demand.need(2, SlotId::S0709), 1);
    assert_eq!(demand.days[0].total, 3);
    assert_eq!(demand.days[1].total, 4);
    assert_eq!(demand.total_need, 10);
    assert_eq!(demand.day_type_sample, vec!["normalDay", "bathDay", "normalDay"]);
}

#[test]
fn unknown_day_type_fails_closed() {
    let mut value = base(2);
    value["dayTypeByDate"] = json!(["normalDay", "holiday"]);
    let normalized = validate(&parse(&value)).expect("valid");
    let error = expand(&normalized).unwrap_err();
    assert_eq!(error.code(), "CatalogueMismatch");
    assert!(error.to_string().contains("holiday"));
}

#[test]
fn strict_night_overrides_evening_slots() {
    let mut value = base(3);
    value["needTemplate"] = json!({
        "normalDay": { "21-23": 0, "0-7": 0, "18-21": 3 },
    });
    value["strictNight"] = json!({
        "21-23": 1, "0-7": 1, "18-21_min": 0, "18-21_max": 2,
    });
    let normalized = validate(&parse(&value)).expect("valid");
    let demand = expand(&normalized).expect("expands");

    for date in 1..=3 {
        assert_eq!(demand.need(date, SlotId::S2123), 1);
        assert_eq!(demand.need(date, SlotId::S1821), 2, "18-21 clamped to the max");
    }
    // Date 1's dawn belongs to the prior month and keeps the template value.
    assert_eq!(demand.need(1, SlotId::S0007), 0);
    assert_eq!(demand.need(2, SlotId::S0007), 1);
    assert_eq!(demand.need(3, SlotId::S0007), 1);
    assert!(demand.days.iter().all(|d| d.carry_applied));
}

#[test]
fn legacy_18_24_key_splits_into_both_evening_slots() {
    let mut value = base(1);
    value["needTemplate"] = json!({ "normalDay": { "18-24": 2 } });
    let normalized = validate(&parse(&value)).expect("valid");
    assert!(normalized.warnings.iter().any(|w| w.contains("legacy '18-24'")));
    let demand = expand(&normalized).expect("expands");
    assert_eq!(demand.need(1, SlotId::S1821), 2);
    assert_eq!(demand.need(1, SlotId::S2123), 2);
}

#[test]
fn split_keys_override_the_legacy_key() {
    let mut value = base(1);
    value["needTemplate"] = json!({ "normalDay": { "18-24": 2, "21-23": 1 } });
    let normalized = validate(&parse(&value)).expect("valid");
    let demand = expand(&normalized).expect("expands");
    assert_eq!(demand.need(1, SlotId::S1821), 2);
    assert_eq!(demand.need(1, SlotId::S2123), 1);
}

#[test]
fn carry_counts_only_dawn_covering_nights() {
    let mut value = base(2);
    value["people"] = json!([person("a", &["NA"]), person("b", &["NB"]), person("c", &["NC"])]);
    value["previousMonthNightCarry"] = json!({ "NA": ["a"], "NC": ["c"] });
    let normalized = validate(&parse(&value)).expect("valid");
    assert_eq!(carry_dawn_cover(&normalized), 2);

    let demand = expand(&normalized).expect("expands");
    assert!(demand.days[0].carry_applied, "carry feeds date 1's dawn");
    assert!(!demand.days[1].carry_applied);
}

#[test]
fn dawn_shortfall_against_carry_warns() {
    let mut value = base(1);
    value["needTemplate"] = json!({ "normalDay": { "0-7": 2 } });
    let normalized = validate(&parse(&value)).expect("valid");
    let demand = expand(&normalized).expect("expands");
    assert!(
        demand
            .warnings
            .iter()
            .any(|w| w.contains("day 1 dawn slot needs 2"))
    );
}

#[test]
fn empty_horizon_expands_to_nothing() {
    let normalized = validate(&parse(&base(0))).expect("valid");
    let demand = expand(&normalized).expect("expands");
    assert!(demand.days.is_empty());
    assert_eq!(demand.total_need, 0);
}
