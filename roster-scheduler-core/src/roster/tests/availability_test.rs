use crate::model::catalogue::SlotId;
use crate::roster::availability::analyze;
use crate::roster::calendar::expand;
use crate::roster::tests::fixtures::{base, parse, person};
use crate::roster::validate::validate;
use serde_json::json;

#[test]
fn counts_people_with_a_covering_shift() {
    let mut value = base(1);
    value["people"] = json!([
        person("early", &["EA"]),
        person("day", &["DA"]),
        person("late", &["LA"]),
    ]);
    let normalized = validate(&parse(&value)).expect("valid");
    let demand = expand(&normalized).expect("expands");
    let availability = analyze(&normalized, &demand);

    let day1 = &availability.counts[0];
    assert_eq!(day1[SlotId::S0709.index()], 1); // EA only
    assert_eq!(day1[SlotId::S0915.index()], 2); // EA + DA
    assert_eq!(day1[SlotId::S1618.index()], 1); // LA only
    assert_eq!(day1[SlotId::S2123.index()], 0);
}

#[test]
fn honours_fixed_off_weekdays_and_unavailable_dates() {
    let mut value = base(2);
    value["people"] = json!([
        // June 1st 2025 is a Sunday; weekday 0 knocks out date 1.
        { "id": "a", "canWork": ["DA"], "fixedOffWeekdays": [0] },
        { "id": "b", "canWork": ["DA"], "unavailableDates": [2] },
    ]);
    let normalized = validate(&parse(&value)).expect("valid");
    let demand = expand(&normalized).expect("expands");
    let availability = analyze(&normalized, &demand);

    assert_eq!(availability.counts[0][SlotId::S0915.index()], 1);
    assert_eq!(availability.counts[1][SlotId::S0915.index()], 1);
}

#[test]
fn dawn_availability_uses_prior_date_and_carry() {
    let mut value = base(2);
    value["people"] = json!([
        person("n1", &["NA"]),
        { "id": "n2", "canWork": ["NB"], "unavailableDates": [1] },
        person("d", &["DA"]),
    ]);
    value["previousMonthNightCarry"] = json!({ "NA": ["n1"] });
    let normalized = validate(&parse(&value)).expect("valid");
    let demand = expand(&normalized).expect("expands");
    let availability = analyze(&normalized, &demand);

    // Date 1's dawn can only be served by the carry set.
    assert_eq!(availability.counts[0][SlotId::S0007.index()], 1);
    // Date 2's dawn is served by nights of date 1; n2 is out that day.
    assert_eq!(availability.counts[1][SlotId::S0007.index()], 1);
}

#[test]
fn short_slots_are_reported_not_enforced() {
    let mut value = base(1);
    value["needTemplate"] = json!({ "normalDay": { "9-15": 3, "16-18": 1 } });
    value["people"] = json!([person("a", &["DA"])]);
    let normalized = validate(&parse(&value)).expect("valid");
    let demand = expand(&normalized).expect("expands");
    let availability = analyze(&normalized, &demand);

    assert!(availability.has_warnings());
    assert_eq!(availability.warnings.len(), 2);
    let first = &availability.warnings[0];
    assert_eq!((first.date, first.slot, first.need, first.available), (1, SlotId::S0915, 3, 1));
    let second = &availability.warnings[1];
    assert_eq!((second.date, second.slot, second.need, second.available), (1, SlotId::S1618, 1, 0));
}
