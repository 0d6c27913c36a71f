/*
 * Copyright (c) 2025 Clément GRENNERAT
 *
 * This program is free software: you can redistribute it and/or modify it under the terms of the
 * GNU General Public License as published by the Free Software Foundation, version 3.
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without
 * even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
 * See the GNU General Public License for more details.
 * You should have received a copy of the GNU General Public License along with this program.
 * If not, see https://www.gnu.org/licenses/.
 *
 */

//! Input validation and normalisation. The loose wire typings (weekday
//! labels, weight-key aliases, legacy slot keys) are resolved here so every
//! later stage works on enumerated, range-checked data.

use crate::model::catalogue::{
    CoverageTable, DEFAULT_COVERAGE, HourSpan, ShiftCatalogue, ShiftCode, SlotId,
};
use crate::model::configuration::{DEFAULT_CONSEC_MAX, Rules, Weights};
use crate::model::input::{IntOrLabel, RawPerson, RosterInput};
use crate::model::person::Person;
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use log::warn;

/// Normalised night-headcount overrides. Absent fields leave the template
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrictNight {
    pub h2123: Option<u32>,
    pub h0007: Option<u32>,
    pub h1821_min: Option<u32>,
    pub h1821_max: Option<u32>,
}

/// Outcome of validation: enumerated, range-checked input plus the warning
/// trail. Downstream stages are total over this type.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedInput {
    pub year: i32,
    pub month: u32,
    pub days: u32,
    /// 0 = Sunday.
    pub weekday_of_day1: u32,
    pub catalogue: ShiftCatalogue,
    /// `covers` relation of the catalogue, computed once per solve (the
    /// default catalogue's table is computed once per process).
    pub coverage: CoverageTable,
    pub need_template: IndexMap<String, [u32; SlotId::COUNT]>,
    pub day_type_by_date: Vec<String>,
    pub strict_night: Option<StrictNight>,
    pub people: Vec<Person>,
    pub rules: Rules,
    pub weights: Weights,
    /// Night code -> indices into `people` who carry a phantom night
    /// assignment from the prior month.
    pub night_carry: Vec<(ShiftCode, Vec<usize>)>,
    pub warnings: Vec<String>,
}

impl NormalizedInput {
    /// Weekday of a 1-based date, 0 = Sunday.
    pub fn weekday_of(&self, date: u32) -> usize {
        ((self.weekday_of_day1 + date - 1) % 7) as usize
    }

    pub fn person_index(&self, id: &str) -> Option<usize> {
        self.people.iter().position(|p| p.id == id)
    }

    /// People carrying a phantom night of the given code.
    pub fn carry_for(&self, shift: ShiftCode) -> &[usize] {
        self.night_carry
            .iter()
            .find(|(s, _)| *s == shift)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }
}

use crate::roster::error::RosterError;

/// Errors of a rejected input, together with the warnings gathered before
/// rejection so the error document still carries them.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    pub errors: Vec<RosterError>,
    pub warnings: Vec<String>,
}

pub fn validate(input: &RosterInput) -> Result<NormalizedInput, ValidationFailure> {
    let mut errors: Vec<RosterError> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    let year = require_i64(input.year, "year", &mut errors);
    let month = require_i64(input.month, "month", &mut errors);
    let days = require_i64(input.days, "days", &mut errors);
    let weekday_of_day1 = require_i64(input.weekday_of_day1, "weekdayOfDay1", &mut errors);

    if input.need_template.is_none() {
        errors.push(RosterError::InvalidSchema("needTemplate".into()));
    }
    if input.day_type_by_date.is_none() {
        errors.push(RosterError::InvalidSchema("dayTypeByDate".into()));
    }
    if input.people.is_none() {
        errors.push(RosterError::InvalidSchema("people".into()));
    }

    let year = check_range(year, 1970, 2100, "year", &mut errors);
    let month = check_range(month, 1, 12, "month", &mut errors);
    let weekday_of_day1 = check_range(weekday_of_day1, 0, 6, "weekdayOfDay1", &mut errors);

    let days = match days {
        Some(d) if (0..=31).contains(&d) => {
            if d > 0 && d < 28 {
                push_warning(
                    &mut warnings,
                    format!("days = {d} is below a full month; treating as a partial horizon"),
                );
            }
            Some(d as u32)
        }
        Some(d) => {
            errors.push(RosterError::invalid_field(
                "days",
                format!("{d} is outside [0, 31]"),
            ));
            None
        }
        None => None,
    };

    // The calendar triple is only cross-checked, never trusted over the
    // explicit weekdayOfDay1.
    if let (Some(y), Some(m), Some(w)) = (year, month, weekday_of_day1) {
        if let Some(first) = NaiveDate::from_ymd_opt(y as i32, m as u32, 1) {
            let actual = first.weekday().num_days_from_sunday();
            if actual as i64 != w {
                push_warning(
                    &mut warnings,
                    format!(
                        "weekdayOfDay1 = {w} disagrees with the calendar ({y}-{m:02}-01 is weekday {actual})"
                    ),
                );
            }
        }
    }

    if let (Some(d), Some(by_date)) = (days, input.day_type_by_date.as_ref()) {
        if by_date.len() != d as usize {
            errors.push(RosterError::InconsistentDays {
                days: d,
                actual: by_date.len(),
            });
        }
    }

    let catalogue = normalize_catalogue(input, &mut errors, &mut warnings);
    let coverage = if input.shifts.is_none() {
        DEFAULT_COVERAGE.clone()
    } else {
        catalogue.coverage()
    };
    let need_template = normalize_need_template(input, &mut warnings);
    let strict_night = normalize_strict_night(input, &mut errors);
    let rules = normalize_rules(input, &mut warnings);
    let weights = normalize_weights(input, &mut warnings);
    let people = normalize_people(input, days.unwrap_or(0), &mut errors, &mut warnings);
    let night_carry = normalize_night_carry(input, &people, &mut warnings);

    if !errors.is_empty() {
        return Err(ValidationFailure { errors, warnings });
    }

    Ok(NormalizedInput {
        year: year.unwrap_or(0) as i32,
        month: month.unwrap_or(0) as u32,
        days: days.unwrap_or(0),
        weekday_of_day1: weekday_of_day1.unwrap_or(0) as u32,
        catalogue,
        coverage,
        need_template,
        day_type_by_date: input.day_type_by_date.clone().unwrap_or_default(),
        strict_night,
        people,
        rules,
        weights,
        night_carry,
        warnings,
    })
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

fn require_i64(value: Option<i64>, field: &str, errors: &mut Vec<RosterError>) -> Option<i64> {
    if value.is_none() {
        errors.push(RosterError::InvalidSchema(field.to_string()));
    }
    value
}

fn check_range(
    value: Option<i64>,
    lo: i64,
    hi: i64,
    field: &str,
    errors: &mut Vec<RosterError>,
) -> Option<i64> {
    match value {
        Some(v) if (lo..=hi).contains(&v) => Some(v),
        Some(v) => {
            errors.push(RosterError::invalid_field(
                field,
                format!("{v} is outside [{lo}, {hi}]"),
            ));
            None
        }
        None => None,
    }
}

fn normalize_catalogue(
    input: &RosterInput,
    errors: &mut Vec<RosterError>,
    warnings: &mut Vec<String>,
) -> ShiftCatalogue {
    let mut catalogue = ShiftCatalogue::default();
    let Some(shifts) = input.shifts.as_ref() else {
        push_warning(
            warnings,
            "no 'shifts' section; using the default catalogue spans".into(),
        );
        return catalogue;
    };

    let mut seen: Vec<ShiftCode> = Vec::new();
    for raw in shifts {
        let Some(code) = ShiftCode::from_code(&raw.code) else {
            errors.push(RosterError::CatalogueMismatch(format!(
                "unknown shift code '{}'",
                raw.code
            )));
            continue;
        };
        if seen.contains(&code) {
            errors.push(RosterError::CatalogueMismatch(format!(
                "shift code '{}' appears twice",
                raw.code
            )));
            continue;
        }
        seen.push(code);
        if !(0..=24).contains(&raw.start) || !(0..=24).contains(&raw.end) {
            errors.push(RosterError::invalid_field(
                "shifts",
                format!("{}: start/end must lie in [0, 24]", raw.code),
            ));
            continue;
        }
        catalogue.set_span(code, HourSpan::new(raw.start as u8, raw.end as u8));
    }
    catalogue
}

fn normalize_need_template(
    input: &RosterInput,
    warnings: &mut Vec<String>,
) -> IndexMap<String, [u32; SlotId::COUNT]> {
    let mut template = IndexMap::new();
    let Some(raw) = input.need_template.as_ref() else {
        return template;
    };

    for (day_type, row) in raw {
        let mut slots = [0u32; SlotId::COUNT];
        // Legacy combined evening key first, split keys override it.
        if let Some(&v) = row.get("18-24") {
            let v = clamp_need(v, day_type, "18-24", warnings);
            slots[SlotId::S1821.index()] = v;
            slots[SlotId::S2123.index()] = v;
            push_warning(
                warnings,
                format!("needTemplate['{day_type}']: legacy '18-24' split into '18-21' and '21-23'"),
            );
        }
        for (key, &value) in row {
            if key == "18-24" {
                continue;
            }
            match SlotId::from_key(key) {
                Some(slot) => slots[slot.index()] = clamp_need(value, day_type, key, warnings),
                None => push_warning(
                    warnings,
                    format!("needTemplate['{day_type}']: unknown slot key '{key}' ignored"),
                ),
            }
        }
        template.insert(day_type.clone(), slots);
    }
    template
}

fn clamp_need(value: i64, day_type: &str, key: &str, warnings: &mut Vec<String>) -> u32 {
    if value < 0 {
        push_warning(
            warnings,
            format!("needTemplate['{day_type}']['{key}'] = {value} clamped to 0"),
        );
        0
    } else {
        value as u32
    }
}

fn normalize_strict_night(
    input: &RosterInput,
    errors: &mut Vec<RosterError>,
) -> Option<StrictNight> {
    let raw = input.strict_night.as_ref()?;
    let mut out = StrictNight::default();
    out.h2123 = non_negative(raw.h2123, "strictNight['21-23']", errors);
    out.h0007 = non_negative(raw.h0007, "strictNight['0-7']", errors);
    out.h1821_min = non_negative(raw.h1821_min, "strictNight['18-21_min']", errors);
    out.h1821_max = non_negative(raw.h1821_max, "strictNight['18-21_max']", errors);
    if let (Some(lo), Some(hi)) = (out.h1821_min, out.h1821_max) {
        if lo > hi {
            errors.push(RosterError::invalid_field(
                "strictNight",
                format!("18-21 window is empty ({lo} > {hi})"),
            ));
        }
    }
    Some(out)
}

fn non_negative(
    value: Option<i64>,
    field: &str,
    errors: &mut Vec<RosterError>,
) -> Option<u32> {
    match value {
        Some(v) if v >= 0 => Some(v as u32),
        Some(v) => {
            errors.push(RosterError::invalid_field(field, format!("{v} is negative")));
            None
        }
        None => None,
    }
}

fn normalize_rules(input: &RosterInput, warnings: &mut Vec<String>) -> Rules {
    let mut rules = Rules::default();
    let Some(raw) = input.rules.as_ref() else {
        return rules;
    };
    if let Some(flag) = raw.no_early_after_day_a_b {
        rules.no_early_after_day_ab = flag;
    }
    if let Some(rest) = raw.night_rest.as_ref() {
        for (key, &value) in rest {
            match ShiftCode::from_code(key) {
                Some(code) if code.is_night() => {
                    let clamped = if value < 0 {
                        push_warning(
                            warnings,
                            format!("rules.nightRest['{key}'] = {value} clamped to 0"),
                        );
                        0
                    } else {
                        value as u32
                    };
                    rules.set_night_rest(code, clamped);
                }
                _ => push_warning(
                    warnings,
                    format!("rules.nightRest: '{key}' is not a night code, ignored"),
                ),
            }
        }
    }
    rules
}

fn normalize_weights(input: &RosterInput, warnings: &mut Vec<String>) -> Weights {
    let mut weights = Weights::default();
    for (key, value) in &input.weights {
        let Some(canonical) = Weights::canonical_key(key) else {
            push_warning(warnings, format!("weights: unknown key '{key}' ignored"));
            continue;
        };
        let Some(v) = value.as_i64() else {
            push_warning(
                warnings,
                format!("weights['{key}'] is not an integer, ignored"),
            );
            continue;
        };
        let v = if v < 0 {
            push_warning(warnings, format!("weights['{key}'] = {v} clamped to 0"));
            0
        } else {
            v
        };
        if let Some(field) = weights.field_mut(canonical) {
            *field = v;
        }
    }
    weights
}

fn normalize_people(
    input: &RosterInput,
    days: u32,
    errors: &mut Vec<RosterError>,
    warnings: &mut Vec<String>,
) -> Vec<Person> {
    let Some(raw_people) = input.people.as_ref() else {
        return Vec::new();
    };

    let mut people: Vec<Person> = Vec::with_capacity(raw_people.len());
    for (index, raw) in raw_people.iter().enumerate() {
        let Some(id) = raw.id.as_ref().filter(|id| !id.is_empty()) else {
            errors.push(RosterError::invalid_field(
                "people",
                format!("person #{index} has no id"),
            ));
            continue;
        };
        if people.iter().any(|p| &p.id == id) {
            errors.push(RosterError::DuplicateId(id.clone()));
            continue;
        }
        people.push(normalize_person(id, raw, days, warnings));
    }

    // Wish-offs are an alias of requestedOffDates and are unioned in.
    for (staff_id, dates) in &input.wish_offs {
        let Some(person) = people.iter_mut().find(|p| &p.id == staff_id) else {
            push_warning(
                warnings,
                format!("wishOffs: unknown staff id '{staff_id}' ignored"),
            );
            continue;
        };
        for &date in dates {
            if date < 1 || date as u32 > days || days == 0 {
                push_warning(
                    warnings,
                    format!("wishOffs['{staff_id}']: day {date} outside [1, {days}] dropped"),
                );
                continue;
            }
            let date = date as u32;
            if !person.has_requested_off(date) {
                person.requested_off_dates.push(date);
                person.requested_off_dates.sort_unstable();
            }
        }
    }
    people
}

fn normalize_person(id: &str, raw: &RawPerson, days: u32, warnings: &mut Vec<String>) -> Person {
    let mut can_work: Vec<ShiftCode> = Vec::new();
    for code in &raw.can_work {
        match ShiftCode::from_code(code) {
            Some(shift) => {
                if !can_work.contains(&shift) {
                    can_work.push(shift);
                }
            }
            None => push_warning(
                warnings,
                format!("person '{id}': unknown canWork code '{code}' dropped"),
            ),
        }
    }
    can_work.sort_by_key(|s| s.index());
    if can_work.is_empty() {
        push_warning(
            warnings,
            format!("person '{id}' has an empty canWork; no variables will be created"),
        );
    }

    let mut fixed_off = [false; 7];
    for entry in &raw.fixed_off_weekdays {
        match parse_weekday(entry) {
            Some(w) => fixed_off[w as usize] = true,
            None => push_warning(
                warnings,
                format!("person '{id}': unrecognised weekday {entry:?} dropped"),
            ),
        }
    }

    let weekly_min = clamp_limit(raw.weekly_min, id, "weeklyMin", warnings);
    let weekly_max = clamp_limit(raw.weekly_max, id, "weeklyMax", warnings);
    let monthly_min = clamp_limit(raw.monthly_min, id, "monthlyMin", warnings);
    let monthly_max = clamp_limit(raw.monthly_max, id, "monthlyMax", warnings);
    if weekly_max > 0 && weekly_min > weekly_max {
        push_warning(
            warnings,
            format!("person '{id}': weeklyMin {weekly_min} exceeds weeklyMax {weekly_max}"),
        );
    }
    if monthly_max > 0 && monthly_min > monthly_max {
        push_warning(
            warnings,
            format!("person '{id}': monthlyMin {monthly_min} exceeds monthlyMax {monthly_max}"),
        );
    }

    let consec_max = match raw.consec_max {
        None => DEFAULT_CONSEC_MAX,
        Some(v) if v > 0 => v as u32,
        Some(v) => {
            push_warning(
                warnings,
                format!("person '{id}': consecMax = {v} must be positive, using {DEFAULT_CONSEC_MAX}"),
            );
            DEFAULT_CONSEC_MAX
        }
    };

    let unavailable_dates = normalize_dates(&raw.unavailable_dates, days, id, "unavailableDates", warnings);
    let requested_off_dates =
        normalize_dates(&raw.requested_off_dates, days, id, "requestedOffDates", warnings);

    let requested_off_weight = match raw.requested_off_weight {
        Some(w) if w > 0 => Some(w),
        Some(w) if w < 0 => {
            push_warning(
                warnings,
                format!("person '{id}': requestedOffWeight = {w} dropped (must be positive)"),
            );
            None
        }
        _ => None,
    };

    Person {
        id: id.to_string(),
        can_work,
        fixed_off_weekdays: fixed_off,
        weekly_min,
        weekly_max,
        monthly_min,
        monthly_max,
        consec_max,
        unavailable_dates,
        requested_off_dates,
        requested_off_weight,
    }
}

fn clamp_limit(value: i64, id: &str, field: &str, warnings: &mut Vec<String>) -> u32 {
    if value < 0 {
        push_warning(
            warnings,
            format!("person '{id}': {field} = {value} clamped to 0 (unbounded)"),
        );
        0
    } else {
        value as u32
    }
}

fn normalize_dates(
    dates: &[i64],
    days: u32,
    id: &str,
    field: &str,
    warnings: &mut Vec<String>,
) -> Vec<u32> {
    let mut out: Vec<u32> = Vec::new();
    for &date in dates {
        if date < 1 || date > days as i64 {
            push_warning(
                warnings,
                format!("person '{id}': {field} day {date} outside [1, {days}] dropped"),
            );
            continue;
        }
        if !out.contains(&(date as u32)) {
            out.push(date as u32);
        }
    }
    out.sort_unstable();
    out
}

/// 0 = Sunday, matching the wire convention for `weekdayOfDay1`.
fn parse_weekday(entry: &IntOrLabel) -> Option<u32> {
    match entry {
        IntOrLabel::Int(v) if (0..=6).contains(v) => Some(*v as u32),
        IntOrLabel::Int(_) => None,
        IntOrLabel::Label(s) => match s.as_str() {
            "日" => Some(0),
            "月" => Some(1),
            "火" => Some(2),
            "水" => Some(3),
            "木" => Some(4),
            "金" => Some(5),
            "土" => Some(6),
            _ => None,
        },
    }
}

fn normalize_night_carry(
    input: &RosterInput,
    people: &[Person],
    warnings: &mut Vec<String>,
) -> Vec<(ShiftCode, Vec<usize>)> {
    let mut carry: Vec<(ShiftCode, Vec<usize>)> = Vec::new();
    for (code, staff_ids) in &input.previous_month_night_carry {
        let Some(shift) = ShiftCode::from_code(code).filter(|s| s.is_night()) else {
            push_warning(
                warnings,
                format!("previousMonthNightCarry: '{code}' is not a night code, ignored"),
            );
            continue;
        };
        let mut indices: Vec<usize> = Vec::new();
        for id in staff_ids {
            match people.iter().position(|p| &p.id == id) {
                Some(index) => {
                    if !indices.contains(&index) {
                        indices.push(index);
                    }
                }
                None => push_warning(
                    warnings,
                    format!("previousMonthNightCarry['{code}']: unknown staff id '{id}' ignored"),
                ),
            }
        }
        indices.sort_unstable();
        carry.push((shift, indices));
    }
    carry
}
