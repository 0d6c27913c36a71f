//! Translates the normalised input and the expanded demand into the linear
//! decision model: one Boolean per admissible (person, date, shift), slack
//! variables for shortage / overstaff / wish-off violations, the hard
//! constraint set, and the weighted objective.

use crate::model::catalogue::{ShiftCode, SlotId};
use crate::roster::calendar::{Demand, carry_dawn_cover};
use crate::roster::validate::NormalizedInput;
use crate::solver::model::{CpModel, Var};
use indexmap::IndexMap;
use log::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarCounts {
    pub x: usize,
    pub shortage: usize,
    pub over: usize,
    pub violate_off: usize,
}

/// The decision model of one solve, with the variable registries needed to
/// read a solution back. Variables live for one solve only.
#[derive(Debug)]
pub struct RosterModel {
    pub model: CpModel,
    /// (person index, date, shift) -> assignment variable.
    pub x: IndexMap<(usize, u32, ShiftCode), Var>,
    pub shortage: IndexMap<(u32, SlotId), Var>,
    pub over: IndexMap<(u32, SlotId), Var>,
    pub violate_off: IndexMap<(usize, u32), Var>,
    pub warnings: Vec<String>,
    pub var_counts: VarCounts,
}

impl RosterModel {
    fn x_var(&self, person: usize, date: u32, shift: ShiftCode) -> Option<Var> {
        self.x.get(&(person, date, shift)).copied()
    }

    /// Assignment variables of one (person, date), catalogue order.
    fn day_vars(&self, person: usize, date: u32) -> Vec<Var> {
        ShiftCode::ALL
            .iter()
            .filter_map(|&s| self.x_var(person, date, s))
            .collect()
    }

    /// Variables whose shift covers the slot on the given date; the dawn
    /// slot pulls the night assignments of the prior date.
    fn cover_vars(&self, input: &NormalizedInput, date: u32, slot: SlotId) -> Vec<Var> {
        let mut vars: Vec<Var> = Vec::new();
        if slot.is_dawn() {
            if date == 1 {
                return vars; // carry constants only
            }
            for (person, _) in input.people.iter().enumerate() {
                for &shift in ShiftCode::ALL.iter().filter(|s| s.is_night()) {
                    if input.coverage.covers(shift, slot) {
                        if let Some(var) = self.x_var(person, date - 1, shift) {
                            vars.push(var);
                        }
                    }
                }
            }
        } else {
            for (person, _) in input.people.iter().enumerate() {
                for shift in ShiftCode::ALL {
                    if input.coverage.covers(shift, slot) {
                        if let Some(var) = self.x_var(person, date, shift) {
                            vars.push(var);
                        }
                    }
                }
            }
        }
        vars
    }
}

pub fn build(input: &NormalizedInput, demand: &Demand) -> RosterModel {
    let mut rm = RosterModel {
        model: CpModel::new(),
        x: IndexMap::new(),
        shortage: IndexMap::new(),
        over: IndexMap::new(),
        violate_off: IndexMap::new(),
        warnings: Vec::new(),
        var_counts: VarCounts::default(),
    };

    create_assignment_vars(input, &mut rm);
    add_at_most_one(input, &mut rm);
    add_coverage(input, demand, &mut rm);
    add_strict_night(input, &mut rm);
    add_weekly_caps(input, &mut rm);
    add_monthly_caps(input, &mut rm);
    add_consecutive_caps(input, &mut rm);
    add_night_rest(input, &mut rm);
    add_no_early_after_day_ab(input, &mut rm);
    add_wish_off_links(input, &mut rm);
    set_objective(input, &mut rm);

    rm.var_counts = VarCounts {
        x: rm.x.len(),
        shortage: rm.shortage.len(),
        over: rm.over.len(),
        violate_off: rm.violate_off.len(),
    };
    debug!(
        "built model: {} x, {} shortage, {} over, {} violateOff, {} constraints",
        rm.var_counts.x,
        rm.var_counts.shortage,
        rm.var_counts.over,
        rm.var_counts.violate_off,
        rm.model.num_constraints()
    );
    rm
}

/// Variables exist only for eligible shifts on dates the person can work
/// at all; hard unavailability is an absent variable, not a zeroed one.
/// Creation runs date-major (people in declaration order within a date) so
/// the backend's creation-order branching walks the month chronologically.
fn create_assignment_vars(input: &NormalizedInput, rm: &mut RosterModel) {
    for date in 1..=input.days {
        let weekday = input.weekday_of(date);
        for (person, p) in input.people.iter().enumerate() {
            if p.is_hard_off(date, weekday) {
                continue;
            }
            for &shift in &p.can_work {
                let var = rm.model.new_bool();
                rm.x.insert((person, date, shift), var);
            }
        }
    }
}

fn add_at_most_one(input: &NormalizedInput, rm: &mut RosterModel) {
    for person in 0..input.people.len() {
        for date in 1..=input.days {
            let vars = rm.day_vars(person, date);
            if vars.len() >= 2 {
                rm.model
                    .add_linear_leq(vars.into_iter().map(|v| (1, v)).collect(), 1);
            }
        }
    }
}

/// Soft demand coverage and the overstaff cap. Date 1's dawn slot is
/// served by the prior-month carry as a constant folded into the bounds.
fn add_coverage(input: &NormalizedInput, demand: &Demand, rm: &mut RosterModel) {
    let carry = carry_dawn_cover(input) as i64;
    for day in &demand.days {
        for slot in SlotId::ALL {
            let need = day.slots[slot.index()] as i64;
            let vars = rm.cover_vars(input, day.date, slot);
            let constant = if slot.is_dawn() && day.date == 1 { carry } else { 0 };

            if need > 0 {
                let shortage = rm.model.new_int_var(0, need);
                rm.shortage.insert((day.date, slot), shortage);
                let mut terms: Vec<(i64, Var)> = vars.iter().map(|&v| (1, v)).collect();
                terms.push((1, shortage));
                rm.model.add_linear_geq(terms, need - constant);
            }

            if !vars.is_empty() || constant > 0 {
                // over = max(0, cover - need - 1), exact regardless of the
                // overstaff weight.
                let cover_hi = vars.len() as i64 + constant;
                let raw = rm.model.new_int_var(constant - need - 1, cover_hi - need - 1);
                let mut terms: Vec<(i64, Var)> = vars.iter().map(|&v| (1, v)).collect();
                terms.push((-1, raw));
                rm.model.add_linear_eq(terms, need + 1 - constant);

                let over = rm.model.new_int_var(0, (cover_hi - need - 1).max(0));
                rm.model.add_max_equality(over, vec![raw], 0);
                rm.over.insert((day.date, slot), over);
            }
        }
    }
}

/// Hard night-headcount equalities and the 18-21 window.
fn add_strict_night(input: &NormalizedInput, rm: &mut RosterModel) {
    let Some(sn) = input.strict_night.as_ref() else {
        return;
    };

    for date in 1..=input.days {
        if let Some(v) = sn.h2123 {
            let terms: Vec<(i64, Var)> = rm
                .cover_vars(input, date, SlotId::S2123)
                .into_iter()
                .map(|var| (1, var))
                .collect();
            rm.model.add_linear_eq(terms, v as i64);
        }
        // The dawn equality of date d binds the night headcount of d-1;
        // date 1's dawn is fixed by the carry and stays unconstrained.
        if date >= 2 {
            if let Some(v) = sn.h0007 {
                let terms: Vec<(i64, Var)> = rm
                    .cover_vars(input, date, SlotId::S0007)
                    .into_iter()
                    .map(|var| (1, var))
                    .collect();
                rm.model.add_linear_eq(terms, v as i64);
            }
        }
        if sn.h1821_min.is_some() || sn.h1821_max.is_some() {
            let terms: Vec<(i64, Var)> = rm
                .cover_vars(input, date, SlotId::S1821)
                .into_iter()
                .map(|var| (1, var))
                .collect();
            match (sn.h1821_min, sn.h1821_max) {
                (Some(lo), Some(hi)) => rm.model.add_linear_range(terms, lo as i64, hi as i64),
                (Some(lo), None) => rm.model.add_linear_geq(terms, lo as i64),
                (None, Some(hi)) => rm.model.add_linear_leq(terms, hi as i64),
                (None, None) => {}
            }
        }
    }
}

/// Dates grouped into ISO weeks (Monday starts a new one) intersected with
/// the horizon. No proration: the caps apply unchanged to partial weeks.
fn horizon_weeks(input: &NormalizedInput) -> Vec<(u32, u32)> {
    let mut weeks: Vec<(u32, u32)> = Vec::new();
    for date in 1..=input.days {
        let monday = input.weekday_of(date) == 1;
        match weeks.last_mut() {
            Some((_, end)) if !monday => *end = date,
            _ => weeks.push((date, date)),
        }
    }
    weeks
}

fn add_weekly_caps(input: &NormalizedInput, rm: &mut RosterModel) {
    let weeks = horizon_weeks(input);
    let any_weekly_cap = input
        .people
        .iter()
        .any(|p| p.weekly_min > 0 || p.weekly_max > 0);

    for &(start, end) in &weeks {
        if any_weekly_cap && end - start + 1 < 7 {
            rm.warnings.push(format!(
                "week {start}..{end} is partial ({} days); weekly caps apply to the intersection",
                end - start + 1
            ));
        }
        for (person, p) in input.people.iter().enumerate() {
            if p.weekly_min == 0 && p.weekly_max == 0 {
                continue;
            }
            let terms: Vec<(i64, Var)> = (start..=end)
                .flat_map(|date| rm.day_vars(person, date))
                .map(|v| (1, v))
                .collect();
            if p.weekly_max > 0 {
                rm.model.add_linear_leq(terms.clone(), p.weekly_max as i64);
            }
            if p.weekly_min > 0 {
                rm.model.add_linear_geq(terms, p.weekly_min as i64);
            }
        }
    }
}

fn add_monthly_caps(input: &NormalizedInput, rm: &mut RosterModel) {
    for (person, p) in input.people.iter().enumerate() {
        if p.monthly_min == 0 && p.monthly_max == 0 {
            continue;
        }
        let terms: Vec<(i64, Var)> = (1..=input.days)
            .flat_map(|date| rm.day_vars(person, date))
            .map(|v| (1, v))
            .collect();
        if p.monthly_max > 0 {
            rm.model.add_linear_leq(terms.clone(), p.monthly_max as i64);
        }
        if p.monthly_min > 0 {
            rm.model.add_linear_geq(terms, p.monthly_min as i64);
        }
    }
}

/// In any window of consecMax + 1 contiguous dates, at most consecMax
/// working days.
fn add_consecutive_caps(input: &NormalizedInput, rm: &mut RosterModel) {
    for (person, p) in input.people.iter().enumerate() {
        let window = p.consec_max + 1;
        if input.days < window {
            continue;
        }
        for start in 1..=(input.days - window + 1) {
            let terms: Vec<(i64, Var)> = (start..start + window)
                .flat_map(|date| rm.day_vars(person, date))
                .map(|v| (1, v))
                .collect();
            if terms.len() as u32 > p.consec_max {
                rm.model.add_linear_leq(terms, p.consec_max as i64);
            }
        }
    }
}

/// A night shift blocks the following rest days; carried-over nights from
/// the prior month act as phantom assignments on date 0.
fn add_night_rest(input: &NormalizedInput, rm: &mut RosterModel) {
    for (person, p) in input.people.iter().enumerate() {
        for &night in p.can_work.iter().filter(|s| s.is_night()) {
            let rest = input.rules.night_rest_for(night);
            for date in 1..=input.days {
                let Some(night_var) = rm.x_var(person, date, night) else {
                    continue;
                };
                for k in 1..=rest {
                    let follow = date + k;
                    if follow > input.days {
                        break;
                    }
                    let follow_vars = rm.day_vars(person, follow);
                    if follow_vars.is_empty() {
                        continue;
                    }
                    let mut terms: Vec<(i64, Var)> = vec![(1, night_var)];
                    terms.extend(follow_vars.into_iter().map(|v| (1, v)));
                    rm.model.add_linear_leq(terms, 1);
                }
            }
        }
    }

    for (night, persons) in &input.night_carry {
        let rest = input.rules.night_rest_for(*night);
        for &person in persons {
            for date in 1..=rest.min(input.days) {
                let vars = rm.day_vars(person, date);
                if !vars.is_empty() {
                    rm.model
                        .add_linear_eq(vars.into_iter().map(|v| (1, v)).collect(), 0);
                }
            }
        }
    }
}

fn add_no_early_after_day_ab(input: &NormalizedInput, rm: &mut RosterModel) {
    if !input.rules.no_early_after_day_ab {
        return;
    }
    for person in 0..input.people.len() {
        for date in 1..input.days {
            let Some(early) = rm.x_var(person, date + 1, ShiftCode::EA) else {
                continue;
            };
            let mut terms: Vec<(i64, Var)> = Vec::new();
            for day_shift in [ShiftCode::DA, ShiftCode::DB] {
                if let Some(var) = rm.x_var(person, date, day_shift) {
                    terms.push((1, var));
                }
            }
            if terms.is_empty() {
                continue;
            }
            terms.push((1, early));
            rm.model.add_linear_leq(terms, 1);
        }
    }
}

/// violateOff[p,d] equals the day's assignment sum on every requested-off
/// date, which the at-most-one constraint keeps in {0, 1}.
fn add_wish_off_links(input: &NormalizedInput, rm: &mut RosterModel) {
    for (person, p) in input.people.iter().enumerate() {
        for &date in &p.requested_off_dates {
            let violate = rm.model.new_bool();
            rm.violate_off.insert((person, date), violate);
            let mut terms: Vec<(i64, Var)> = rm
                .day_vars(person, date)
                .into_iter()
                .map(|v| (1, v))
                .collect();
            terms.push((-1, violate));
            rm.model.add_linear_eq(terms, 0);
        }
    }
}

fn set_objective(input: &NormalizedInput, rm: &mut RosterModel) {
    let weights = &input.weights;
    let mut terms: Vec<(i64, Var)> = Vec::new();
    for (_, &var) in &rm.shortage {
        terms.push((weights.shortage, var));
    }
    for (_, &var) in &rm.over {
        terms.push((weights.overstaff_gt_need_plus1, var));
    }
    for (&(person, _), &var) in &rm.violate_off {
        let weight = input.people[person]
            .requested_off_weight
            .unwrap_or(weights.requested_off_violation);
        terms.push((weight, var));
    }
    add_balance_terms(input, rm, &mut terms);
    add_fill_terms(input, rm, &mut terms);
    rm.model.minimize(terms);
}

/// Reserved balance term: penalises the spread between the busiest and
/// the least busy person. Off at weight 0.
fn add_balance_terms(input: &NormalizedInput, rm: &mut RosterModel, terms: &mut Vec<(i64, Var)>) {
    let weight = input.weights.balance_workdays;
    if weight <= 0 || input.days == 0 {
        return;
    }

    let mut totals: Vec<Var> = Vec::new();
    for person in 0..input.people.len() {
        let day_terms: Vec<(i64, Var)> = (1..=input.days)
            .flat_map(|date| rm.day_vars(person, date))
            .map(|v| (1, v))
            .collect();
        if day_terms.is_empty() {
            continue;
        }
        let total = rm.model.new_int_var(0, day_terms.len() as i64);
        let mut eq = day_terms;
        eq.push((-1, total));
        rm.model.add_linear_eq(eq, 0);
        totals.push(total);
    }
    if totals.len() < 2 {
        return;
    }

    // busiest >= every total >= lightest; the objective squeezes them onto
    // the actual max and min.
    let busiest = rm.model.new_int_var(0, input.days as i64);
    let lightest = rm.model.new_int_var(0, input.days as i64);
    for &total in &totals {
        rm.model.add_linear_leq(vec![(1, total), (-1, busiest)], 0);
        rm.model.add_linear_geq(vec![(1, total), (-1, lightest)], 0);
    }
    terms.push((weight, busiest));
    terms.push((-weight, lightest));
}

/// Reserved fill bonus: rewards every assignment covering a morning slot.
/// Off at weight 0.
fn add_fill_terms(input: &NormalizedInput, rm: &RosterModel, terms: &mut Vec<(i64, Var)>) {
    let weight = input.weights.fill_preference;
    if weight <= 0 {
        return;
    }
    for (&(_, _, shift), &var) in &rm.x {
        for slot in [SlotId::S0709, SlotId::S0915] {
            if input.coverage.covers(shift, slot) {
                terms.push((-weight, var));
            }
        }
    }
}
