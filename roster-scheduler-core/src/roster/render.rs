//! Builds the output document: assignments, the per-date matrix in stable
//! people order, summary totals with their cross-check, and the
//! diagnostics block.

use crate::model::catalogue::SlotId;
use crate::model::output::{
    Assignment, AvailabilityWarningOut, DemandDiagnostics, Diagnostics, ErrorBody, Flags,
    MatrixRow, OutputDocument, PerDayTotal, Summary, SummaryDiagnostics, Totals, VarCountsOut,
};
use crate::roster::availability::Availability;
use crate::roster::builder::RosterModel;
use crate::roster::calendar::{Demand, carry_dawn_cover};
use crate::roster::driver::SolveReport;
use crate::roster::error::RosterError;
use crate::roster::validate::NormalizedInput;
use crate::solver::search::SolveStatus;
use indexmap::IndexMap;
use log::warn;

pub fn render_solved(
    input: &NormalizedInput,
    demand: &Demand,
    availability: &Availability,
    rm: &RosterModel,
    report: &SolveReport,
) -> OutputDocument {
    let values = report
        .values
        .as_ref()
        .expect("render_solved requires a solution");

    let mut assignments: Vec<Assignment> = Vec::new();
    for (&(person, date, shift), &var) in &rm.x {
        if values[var.index()] == 1 {
            assignments.push(Assignment {
                date,
                staff_id: input.people[person].id.clone(),
                shift: shift.code().to_string(),
            });
        }
    }
    assignments.sort_by_key(|a| a.date);

    let mut matrix: Vec<MatrixRow> = Vec::with_capacity(input.days as usize);
    for date in 1..=input.days {
        let mut shifts: IndexMap<String, String> = IndexMap::new();
        for (person, p) in input.people.iter().enumerate() {
            let code = rm
                .x
                .iter()
                .find(|&(&(pi, d, _), &var)| {
                    pi == person && d == date && values[var.index()] == 1
                })
                .map(|((_, _, s), _)| s.code().to_string())
                .unwrap_or_default();
            shifts.insert(p.id.clone(), code);
        }
        matrix.push(MatrixRow { date, shifts });
    }

    let shortage_total: u64 = rm
        .shortage
        .values()
        .map(|&v| values[v.index()] as u64)
        .sum();
    let excess_total: u64 = rm.over.values().map(|&v| values[v.index()] as u64).sum();
    let wish_off_total: u64 = rm
        .violate_off
        .values()
        .map(|&v| values[v.index()] as u64)
        .sum();

    let inconsistent = shortage_total != recompute_shortage(input, demand, rm, values);
    if inconsistent {
        warn!("summary totals disagree with the recomputed coverage");
    }

    let totals = Totals {
        assigned: assignments.len() as u64,
        shortage: shortage_total,
        excess: excess_total,
        wish_off_violations: wish_off_total,
        violated_preferences: wish_off_total,
    };

    let mut diagnostics = base_diagnostics(input, availability, rm, &report.log_output);
    diagnostics.flags.inconsistent_summary = inconsistent;
    if inconsistent {
        diagnostics
            .warnings
            .push("summary shortage disagrees with recomputed coverage".to_string());
    }

    OutputDocument {
        people_order: people_order(input),
        assignments: Some(assignments),
        matrix: Some(matrix),
        summary: Some(Summary {
            totals,
            diagnostics: SummaryDiagnostics {
                demand: demand_diagnostics(input, demand),
            },
        }),
        diagnostics,
        infeasible: None,
        reason: None,
        error: None,
    }
}

/// Document for a solve that produced no roster (proved infeasible or ran
/// out of time empty-handed).
pub fn render_unsolved(
    input: &NormalizedInput,
    demand: &Demand,
    availability: &Availability,
    rm: &RosterModel,
    report: &SolveReport,
) -> OutputDocument {
    let reason = match report.status {
        SolveStatus::Infeasible => {
            "the hard constraints admit no roster for this input".to_string()
        }
        SolveStatus::Timeout => format!(
            "no feasible roster found within the time limit ({} nodes searched)",
            report.stats.nodes
        ),
        other => format!("solver returned {} without a solution", other.as_str()),
    };

    let mut diagnostics = base_diagnostics(input, availability, rm, &report.log_output);
    diagnostics.warnings.extend(demand.warnings.iter().cloned());

    OutputDocument {
        people_order: people_order(input),
        assignments: None,
        matrix: None,
        summary: None,
        diagnostics,
        infeasible: Some(true),
        reason: Some(reason),
        error: None,
    }
}

/// Document for inputs rejected before any model was built. The first
/// error becomes the code/message; the rest travel in `details`.
pub fn render_rejected(
    people_order: Vec<String>,
    errors: &[RosterError],
    warnings: Vec<String>,
) -> OutputDocument {
    let first = errors.first().cloned().unwrap_or_else(|| {
        RosterError::Internal("input rejected without a recorded error".to_string())
    });
    let details: Vec<String> = errors.iter().skip(1).map(|e| e.to_string()).collect();

    let mut diagnostics = Diagnostics::default();
    diagnostics.warnings = warnings;

    OutputDocument {
        people_order,
        assignments: None,
        matrix: None,
        summary: None,
        diagnostics,
        infeasible: Some(true),
        reason: Some(first.to_string()),
        error: Some(ErrorBody {
            code: first.code().to_string(),
            message: first.to_string(),
            details,
        }),
    }
}

fn people_order(input: &NormalizedInput) -> Vec<String> {
    input.people.iter().map(|p| p.id.clone()).collect()
}

fn demand_diagnostics(input: &NormalizedInput, demand: &Demand) -> DemandDiagnostics {
    let per_day_totals: Vec<PerDayTotal> = demand
        .days
        .iter()
        .map(|day| {
            let mut slots: IndexMap<String, u32> = IndexMap::new();
            for slot in SlotId::ALL {
                slots.insert(slot.key().to_string(), day.slots[slot.index()]);
            }
            PerDayTotal {
                date: day.date,
                total: day.total,
                slots,
                carry_applied: day.carry_applied,
            }
        })
        .collect();

    DemandDiagnostics {
        days: input.days,
        weekday_of_day1: input.weekday_of_day1,
        day_type_sample: demand.day_type_sample.clone(),
        per_day_totals,
        total_need: demand.total_need,
        warnings: demand.warnings.clone(),
    }
}

fn base_diagnostics(
    input: &NormalizedInput,
    availability: &Availability,
    rm: &RosterModel,
    log_output: &str,
) -> Diagnostics {
    let mut availability_map: IndexMap<String, IndexMap<String, u32>> = IndexMap::new();
    for (index, row) in availability.counts.iter().enumerate() {
        let mut slots: IndexMap<String, u32> = IndexMap::new();
        for slot in SlotId::ALL {
            slots.insert(slot.key().to_string(), row[slot.index()]);
        }
        availability_map.insert((index + 1).to_string(), slots);
    }

    let availability_warnings: Vec<AvailabilityWarningOut> = availability
        .warnings
        .iter()
        .map(|w| AvailabilityWarningOut {
            date: w.date,
            slot: w.slot.key().to_string(),
            need: w.need,
            available: w.available,
        })
        .collect();

    let mut warnings: Vec<String> = input.warnings.clone();
    warnings.extend(rm.warnings.iter().cloned());
    for w in &availability.warnings {
        if w.available == 0 {
            warnings.push(format!(
                "day {} slot {} needs {} but nobody is available",
                w.date,
                w.slot.key(),
                w.need
            ));
        }
    }

    Diagnostics {
        availability: availability_map,
        availability_warnings,
        flags: Flags {
            inconsistent_summary: false,
            availability_warning: availability.has_warnings(),
        },
        warnings,
        var_counts: VarCountsOut {
            x: rm.var_counts.x,
            shortage: rm.var_counts.shortage,
            over: rm.var_counts.over,
            violate_off: rm.var_counts.violate_off,
        },
        log_output: log_output.to_string(),
    }
}

/// Shortage recomputed straight from the chosen assignments; disagreement
/// with the solver's slack values raises `flags.inconsistent_summary`.
fn recompute_shortage(
    input: &NormalizedInput,
    demand: &Demand,
    rm: &RosterModel,
    values: &[i64],
) -> u64 {
    let carry = carry_dawn_cover(input) as i64;
    let mut total: u64 = 0;
    for day in &demand.days {
        for slot in SlotId::ALL {
            let need = day.slots[slot.index()] as i64;
            if need == 0 {
                continue;
            }
            let mut cover: i64 = if slot.is_dawn() && day.date == 1 { carry } else { 0 };
            for (&(_, date, shift), &var) in &rm.x {
                let counted = if slot.is_dawn() {
                    date + 1 == day.date && shift.is_night()
                } else {
                    date == day.date
                };
                if counted
                    && input.coverage.covers(shift, slot)
                    && values[var.index()] == 1
                {
                    cover += 1;
                }
            }
            total += (need - cover).clamp(0, need) as u64;
        }
    }
    total
}
