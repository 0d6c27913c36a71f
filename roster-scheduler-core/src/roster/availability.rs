//! Diagnostic pass counting, for every (date, slot), how many people could
//! possibly be assigned some covering shift. Never constrains the model:
//! a short slot is reported, then left to the solver's shortage handling.

use crate::model::catalogue::SlotId;
use crate::roster::calendar::Demand;
use crate::roster::validate::NormalizedInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityWarning {
    pub date: u32,
    pub slot: SlotId,
    pub need: u32,
    pub available: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// Per date (index date-1), per slot.
    pub counts: Vec<[u32; SlotId::COUNT]>,
    /// Slots where need > 0 and fewer people are available than needed.
    pub warnings: Vec<AvailabilityWarning>,
}

impl Availability {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

pub fn analyze(input: &NormalizedInput, demand: &Demand) -> Availability {
    let mut counts: Vec<[u32; SlotId::COUNT]> = Vec::with_capacity(input.days as usize);
    let mut warnings: Vec<AvailabilityWarning> = Vec::new();

    for date in 1..=input.days {
        let mut row = [0u32; SlotId::COUNT];
        for slot in SlotId::ALL {
            row[slot.index()] = if slot.is_dawn() {
                dawn_available(input, date)
            } else {
                same_day_available(input, date, slot)
            };
        }
        counts.push(row);
    }

    for day in &demand.days {
        for slot in SlotId::ALL {
            let need = day.slots[slot.index()];
            let available = counts[(day.date - 1) as usize][slot.index()];
            if need > 0 && available < need {
                warnings.push(AvailabilityWarning {
                    date: day.date,
                    slot,
                    need,
                    available,
                });
            }
        }
    }

    Availability { counts, warnings }
}

fn same_day_available(input: &NormalizedInput, date: u32, slot: SlotId) -> u32 {
    let weekday = input.weekday_of(date);
    input
        .people
        .iter()
        .filter(|p| !p.is_hard_off(date, weekday))
        .filter(|p| p.can_work.iter().any(|&s| input.coverage.covers(s, slot)))
        .count() as u32
}

/// The dawn slot of date d is staffed by night shifts of date d-1; for
/// date 1 the prior month's carry set is the whole supply.
fn dawn_available(input: &NormalizedInput, date: u32) -> u32 {
    if date == 1 {
        let mut seen: Vec<usize> = Vec::new();
        for (code, indices) in &input.night_carry {
            if !input.coverage.covers(*code, SlotId::S0007) {
                continue;
            }
            for &index in indices {
                if !seen.contains(&index) {
                    seen.push(index);
                }
            }
        }
        return seen.len() as u32;
    }

    let prior = date - 1;
    let weekday = input.weekday_of(prior);
    input
        .people
        .iter()
        .filter(|p| !p.is_hard_off(prior, weekday))
        .filter(|p| {
            p.can_work
                .iter()
                .any(|&s| s.is_night() && input.coverage.covers(s, SlotId::S0007))
        })
        .count() as u32
}
