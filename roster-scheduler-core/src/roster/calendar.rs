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

//! Materialises per-date slot demand from the day-type template, the
//! strict-night overrides and the prior-month night carry.

use crate::model::catalogue::SlotId;
use crate::roster::error::RosterError;
use crate::roster::validate::NormalizedInput;

/// Demand of one date. `carry_applied` records that a strict-night
/// override changed a slot, or (date 1) that prior-month night coverage
/// feeds the dawn slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDemand {
    pub date: u32,
    pub slots: [u32; SlotId::COUNT],
    pub total: u32,
    pub carry_applied: bool,
}

/// Expanded demand over the whole horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demand {
    pub days: Vec<DayDemand>,
    pub total_need: u64,
    /// First nominal week of day-type tags, for the diagnostics block.
    pub day_type_sample: Vec<String>,
    pub warnings: Vec<String>,
}

impl Demand {
    pub fn need(&self, date: u32, slot: SlotId) -> u32 {
        self.days[(date - 1) as usize].slots[slot.index()]
    }
}

/// Number of carried-over night workers whose shift reaches the dawn slot
/// of date 1.
pub fn carry_dawn_cover(input: &NormalizedInput) -> u32 {
    input
        .night_carry
        .iter()
        .filter(|(code, _)| input.coverage.covers(*code, SlotId::S0007))
        .map(|(_, indices)| indices.len() as u32)
        .sum()
}

pub fn expand(input: &NormalizedInput) -> Result<Demand, RosterError> {
    let mut warnings: Vec<String> = Vec::new();
    let mut days: Vec<DayDemand> = Vec::with_capacity(input.days as usize);
    let carry_cover = carry_dawn_cover(input);

    for date in 1..=input.days {
        let day_type = &input.day_type_by_date[(date - 1) as usize];
        // Fail closed: an unknown day type poisons the whole expansion.
        let Some(template_row) = input.need_template.get(day_type) else {
            return Err(RosterError::CatalogueMismatch(format!(
                "dayTypeByDate[{}] = '{day_type}' has no needTemplate row",
                date - 1
            )));
        };

        let mut slots = *template_row;
        let mut carry_applied = false;

        if let Some(sn) = input.strict_night.as_ref() {
            if let Some(v) = sn.h2123 {
                if slots[SlotId::S2123.index()] != v {
                    carry_applied = true;
                }
                slots[SlotId::S2123.index()] = v;
            }
            // Date 1's dawn demand belongs to the prior month's evening and
            // is never overwritten.
            if date != 1 {
                if let Some(v) = sn.h0007 {
                    if slots[SlotId::S0007.index()] != v {
                        carry_applied = true;
                    }
                    slots[SlotId::S0007.index()] = v;
                }
            }
            let current = slots[SlotId::S1821.index()];
            let mut clamped = current;
            if let Some(lo) = sn.h1821_min {
                clamped = clamped.max(lo);
            }
            if let Some(hi) = sn.h1821_max {
                clamped = clamped.min(hi);
            }
            if clamped != current {
                carry_applied = true;
                slots[SlotId::S1821.index()] = clamped;
            }
        }

        if date == 1 && carry_cover > 0 {
            carry_applied = true;
        }

        let total: u32 = slots.iter().sum();
        days.push(DayDemand {
            date,
            slots,
            total,
            carry_applied,
        });
    }

    if input.days >= 1 && days[0].slots[SlotId::S0007.index()] > carry_cover {
        warnings.push(format!(
            "day 1 dawn slot needs {} but only {} night workers carry over from the prior month",
            days[0].slots[SlotId::S0007.index()],
            carry_cover
        ));
    }

    let total_need: u64 = days.iter().map(|d| d.total as u64).sum();
    let day_type_sample: Vec<String> = input.day_type_by_date.iter().take(7).cloned().collect();

    Ok(Demand {
        days,
        total_need,
        day_type_sample,
        warnings,
    })
}
