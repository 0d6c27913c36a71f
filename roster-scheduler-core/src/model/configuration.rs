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

use crate::model::catalogue::ShiftCode;
use serde::Serialize;

/// Objective weights. All non-negative; a zero weight disables its term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Weights {
    pub shortage: i64,
    pub overstaff_gt_need_plus1: i64,
    pub requested_off_violation: i64,
    /// Reserved: balance workdays across staff. Inactive at 0.
    pub balance_workdays: i64,
    /// Reserved: fill-preference bonus on the morning slots. Inactive at 0.
    pub fill_preference: i64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            shortage: 1000, // dominates the soft terms
            overstaff_gt_need_plus1: 5,
            requested_off_violation: 20,
            balance_workdays: 0,
            fill_preference: 0,
        }
    }
}

/// Canonical weight keys with their accepted aliases, all matched
/// case-insensitively.
pub const WEIGHT_ALIASES: &[(&str, &[&str])] = &[
    ("w_shortage", &[]),
    ("w_overstaff_gt_need_plus1", &[]),
    ("w_requested_off_violation", &["w_wish_off_violation"]),
    ("w_balance_workdays", &[]),
    ("w_fill_preference", &[]),
];

impl Weights {
    /// Resolves a lowercased key to the matching field, if any.
    pub fn field_mut(&mut self, canonical: &str) -> Option<&mut i64> {
        match canonical {
            "w_shortage" => Some(&mut self.shortage),
            "w_overstaff_gt_need_plus1" => Some(&mut self.overstaff_gt_need_plus1),
            "w_requested_off_violation" => Some(&mut self.requested_off_violation),
            "w_balance_workdays" => Some(&mut self.balance_workdays),
            "w_fill_preference" => Some(&mut self.fill_preference),
            _ => None,
        }
    }

    /// Maps an input key (any case, any alias) to its canonical key.
    pub fn canonical_key(key: &str) -> Option<&'static str> {
        let lower = key.to_lowercase();
        for (canonical, aliases) in WEIGHT_ALIASES {
            if *canonical == lower || aliases.contains(&lower.as_str()) {
                return Some(canonical);
            }
        }
        None
    }
}

/// Sequencing rules of the facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rules {
    /// Forbids EA on the day immediately after a DA or DB.
    pub no_early_after_day_ab: bool,
    /// Required rest days after each night code. Values below 0 are
    /// clamped to 0 at validation.
    pub night_rest: [u32; 3],
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            no_early_after_day_ab: false,
            night_rest: [2, 1, 1], // NA, NB, NC
        }
    }
}

impl Rules {
    pub fn night_rest_for(&self, shift: ShiftCode) -> u32 {
        match shift {
            ShiftCode::NA => self.night_rest[0],
            ShiftCode::NB => self.night_rest[1],
            ShiftCode::NC => self.night_rest[2],
            _ => 0,
        }
    }

    pub fn set_night_rest(&mut self, shift: ShiftCode, days: u32) {
        match shift {
            ShiftCode::NA => self.night_rest[0] = days,
            ShiftCode::NB => self.night_rest[1] = days,
            ShiftCode::NC => self.night_rest[2] = days,
            _ => {}
        }
    }
}

pub const DEFAULT_CONSEC_MAX: u32 = 5;

/// Fixed seed handed to the solver backend; determinism of a solve is part
/// of the external contract.
pub const SOLVER_SEED: u64 = 42;

pub const DEFAULT_TIME_LIMIT_SECS: u64 = 60;
