use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The facility's closed set of duty codes. Adding a code is a data
/// migration: every table indexed by `ShiftCode::ALL` must be extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShiftCode {
    EA,
    DA,
    DB,
    LA,
    NA,
    NB,
    NC,
}

impl ShiftCode {
    /// Canonical catalogue order, also the secondary sort key of every
    /// enumeration over shifts.
    pub const ALL: [ShiftCode; 7] = [
        ShiftCode::EA,
        ShiftCode::DA,
        ShiftCode::DB,
        ShiftCode::LA,
        ShiftCode::NA,
        ShiftCode::NB,
        ShiftCode::NC,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ShiftCode::EA => "EA",
            ShiftCode::DA => "DA",
            ShiftCode::DB => "DB",
            ShiftCode::LA => "LA",
            ShiftCode::NA => "NA",
            ShiftCode::NB => "NB",
            ShiftCode::NC => "NC",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ShiftCode::EA => "early",
            ShiftCode::DA => "day-A",
            ShiftCode::DB => "day-B",
            ShiftCode::LA => "late",
            ShiftCode::NA => "night-A",
            ShiftCode::NB => "night-B",
            ShiftCode::NC => "night-C",
        }
    }

    /// Default hour span. End < start signals wraparound into the next
    /// morning (night shifts).
    pub fn default_span(&self) -> HourSpan {
        match self {
            ShiftCode::EA => HourSpan::new(7, 15),
            ShiftCode::DA => HourSpan::new(9, 17),
            ShiftCode::DB => HourSpan::new(9, 18),
            ShiftCode::LA => HourSpan::new(15, 21),
            ShiftCode::NA => HourSpan::new(16, 10),
            ShiftCode::NB => HourSpan::new(17, 9),
            ShiftCode::NC => HourSpan::new(21, 7),
        }
    }

    pub fn is_night(&self) -> bool {
        matches!(self, ShiftCode::NA | ShiftCode::NB | ShiftCode::NC)
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_code(code: &str) -> Option<ShiftCode> {
        ShiftCode::ALL.iter().find(|s| s.code() == code).copied()
    }
}

impl fmt::Display for ShiftCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The six demand slots of one day, in chronological convention.
/// `S0007` is the dawn slot: its demand on date d is satisfied by night
/// shifts assigned on date d-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    S0709,
    S0915,
    S1618,
    S1821,
    S2123,
    S0007,
}

impl SlotId {
    pub const ALL: [SlotId; 6] = [
        SlotId::S0709,
        SlotId::S0915,
        SlotId::S1618,
        SlotId::S1821,
        SlotId::S2123,
        SlotId::S0007,
    ];

    pub const COUNT: usize = 6;

    /// The JSON key of the slot in need templates and output documents.
    pub fn key(&self) -> &'static str {
        match self {
            SlotId::S0709 => "7-9",
            SlotId::S0915 => "9-15",
            SlotId::S1618 => "16-18",
            SlotId::S1821 => "18-21",
            SlotId::S2123 => "21-23",
            SlotId::S0007 => "0-7",
        }
    }

    pub fn hours(&self) -> (u8, u8) {
        match self {
            SlotId::S0709 => (7, 9),
            SlotId::S0915 => (9, 15),
            SlotId::S1618 => (16, 18),
            SlotId::S1821 => (18, 21),
            SlotId::S2123 => (21, 23),
            SlotId::S0007 => (0, 7),
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_key(key: &str) -> Option<SlotId> {
        SlotId::ALL.iter().find(|s| s.key() == key).copied()
    }

    /// True for the dawn slot, whose coverage comes from the prior date.
    pub fn is_dawn(&self) -> bool {
        matches!(self, SlotId::S0007)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Hour interval of a shift, [start, end) on a 24h dial.
/// `end < start` wraps past midnight into the next morning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourSpan {
    pub start: u8,
    pub end: u8,
}

impl HourSpan {
    pub fn new(start: u8, end: u8) -> HourSpan {
        HourSpan { start, end }
    }

    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    /// The same-date part of the span, [start, 24) for wrapping shifts.
    fn evening_part(&self) -> (u8, u8) {
        if self.wraps() { (self.start, 24) } else { (self.start, self.end) }
    }

    /// The next-date part of the span, [0, end) for wrapping shifts.
    fn morning_part(&self) -> Option<(u8, u8)> {
        if self.wraps() { Some((0, self.end)) } else { None }
    }
}

/// Per-code hour spans of one solve. The codes themselves are fixed; the
/// input document may narrow or widen the default spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftCatalogue {
    spans: [HourSpan; ShiftCode::ALL.len()],
}

impl Default for ShiftCatalogue {
    fn default() -> Self {
        let mut spans = [HourSpan::new(0, 0); ShiftCode::ALL.len()];
        for shift in ShiftCode::ALL {
            spans[shift.index()] = shift.default_span();
        }
        ShiftCatalogue { spans }
    }
}

impl ShiftCatalogue {
    pub fn span(&self, shift: ShiftCode) -> HourSpan {
        self.spans[shift.index()]
    }

    pub fn set_span(&mut self, shift: ShiftCode, span: HourSpan) {
        self.spans[shift.index()] = span;
    }

    /// A shift covers a slot when the slot's hour interval is contained in
    /// the shift's interval. Same-date slots compare against the evening
    /// part; the dawn slot compares against the wrapped morning part, so a
    /// night shift of date d covers `0-7` of date d+1.
    pub fn covers(&self, shift: ShiftCode, slot: SlotId) -> bool {
        let span = self.span(shift);
        let (slot_start, slot_end) = slot.hours();
        if slot.is_dawn() {
            match span.morning_part() {
                Some((s, e)) => s <= slot_start && slot_end <= e,
                None => false,
            }
        } else {
            let (s, e) = span.evening_part();
            s <= slot_start && slot_end <= e
        }
    }

    /// Full coverage table, one row per shift in catalogue order.
    pub fn coverage(&self) -> CoverageTable {
        let mut table = [[false; SlotId::COUNT]; ShiftCode::ALL.len()];
        for shift in ShiftCode::ALL {
            for slot in SlotId::ALL {
                table[shift.index()][slot.index()] = self.covers(shift, slot);
            }
        }
        CoverageTable { table }
    }
}

/// Precomputed `covers` relation, total over (shift, slot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageTable {
    table: [[bool; SlotId::COUNT]; ShiftCode::ALL.len()],
}

impl CoverageTable {
    pub fn covers(&self, shift: ShiftCode, slot: SlotId) -> bool {
        self.table[shift.index()][slot.index()]
    }

    /// Shifts covering the given slot, in catalogue order.
    pub fn shifts_for(&self, slot: SlotId) -> impl Iterator<Item = ShiftCode> + '_ {
        ShiftCode::ALL
            .into_iter()
            .filter(move |s| self.table[s.index()][slot.index()])
    }
}

lazy_static! {
    /// Coverage of the default catalogue, computed once at startup.
    pub static ref DEFAULT_COVERAGE: CoverageTable = ShiftCatalogue::default().coverage();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spans_cover_expected_slots() {
        let cat = ShiftCatalogue::default();
        assert!(cat.covers(ShiftCode::EA, SlotId::S0709));
        assert!(cat.covers(ShiftCode::EA, SlotId::S0915));
        assert!(!cat.covers(ShiftCode::EA, SlotId::S1618));
        assert!(cat.covers(ShiftCode::DA, SlotId::S0915));
        assert!(!cat.covers(ShiftCode::DA, SlotId::S1618));
        assert!(cat.covers(ShiftCode::DB, SlotId::S1618));
        assert!(cat.covers(ShiftCode::LA, SlotId::S1618));
        assert!(cat.covers(ShiftCode::LA, SlotId::S1821));
    }

    #[test]
    fn night_shifts_cover_dawn_via_wraparound() {
        let cat = ShiftCatalogue::default();
        for night in [ShiftCode::NA, ShiftCode::NB, ShiftCode::NC] {
            assert!(cat.covers(night, SlotId::S2123), "{night} must cover 21-23");
            assert!(cat.covers(night, SlotId::S0007), "{night} must cover 0-7");
        }
        assert!(cat.covers(ShiftCode::NA, SlotId::S1618));
        assert!(!cat.covers(ShiftCode::NB, SlotId::S1618));
        assert!(!cat.covers(ShiftCode::NC, SlotId::S1821));
        // Day shifts never reach the dawn slot.
        assert!(!cat.covers(ShiftCode::EA, SlotId::S0007));
        assert!(!cat.covers(ShiftCode::LA, SlotId::S0007));
    }

    #[test]
    fn coverage_table_matches_direct_predicate() {
        let cat = ShiftCatalogue::default();
        let table = cat.coverage();
        for shift in ShiftCode::ALL {
            for slot in SlotId::ALL {
                assert_eq!(table.covers(shift, slot), cat.covers(shift, slot));
            }
        }
    }

    #[test]
    fn code_round_trip() {
        for shift in ShiftCode::ALL {
            assert_eq!(ShiftCode::from_code(shift.code()), Some(shift));
        }
        assert_eq!(ShiftCode::from_code("ZZ"), None);
        for slot in SlotId::ALL {
            assert_eq!(SlotId::from_key(slot.key()), Some(slot));
        }
    }
}
