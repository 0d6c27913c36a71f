use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The output document of §external-contract. Optional sections are
/// omitted, never null; key spellings follow the wire format exactly
/// (mixed camelCase / snake_case is part of the contract).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputDocument {
    #[serde(rename = "peopleOrder")]
    pub people_order: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Vec<Assignment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix: Option<Vec<MatrixRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    pub diagnostics: Diagnostics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infeasible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub date: u32,
    #[serde(rename = "staffId")]
    pub staff_id: String,
    pub shift: String,
}

/// One date of the matrix; `shifts` holds every staff id in `peopleOrder`
/// order, the empty string meaning "off".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatrixRow {
    pub date: u32,
    pub shifts: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    pub totals: Totals,
    pub diagnostics: SummaryDiagnostics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Totals {
    pub assigned: u64,
    pub shortage: u64,
    pub excess: u64,
    #[serde(rename = "wishOffViolations")]
    pub wish_off_violations: u64,
    /// Legacy alias, always equal to `wishOffViolations`.
    #[serde(rename = "violatedPreferences")]
    pub violated_preferences: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryDiagnostics {
    pub demand: DemandDiagnostics,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DemandDiagnostics {
    pub days: u32,
    #[serde(rename = "weekdayOfDay1")]
    pub weekday_of_day1: u32,
    #[serde(rename = "dayTypeSample")]
    pub day_type_sample: Vec<String>,
    #[serde(rename = "perDayTotals")]
    pub per_day_totals: Vec<PerDayTotal>,
    #[serde(rename = "totalNeed")]
    pub total_need: u64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerDayTotal {
    pub date: u32,
    pub total: u32,
    pub slots: IndexMap<String, u32>,
    #[serde(rename = "carryApplied")]
    pub carry_applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnostics {
    /// date -> slot key -> possible headcount.
    pub availability: IndexMap<String, IndexMap<String, u32>>,
    #[serde(rename = "availabilityWarnings")]
    pub availability_warnings: Vec<AvailabilityWarningOut>,
    pub warnings: Vec<String>,
    pub flags: Flags,
    pub var_counts: VarCountsOut,
    #[serde(rename = "logOutput")]
    pub log_output: String,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics {
            availability: IndexMap::new(),
            availability_warnings: Vec::new(),
            warnings: Vec::new(),
            flags: Flags::default(),
            var_counts: VarCountsOut::default(),
            log_output: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityWarningOut {
    pub date: u32,
    pub slot: String,
    pub need: u32,
    pub available: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flags {
    pub inconsistent_summary: bool,
    pub availability_warning: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VarCountsOut {
    pub x: usize,
    pub shortage: usize,
    pub over: usize,
    #[serde(rename = "violateOff")]
    pub violate_off: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub details: Vec<String>,
}
