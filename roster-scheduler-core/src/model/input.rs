use crate::roster::error::RosterError;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Raw input document, parsed as-is. Loose typings of the wire format
/// (weekdays as labels or indices, aliased weight keys) are kept verbatim
/// here and normalised by the validator into [`crate::model::person`] /
/// [`crate::model::configuration`] types.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RosterInput {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub days: Option<i64>,
    pub weekday_of_day1: Option<i64>,
    /// Night code -> staff ids who worked it on the last date of the prior
    /// month.
    pub previous_month_night_carry: IndexMap<String, Vec<String>>,
    pub shifts: Option<Vec<RawShift>>,
    pub need_template: Option<IndexMap<String, IndexMap<String, i64>>>,
    pub day_type_by_date: Option<Vec<String>>,
    pub strict_night: Option<RawStrictNight>,
    pub people: Option<Vec<RawPerson>>,
    pub rules: Option<RawRules>,
    /// Weight keys are matched case-insensitively against the alias table.
    pub weights: IndexMap<String, Value>,
    /// staffId -> requested-off days, merged into the person records.
    pub wish_offs: IndexMap<String, Vec<i64>>,
}

impl RosterInput {
    pub fn from_json(json: &str) -> Result<RosterInput, RosterError> {
        serde_json::from_str(json).map_err(|e| RosterError::InputParse(e.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawShift {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    pub start: i64,
    pub end: i64,
}

/// Mandatory night headcounts plus the 18-21 window. The legacy combined
/// `18-24` keys are accepted as aliases of the split keys.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStrictNight {
    #[serde(rename = "21-23")]
    pub h2123: Option<i64>,
    #[serde(rename = "0-7")]
    pub h0007: Option<i64>,
    #[serde(rename = "18-21_min", alias = "18-24_min")]
    pub h1821_min: Option<i64>,
    #[serde(rename = "18-21_max", alias = "18-24_max")]
    pub h1821_max: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPerson {
    pub id: Option<String>,
    pub can_work: Vec<String>,
    /// Entries are either 0-6 indices or Japanese one-character labels.
    pub fixed_off_weekdays: Vec<IntOrLabel>,
    pub weekly_min: i64,
    pub weekly_max: i64,
    pub monthly_min: i64,
    pub monthly_max: i64,
    pub consec_max: Option<i64>,
    pub unavailable_dates: Vec<i64>,
    pub requested_off_dates: Vec<i64>,
    pub requested_off_weight: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRules {
    #[serde(alias = "no_early_after_day_ab", alias = "noEarlyAfterDayAb")]
    pub no_early_after_day_a_b: Option<bool>,
    #[serde(alias = "night_rest")]
    pub night_rest: Option<IndexMap<String, i64>>,
}

/// A weekday given either as an index or as a label.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IntOrLabel {
    Int(i64),
    Label(String),
}
