//! Daily and weekly progress report records.
//!
//! Daily (DPR) and weekly (WPR) reports carry different field sets, so they are
//! distinct structs joined by the `Report` union. Both expose their creation
//! time through `Timestamped`, which is all the metrics layer needs to window
//! them by month or recency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::fields::ReportKind;
use crate::lenient;
use crate::store::parse_date_lenient;

/// Anything with a creation timestamp.
pub trait Timestamped {
    /// Parsed creation time; `None` when missing or malformed.
    fn created_at(&self) -> Option<DateTime<Utc>>;
}

/// A progress figure that the backend may send as a number or a numeric string.
///
/// Any other JSON value (`null`, booleans, arrays, objects) reads as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProgressValue {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for ProgressValue {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => ProgressValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => ProgressValue::Text(s),
            other => {
                log::debug!("non-numeric progress value {other}, reading as 0");
                ProgressValue::default()
            }
        })
    }
}

impl Default for ProgressValue {
    fn default() -> Self {
        ProgressValue::Number(0.0)
    }
}

impl ProgressValue {
    /// Numeric value, or 0 when the figure is not a finite number.
    ///
    /// Text is trimmed and a trailing `%` is accepted.
    pub fn value(&self) -> f64 {
        let v = match self {
            ProgressValue::Number(n) => *n,
            ProgressValue::Text(s) => {
                let s = s.trim();
                let s = s.strip_suffix('%').unwrap_or(s).trim_end();
                s.parse::<f64>().unwrap_or(0.0)
            }
        };
        if v.is_finite() { v } else { 0.0 }
    }
}

impl From<f64> for ProgressValue {
    fn from(v: f64) -> Self {
        ProgressValue::Number(v)
    }
}

impl From<&str> for ProgressValue {
    fn from(v: &str) -> Self {
        ProgressValue::Text(v.to_string())
    }
}

/// Daily progress report (DPR): one day of site activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, alias = "created_at", deserialize_with = "lenient::string")]
    pub created_at: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub weather: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub manpower: Option<u32>,
    #[serde(default, alias = "work_done", deserialize_with = "lenient::opt_string")]
    pub work_done: Option<String>,
    #[serde(default, alias = "safety_incident", deserialize_with = "lenient::opt_string")]
    pub safety_incident: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub remarks: Option<String>,
}

impl DailyReport {
    pub fn new(id: u64, created_at: impl Into<String>) -> Self {
        Self {
            id,
            created_at: created_at.into(),
            date: None,
            weather: None,
            manpower: None,
            work_done: None,
            safety_incident: None,
            remarks: None,
        }
    }

    /// True when a non-blank safety incident was recorded.
    pub fn has_safety_incident(&self) -> bool {
        self.safety_incident
            .as_deref()
            .map(|s| {
                let s = s.trim();
                !s.is_empty() && !s.eq_ignore_ascii_case("none") && !s.eq_ignore_ascii_case("no")
            })
            .unwrap_or(false)
    }
}

impl Timestamped for DailyReport {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_date_lenient(&self.created_at)
    }
}

/// Weekly progress report (WPR): planned versus actual progress for a week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: u64,
    #[serde(default, alias = "created_at", deserialize_with = "lenient::string")]
    pub created_at: String,
    #[serde(default, alias = "week_start", deserialize_with = "lenient::opt_string")]
    pub week_start: Option<String>,
    #[serde(default, alias = "week_end", deserialize_with = "lenient::opt_string")]
    pub week_end: Option<String>,
    #[serde(default, alias = "planned_progress")]
    pub planned_progress: ProgressValue,
    #[serde(default, alias = "actual_progress")]
    pub actual_progress: ProgressValue,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub remarks: Option<String>,
}

impl WeeklyReport {
    pub fn new(
        id: u64,
        created_at: impl Into<String>,
        planned: impl Into<ProgressValue>,
        actual: impl Into<ProgressValue>,
    ) -> Self {
        Self {
            id,
            created_at: created_at.into(),
            week_start: None,
            week_end: None,
            planned_progress: planned.into(),
            actual_progress: actual.into(),
            summary: None,
            remarks: None,
        }
    }
}

impl Timestamped for WeeklyReport {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_date_lenient(&self.created_at)
    }
}

/// Either kind of report, for views that list both together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Report {
    Daily(DailyReport),
    Weekly(WeeklyReport),
}

impl Report {
    pub fn kind(&self) -> ReportKind {
        match self {
            Report::Daily(_) => ReportKind::Daily,
            Report::Weekly(_) => ReportKind::Weekly,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Report::Daily(r) => r.id,
            Report::Weekly(r) => r.id,
        }
    }

    pub fn raw_created_at(&self) -> &str {
        match self {
            Report::Daily(r) => &r.created_at,
            Report::Weekly(r) => &r.created_at,
        }
    }
}

impl Timestamped for Report {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Report::Daily(r) => r.created_at(),
            Report::Weekly(r) => r.created_at(),
        }
    }
}
