use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::time_util::{days_since, parse_loose_date};

/// Coarse age bucket used to tune how long inferences stay fresh and how
/// confident they must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStage {
    Newborn,
    Infant,
    Older,
    Unknown,
}

impl DevelopmentStage {
    pub fn from_age_weeks(age_weeks: Option<i64>) -> Self {
        match age_weeks {
            None => DevelopmentStage::Unknown,
            Some(weeks) if weeks <= 4 => DevelopmentStage::Newborn,
            Some(weeks) if weeks <= 26 => DevelopmentStage::Infant,
            Some(_) => DevelopmentStage::Older,
        }
    }

    /// Days before an inference made at this stage expires.
    pub fn inference_expiry_days(&self) -> u32 {
        match self {
            DevelopmentStage::Newborn => 14,
            DevelopmentStage::Infant => 30,
            DevelopmentStage::Older | DevelopmentStage::Unknown => 90,
        }
    }

    /// Lowest confidence an inference needs before it is surfaced.
    pub fn inference_min_confidence(&self) -> f64 {
        match self {
            DevelopmentStage::Newborn => 0.45,
            DevelopmentStage::Infant => 0.5,
            DevelopmentStage::Older | DevelopmentStage::Unknown => 0.55,
        }
    }
}

/// Age in whole weeks, counted from the birth date or, failing that, the
/// due date. Never negative.
pub fn child_age_weeks(
    dob: Option<&str>,
    due_date: Option<&str>,
    today: NaiveDate,
    timezone: Tz,
) -> Option<i64> {
    let base = dob
        .and_then(|d| parse_loose_date(d, timezone))
        .or_else(|| due_date.and_then(|d| parse_loose_date(d, timezone)))?;
    Some((days_since(base, today) / 7).max(0))
}

/// Inclusive one-week range label such as `[12,13]`.
pub fn age_range_label(age_weeks: Option<i64>) -> Option<String> {
    let start = age_weeks?.max(0);
    Some(format!("[{},{}]", start, start + 1))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildStageReport {
    pub age_weeks: Option<i64>,
    pub stage: DevelopmentStage,
    pub age_range: Option<String>,
    pub inference_expiry_days: u32,
    pub inference_min_confidence: f64,
}

pub fn child_stage_report(
    dob: Option<&str>,
    due_date: Option<&str>,
    today: NaiveDate,
    timezone: Tz,
) -> ChildStageReport {
    let age_weeks = child_age_weeks(dob, due_date, today, timezone);
    let stage = DevelopmentStage::from_age_weeks(age_weeks);
    ChildStageReport {
        age_weeks,
        stage,
        age_range: age_range_label(age_weeks),
        inference_expiry_days: stage.inference_expiry_days(),
        inference_min_confidence: stage.inference_min_confidence(),
    }
}
