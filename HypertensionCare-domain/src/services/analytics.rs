//! Client-side aggregation of fetched records into chart-ready data.
//!
//! Everything here is recomputed from scratch whenever the underlying records change;
//! the data volumes involved (tens to a few hundred records) do not call for caching.

use chrono::{Duration, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::entities::blood_pressure::{BpReading, TimeRange};
use crate::entities::prediction::PredictionRecord;

/// Number of features shown in the importance chart
pub const DEFAULT_TOP_FEATURES: usize = 10;

/// One point of the risk score timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorePoint {
    pub date: NaiveDateTime,
    pub score: f64,
    pub risk_level: String,
}

/// One point of the blood pressure timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingPoint {
    pub date: NaiveDateTime,
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse: Option<i32>,
}

/// Direction of change between the first and last value of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Worsening,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Improving => write!(f, "improving"),
            TrendDirection::Worsening => write!(f, "worsening"),
            TrendDirection::Stable => write!(f, "stable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub first: f64,
    pub last: f64,
    pub delta: f64,
    pub direction: TrendDirection,
}

/// A ranked feature for the importance chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    /// Key as sent by the backend
    pub name: String,
    /// Display label with camel case split into words
    pub label: String,
    pub importance: f64,
}

/// Prediction scores in chronological order.
///
/// Records whose date is missing or unparseable are left out.
pub fn prediction_series(records: &[PredictionRecord]) -> Vec<ScorePoint> {
    let mut points: Vec<ScorePoint> = records
        .iter()
        .filter_map(|record| {
            Some(ScorePoint {
                date: record.predicted_at()?,
                score: record.prediction_score,
                risk_level: record.risk_level.clone(),
            })
        })
        .collect();

    points.sort_by_key(|point| point.date);
    points
}

/// Readings in chronological order, unparseable dates left out
pub fn reading_series(readings: &[BpReading]) -> Vec<ReadingPoint> {
    let mut points: Vec<ReadingPoint> = readings
        .iter()
        .filter_map(|reading| {
            Some(ReadingPoint {
                date: reading.measured_at()?,
                systolic: reading.systolic,
                diastolic: reading.diastolic,
                pulse: reading.pulse,
            })
        })
        .collect();

    points.sort_by_key(|point| point.date);
    points
}

/// Trend between the first and last value; a rise is worsening since higher scores and
/// pressures are worse. `None` for an empty series.
pub fn compute_trend(values: &[f64]) -> Option<Trend> {
    let first = *values.first()?;
    let last = *values.last()?;
    let delta = last - first;

    let direction = if delta > 0.0 {
        TrendDirection::Worsening
    } else if delta < 0.0 {
        TrendDirection::Improving
    } else {
        TrendDirection::Stable
    };

    Some(Trend {
        first,
        last,
        delta,
        direction,
    })
}

/// Trend of the risk score over the dated history
pub fn score_trend(records: &[PredictionRecord]) -> Option<Trend> {
    let scores: Vec<f64> = prediction_series(records).iter().map(|p| p.score).collect();
    compute_trend(&scores)
}

/// Trend of systolic pressure over the dated readings
pub fn systolic_trend(readings: &[BpReading]) -> Option<Trend> {
    let values: Vec<f64> = reading_series(readings)
        .iter()
        .map(|p| p.systolic as f64)
        .collect();
    compute_trend(&values)
}

/// Count occurrences of each label, keeping the order labels were first seen
pub fn frequency_counts<I, S>(labels: I) -> IndexMap<String, usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = IndexMap::new();
    for label in labels {
        *counts.entry(label.as_ref().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Predictions per risk level, in chronological first-seen order
pub fn risk_distribution(records: &[PredictionRecord]) -> IndexMap<String, usize> {
    let mut sorted: Vec<&PredictionRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.predicted_at());
    frequency_counts(sorted.iter().map(|record| record.risk_level.as_str()))
}

/// Readings per BP category; readings without one count as `Unknown`
pub fn category_distribution(readings: &[BpReading]) -> IndexMap<String, usize> {
    frequency_counts(readings.iter().map(BpReading::category_label))
}

/// How often each risk factor appears across the history
pub fn risk_factor_counts(records: &[PredictionRecord]) -> IndexMap<String, usize> {
    frequency_counts(records.iter().flat_map(|record| record.key_factors.iter()))
}

/// Split a feature key into words: `totalChol` becomes `Total Chol`, `sys_bp` becomes
/// `Sys bp`
pub fn humanize_feature_name(name: &str) -> String {
    let mut label = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch == '_' {
            label.push(' ');
        } else if ch.is_uppercase() {
            label.push(' ');
            label.push(ch);
        } else {
            label.push(ch);
        }
    }

    let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => label,
    }
}

fn importance_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Top `limit` features by descending importance; non-numeric values are dropped
pub fn rank_feature_importances(importances: &IndexMap<String, Value>, limit: usize) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = importances
        .iter()
        .filter_map(|(name, value)| {
            Some(FeatureImportance {
                name: name.clone(),
                label: humanize_feature_name(name),
                importance: importance_value(value)?,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked.truncate(limit);
    ranked
}

/// Feature ranking of the most recent prediction. Empty when that prediction carries no
/// importances, even if an older one does.
pub fn latest_feature_importances(records: &[PredictionRecord], limit: usize) -> Vec<FeatureImportance> {
    records
        .iter()
        .max_by_key(|record| record.predicted_at())
        .and_then(|record| record.feature_importances.as_ref())
        .map(|importances| rank_feature_importances(importances, limit))
        .unwrap_or_default()
}

/// Readings measured within the window ending at `now`
pub fn filter_by_time_range(readings: &[BpReading], range: TimeRange, now: NaiveDateTime) -> Vec<BpReading> {
    match range.days() {
        None => readings.to_vec(),
        Some(days) => {
            let since = now - Duration::days(days);
            readings
                .iter()
                .filter(|reading| reading.measured_at().map_or(false, |at| at >= since))
                .cloned()
                .collect()
        }
    }
}
