use serde::Serialize;

use crate::entities::blood_pressure::BpReading;
use crate::entities::prediction::PredictionRecord;

/// Placeholder shown when a card has no data
pub const NOT_AVAILABLE: &str = "N/A";

/// One summary card on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardCard {
    pub title: &'static str,
    pub value: String,
    pub unit: Option<&'static str>,
}

impl DashboardCard {
    fn new(title: &'static str, value: Option<String>, unit: Option<&'static str>) -> Self {
        match value {
            Some(value) => Self { title, value, unit },
            None => Self {
                title,
                value: NOT_AVAILABLE.to_string(),
                unit: None,
            },
        }
    }
}

/// Inputs for the dashboard cards; anything the server did not supply stays `None`
#[derive(Debug, Clone, Default)]
pub struct DashboardInputs<'a> {
    pub latest_prediction: Option<&'a PredictionRecord>,
    pub latest_reading: Option<&'a BpReading>,
    /// Percentage of doses taken
    pub medication_adherence: Option<f64>,
    pub next_reminder: Option<String>,
}

/// Build the four dashboard cards
pub fn dashboard_cards(inputs: &DashboardInputs<'_>) -> Vec<DashboardCard> {
    let risk = inputs
        .latest_prediction
        .map(|p| format!("{:.0}", p.prediction_score));
    let last_bp = inputs
        .latest_reading
        .map(|r| format!("{}/{}", r.systolic, r.diastolic));
    let adherence = inputs.medication_adherence.map(|a| format!("{:.0}", a));

    vec![
        DashboardCard::new("Hypertension Risk", risk, Some("%")),
        DashboardCard::new("Last BP Reading", last_bp, Some("mmHg")),
        DashboardCard::new("Medication Adherence", adherence, Some("%")),
        DashboardCard::new("Next Reminder", inputs.next_reminder.clone(), None),
    ]
}

/// The most recently measured reading
pub fn latest_reading(readings: &[BpReading]) -> Option<&BpReading> {
    readings.iter().max_by_key(|r| r.measured_at())
}

/// The most recent prediction
pub fn latest_prediction(records: &[PredictionRecord]) -> Option<&PredictionRecord> {
    records.iter().max_by_key(|r| r.predicted_at())
}
