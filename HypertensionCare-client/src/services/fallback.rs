// Placeholder analytics served when the backend is unavailable and the mock fallback
// is switched on. Callers must flag the data as placeholder when showing it.

use chrono::{Duration, NaiveDate};

use hypertension_care_domain::entities::anomaly::AnomalyReading;
use hypertension_care_domain::entities::{Anomaly, AnomalyId, AnomalySeverity, BpAnalytics};

/// Sample analytics for a `days`-long window ending on `today`
pub fn placeholder_analytics(days: u32, today: NaiveDate) -> BpAnalytics {
    let start = today
        .checked_sub_signed(Duration::days(i64::from(days)))
        .unwrap_or(NaiveDate::MIN);

    BpAnalytics {
        avg_systolic: Some(128.4),
        avg_diastolic: Some(83.1),
        max_systolic: Some(142),
        max_diastolic: Some(91),
        min_systolic: Some(116),
        min_diastolic: Some(74),
        reading_count: 12,
        abnormal_reading_count: 3,
        trend_direction: Some("stable".to_string()),
        trend_details: Some("Sample data, the analytics service is unavailable".to_string()),
        start_date: Some(start.format("%Y-%m-%d").to_string()),
        end_date: Some(today.format("%Y-%m-%d").to_string()),
    }
}

/// Sample anomaly list dated relative to `today`
pub fn placeholder_anomalies(today: NaiveDate) -> Vec<Anomaly> {
    let day = |offset: i64| (today - Duration::days(offset)).format("%Y-%m-%d").to_string();

    vec![
        Anomaly {
            id: AnomalyId::Text("sample-1".to_string()),
            kind: "Sudden spike".to_string(),
            severity: AnomalySeverity::Medium,
            date: day(3),
            description: "Systolic pressure rose by more than 20 mmHg between consecutive readings".to_string(),
            readings: vec![
                AnomalyReading {
                    date: day(4),
                    systolic: 122,
                    diastolic: 79,
                    pulse: Some(70),
                },
                AnomalyReading {
                    date: day(3),
                    systolic: 146,
                    diastolic: 92,
                    pulse: Some(84),
                },
            ],
            recommendation: Some("Re-measure after resting for five minutes".to_string()),
        },
        Anomaly {
            id: AnomalyId::Text("sample-2".to_string()),
            kind: "Morning surge".to_string(),
            severity: AnomalySeverity::Low,
            date: day(1),
            description: "Morning readings are consistently higher than evening readings".to_string(),
            readings: Vec::new(),
            recommendation: None,
        },
    ]
}
