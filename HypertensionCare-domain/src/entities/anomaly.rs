use serde::{Deserialize, Serialize};

/// Minimum number of readings before anomaly detection is worth asking for
pub const MIN_READINGS_FOR_ANOMALIES: usize = 5;

/// How serious the backend rates an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalySeverity::Low => write!(f, "Low"),
            AnomalySeverity::Medium => write!(f, "Medium"),
            AnomalySeverity::High => write!(f, "High"),
        }
    }
}

/// Anomaly ids are numeric from some backends and textual from others
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnomalyId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for AnomalyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyId::Number(n) => write!(f, "{}", n),
            AnomalyId::Text(s) => f.write_str(s),
        }
    }
}

/// A reading referenced by an anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReading {
    pub date: String,
    pub systolic: i32,
    pub diastolic: i32,
    #[serde(default)]
    pub pulse: Option<i32>,
}

/// An irregular pattern flagged by the backend across the reading history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: AnomalyId,

    /// Short title, e.g. "Sudden spike"
    #[serde(rename = "type")]
    pub kind: String,

    pub severity: AnomalySeverity,

    pub date: String,

    pub description: String,

    #[serde(default, alias = "related_readings")]
    pub readings: Vec<AnomalyReading>,

    #[serde(default)]
    pub recommendation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_anomaly_deserializes() {
        let anomaly: Anomaly = serde_json::from_value(json!({
            "id": 3,
            "type": "Sudden spike",
            "severity": "high",
            "date": "2024-04-02",
            "description": "Systolic jumped by 35 mmHg",
            "readings": [{"date": "2024-04-02", "systolic": 170, "diastolic": 100}],
            "recommendation": "Re-measure after resting"
        }))
        .unwrap();

        assert_eq!(anomaly.id.to_string(), "3");
        assert_eq!(anomaly.kind, "Sudden spike");
        assert_eq!(anomaly.severity, AnomalySeverity::High);
        assert_eq!(anomaly.readings.len(), 1);
        assert!(anomaly.readings[0].pulse.is_none());
    }

    #[test]
    fn test_related_readings_alias_and_text_id() {
        let anomaly: Anomaly = serde_json::from_value(json!({
            "id": "a-1",
            "type": "Irregular pattern",
            "severity": "medium",
            "date": "2024-04-02",
            "description": "Evening readings vary widely",
            "related_readings": []
        }))
        .unwrap();

        assert_eq!(anomaly.id, AnomalyId::Text("a-1".to_string()));
        assert!(anomaly.recommendation.is_none());
        assert_eq!(anomaly.severity.to_string(), "Medium");
    }
}
