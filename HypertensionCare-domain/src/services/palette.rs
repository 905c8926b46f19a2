// Colour mapping for risk levels, BP categories and anomaly severities.
// Every lookup is total: unknown labels get a neutral default.

use crate::entities::anomaly::AnomalySeverity;
use crate::entities::blood_pressure::BloodPressureCategory;
use crate::entities::prediction::RiskLevel;

/// Primary brand colour, used for unknown risk levels
pub const PRIMARY_COLOR: &str = "#4F46E5";

/// Neutral grey for unknown BP categories
pub const DEFAULT_CATEGORY_COLOR: &str = "rgba(201, 203, 207, 0.7)";

/// Chart colour for a risk level label
pub fn risk_level_color(label: &str) -> &'static str {
    match RiskLevel::from_label(label) {
        Some(RiskLevel::Low) => "#10B981",
        Some(RiskLevel::Moderate) => "#F59E0B",
        Some(RiskLevel::High) => "#F97316",
        Some(RiskLevel::VeryHigh) => "#EF4444",
        None => PRIMARY_COLOR,
    }
}

/// Chart colour for a BP category label
pub fn category_color(label: &str) -> &'static str {
    match BloodPressureCategory::from_label(label) {
        Some(BloodPressureCategory::Normal) => "rgba(75, 192, 92, 0.7)",
        Some(BloodPressureCategory::Elevated) => "rgba(255, 206, 86, 0.7)",
        Some(BloodPressureCategory::Hypertension1) => "rgba(255, 159, 64, 0.7)",
        Some(BloodPressureCategory::Hypertension2) => "rgba(255, 99, 132, 0.7)",
        Some(BloodPressureCategory::HypertensiveCrisis) => "rgba(220, 53, 69, 0.7)",
        None => DEFAULT_CATEGORY_COLOR,
    }
}

/// Badge colour name for an anomaly severity
pub fn severity_color(severity: AnomalySeverity) -> &'static str {
    match severity {
        AnomalySeverity::High => "red",
        AnomalySeverity::Medium => "orange",
        AnomalySeverity::Low => "yellow",
    }
}

/// Terminal colour for a risk level label, as an ANSI SGR code
pub fn risk_level_ansi(label: &str) -> &'static str {
    match RiskLevel::from_label(label) {
        Some(RiskLevel::Low) => "32",
        Some(RiskLevel::Moderate) => "33",
        Some(RiskLevel::High) => "38;5;208",
        Some(RiskLevel::VeryHigh) => "31",
        None => "34",
    }
}

/// Terminal colour for a BP category label, as an ANSI SGR code
pub fn category_ansi(label: &str) -> &'static str {
    match BloodPressureCategory::from_label(label) {
        Some(BloodPressureCategory::Normal) => "32",
        Some(BloodPressureCategory::Elevated) => "33",
        Some(BloodPressureCategory::Hypertension1) => "38;5;208",
        Some(BloodPressureCategory::Hypertension2) => "31",
        Some(BloodPressureCategory::HypertensiveCrisis) => "1;37;41",
        None => "90",
    }
}
