use chrono::{Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::services::intake::IntakeError;

/// Output format requested from `GET /bp/report`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[default]
    Pdf,
    Excel,
}

impl ReportType {
    /// Query-string value
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Pdf => "pdf",
            ReportType::Excel => "excel",
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ReportType::Pdf),
            "excel" | "xlsx" => Ok(ReportType::Excel),
            other => Err(format!("Unknown report type: {}", other)),
        }
    }
}

/// Date range presets offered by the report form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportRangePreset {
    #[default]
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
    Custom,
}

impl std::str::FromStr for ReportRangePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "week" => Ok(ReportRangePreset::Week),
            "month" => Ok(ReportRangePreset::Month),
            "3months" | "three-months" => Ok(ReportRangePreset::ThreeMonths),
            "6months" | "six-months" => Ok(ReportRangePreset::SixMonths),
            "year" => Ok(ReportRangePreset::Year),
            "custom" => Ok(ReportRangePreset::Custom),
            other => Err(format!("Unknown date range: {}", other)),
        }
    }
}

/// Inclusive date range for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    /// Resolve a preset against `today`. Custom ranges need `custom` bounds.
    pub fn resolve(
        preset: ReportRangePreset,
        today: NaiveDate,
        custom: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Self, IntakeError> {
        let start = match preset {
            ReportRangePreset::Week => today - Duration::days(7),
            ReportRangePreset::Month => today - Duration::days(30),
            ReportRangePreset::ThreeMonths => months_before(today, 3),
            ReportRangePreset::SixMonths => months_before(today, 6),
            ReportRangePreset::Year => months_before(today, 12),
            ReportRangePreset::Custom => {
                let (start, end) = custom.ok_or_else(|| {
                    IntakeError::Validation("A custom range needs a start and an end date".to_string())
                })?;
                return Self::new(start, end);
            }
        };

        Self::new(start, today)
    }

    /// Build a range, rejecting a start after the end
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, IntakeError> {
        if start > end {
            return Err(IntakeError::InvalidDateRange);
        }
        Ok(Self { start, end })
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months)).unwrap_or(date)
}

/// Body of a successful `GET /bp/report`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedReport {
    #[serde(default)]
    pub message: Option<String>,

    /// Server-side path; some responses spell it `reportPath`
    #[serde(default, alias = "reportPath")]
    pub report_path: Option<String>,
}

/// File name to save a downloaded report under: the last segment of its path
pub fn report_file_name(report_path: &str) -> &str {
    report_path
        .rsplit(|c| c == '/' || c == '\\')
        .find(|segment| !segment.is_empty())
        .unwrap_or("report")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_presets_resolve_against_today() {
        let today = date(2024, 8, 31);

        let week = ReportRange::resolve(ReportRangePreset::Week, today, None).unwrap();
        assert_eq!(week.start, date(2024, 8, 24));
        assert_eq!(week.end, today);

        let month = ReportRange::resolve(ReportRangePreset::Month, today, None).unwrap();
        assert_eq!(month.start, date(2024, 8, 1));

        let quarter = ReportRange::resolve(ReportRangePreset::ThreeMonths, today, None).unwrap();
        assert_eq!(quarter.start, date(2024, 5, 31));

        // Clamped to the last day of February
        let half = ReportRange::resolve(ReportRangePreset::SixMonths, today, None).unwrap();
        assert_eq!(half.start, date(2024, 2, 29));

        let year = ReportRange::resolve(ReportRangePreset::Year, today, None).unwrap();
        assert_eq!(year.start_param(), "2023-08-31");
        assert_eq!(year.end_param(), "2024-08-31");
    }

    #[test]
    fn test_custom_range_validation() {
        let today = date(2024, 8, 31);

        let err = ReportRange::resolve(
            ReportRangePreset::Custom,
            today,
            Some((date(2024, 9, 2), date(2024, 9, 1))),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Start date cannot be after end date");

        assert!(ReportRange::resolve(ReportRangePreset::Custom, today, None).is_err());

        let same_day = ReportRange::new(today, today).unwrap();
        assert_eq!(same_day.start, same_day.end);
    }

    #[test]
    fn test_report_path_aliases() {
        let report: GeneratedReport =
            serde_json::from_str(r#"{"success": true, "reportPath": "reports/bp_1.pdf"}"#).unwrap();
        assert_eq!(report.report_path.as_deref(), Some("reports/bp_1.pdf"));
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("/srv/reports/bp_report_7.xlsx"), "bp_report_7.xlsx");
        assert_eq!(report_file_name("C:\\reports\\bp.pdf"), "bp.pdf");
        assert_eq!(report_file_name("plain.pdf"), "plain.pdf");
        assert_eq!(report_file_name(""), "report");
    }
}
