use crate::entities::blood_pressure::{BloodPressureCategory, BpReading, ReadingStats};

/// Categorize blood pressure based on measurements
pub fn categorize_blood_pressure(systolic: i32, diastolic: i32) -> BloodPressureCategory {
    if systolic >= 180 || diastolic >= 120 {
        BloodPressureCategory::HypertensiveCrisis
    } else if systolic >= 140 || diastolic >= 90 {
        BloodPressureCategory::Hypertension2
    } else if systolic >= 130 || diastolic >= 80 {
        BloodPressureCategory::Hypertension1
    } else if systolic >= 120 && diastolic < 80 {
        BloodPressureCategory::Elevated
    } else {
        BloodPressureCategory::Normal
    }
}

/// Summary statistics over a set of readings, `None` when there are none
pub fn calculate_reading_stats(readings: &[BpReading]) -> Option<ReadingStats> {
    if readings.is_empty() {
        return None;
    }

    let mut systolic_sum: f64 = 0.0;
    let mut diastolic_sum: f64 = 0.0;
    let mut pulse_sum: f64 = 0.0;
    let mut pulse_count: usize = 0;

    let mut max_systolic = i32::MIN;
    let mut max_diastolic = i32::MIN;
    let mut min_systolic = i32::MAX;
    let mut min_diastolic = i32::MAX;
    let mut abnormal_count = 0;

    for reading in readings {
        systolic_sum += reading.systolic as f64;
        diastolic_sum += reading.diastolic as f64;

        if let Some(pulse) = reading.pulse {
            pulse_sum += pulse as f64;
            pulse_count += 1;
        }

        if reading.is_abnormal {
            abnormal_count += 1;
        }

        max_systolic = max_systolic.max(reading.systolic);
        max_diastolic = max_diastolic.max(reading.diastolic);
        min_systolic = min_systolic.min(reading.systolic);
        min_diastolic = min_diastolic.min(reading.diastolic);
    }

    let count = readings.len() as f64;
    let avg_systolic = systolic_sum / count;
    let avg_diastolic = diastolic_sum / count;
    let avg_pulse = (pulse_count > 0).then(|| pulse_sum / pulse_count as f64);

    Some(ReadingStats {
        avg_systolic,
        avg_diastolic,
        avg_pulse,
        max_systolic,
        max_diastolic,
        min_systolic,
        min_diastolic,
        abnormal_count,
        reading_count: readings.len(),
        category: categorize_blood_pressure(avg_systolic.round() as i32, avg_diastolic.round() as i32),
    })
}
