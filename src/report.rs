use serde::Serialize;

use crate::stats::TimingStats;

/// Snapshot quality summary for one data stream.
///
/// Recomputed fresh on every request; the source series is immutable per
/// load, so nothing is cached.
#[derive(Clone, Debug, Serialize)]
pub struct SeriesQualityReport {
    pub sample_count: usize,
    /// `None` below two samples (insufficient data).
    pub timing: Option<TimingStats>,
    /// GNSS only: fraction of fixes with integer-ambiguity resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_ratio: Option<f64>,
    /// IMU only: resolved hardware model id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imu_model: Option<u32>,
}

impl SeriesQualityReport {
    /// Render the report as console text, `label` naming the stream
    /// ("GNSS" or "IMU"). Percentages and minutes at 2 decimals.
    pub fn render(&self, label: &str) -> String {
        if self.sample_count == 0 {
            return format!("No {label} data available.\n");
        }
        let timing = match &self.timing {
            Some(timing) => timing,
            None => return format!("Not enough {label} data to calculate statistics.\n"),
        };

        let mut out = String::new();
        if let Some(model) = self.imu_model {
            out.push_str(&format!("{label} Model: {model}\n"));
        }
        out.push_str(&format!(
            "{label} Samples: {} ({:.2} minutes)\n",
            self.sample_count, timing.duration_minutes
        ));
        out.push_str(&format!("{label} Freq: {:.2} Hz\n", timing.frequency_hz));
        out.push_str(&format!(
            "{label} Gaps: {} ({:.2}%)\n",
            timing.gap_count,
            timing.gap_ratio * 100.0
        ));
        if let Some(ratio) = self.fix_ratio {
            out.push_str(&format!("{label} Quality: {:.2}%\n", ratio * 100.0));
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> TimingStats {
        TimingStats {
            sample_count: 100,
            duration_minutes: 1.5,
            median_interval_s: 0.2,
            frequency_hz: 5.0,
            gap_count: 25,
            gap_ratio: 0.25,
        }
    }

    #[test]
    fn test_gnss_report_text() {
        let report = SeriesQualityReport {
            sample_count: 100,
            timing: Some(timing()),
            fix_ratio: Some(0.75),
            imu_model: None,
        };
        let text = report.render("GNSS");
        assert!(text.contains("GNSS Samples: 100 (1.50 minutes)\n"));
        assert!(text.contains("GNSS Freq: 5.00 Hz\n"));
        assert!(text.contains("GNSS Gaps: 25 (25.00%)\n"));
        assert!(text.contains("GNSS Quality: 75.00%\n"));
        assert!(!text.contains("Model"));
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_imu_report_text() {
        let report = SeriesQualityReport {
            sample_count: 100,
            timing: Some(timing()),
            fix_ratio: None,
            imu_model: Some(16495),
        };
        let text = report.render("IMU");
        assert!(text.starts_with("IMU Model: 16495\n"));
        assert!(text.contains("IMU Samples: 100 (1.50 minutes)\n"));
        assert!(!text.contains("Quality"));
    }

    #[test]
    fn test_insufficient_data_message() {
        let report = SeriesQualityReport {
            sample_count: 1,
            timing: None,
            fix_ratio: Some(1.0),
            imu_model: None,
        };
        assert_eq!(
            report.render("GNSS"),
            "Not enough GNSS data to calculate statistics.\n"
        );
    }

    #[test]
    fn test_empty_dataset_message() {
        let report = SeriesQualityReport {
            sample_count: 0,
            timing: None,
            fix_ratio: None,
            imu_model: None,
        };
        assert_eq!(report.render("IMU"), "No IMU data available.\n");
    }

    #[test]
    fn test_json_omits_absent_context_fields() {
        let report = SeriesQualityReport {
            sample_count: 100,
            timing: Some(timing()),
            fix_ratio: Some(0.75),
            imu_model: None,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("fix_ratio"));
        assert!(!json.contains("imu_model"));
    }
}
