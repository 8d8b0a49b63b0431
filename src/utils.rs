/// Utility functions for formatting readings and rendering the dashboard
use time::macros::format_description;
use time::OffsetDateTime;

use crate::aqi::AqiCategory;
use crate::dashboard::DashboardView;
use crate::models::SensorField;

/// Shown in place of a missing reading
pub const PLACEHOLDER: &str = "--";

/// Format a capture time for the chart axis
///
/// Produces HH:MM, or HH:MM:SS when `with_seconds` is set. The time is
/// rendered in whatever offset `dt` carries.
pub fn format_capture_time(dt: &OffsetDateTime, with_seconds: bool) -> String {
    let formatted = if with_seconds {
        dt.format(format_description!("[hour]:[minute]:[second]"))
    } else {
        dt.format(format_description!("[hour]:[minute]"))
    };
    formatted.unwrap_or_else(|_| dt.time().to_string())
}

/// Format a reading with one decimal place, or the placeholder if absent
pub fn format_reading(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}", v),
        None => PLACEHOLDER.to_string(),
    }
}

/// Render the dashboard view as plain text lines
///
/// Layout follows the dashboard: status, main PM2.5 display with its
/// category, one card per remaining reading, the trend table and the
/// category legend. Before the first snapshot only the status and a loading
/// line are produced.
pub fn render_view(view: &DashboardView) -> Vec<String> {
    let mut lines = vec![format!("Status: {}", view.status.text())];

    let latest = match &view.latest {
        Some(latest) => latest,
        None => {
            lines.push("Waiting for live data...".to_string());
            return lines;
        }
    };

    lines.push(format!(
        "PM2.5: {} {} [{}]",
        format_reading(latest.pm25),
        SensorField::Pm25.unit(),
        view.category.label()
    ));

    for field in SensorField::ALL.iter().skip(1) {
        lines.push(format!(
            "  {}: {} {}",
            field.title(),
            format_reading(latest.get(*field)),
            field.unit()
        ));
    }

    lines.push(format!(
        "Historical trends ({} of {} samples)",
        view.history.len(),
        view.capacity
    ));

    for series in &view.chart {
        if let Some((lo, hi)) = series.range {
            lines.push(format!("  {}: {:.1} .. {:.1}", series.name, lo, hi));
        }
    }

    let header: Vec<&str> = SensorField::ALL.iter().map(|f| f.series_name()).collect();
    lines.push(format!("  time  | {}", header.join(" | ")));

    for sample in &view.history {
        let values: Vec<String> = SensorField::ALL
            .iter()
            .map(|f| format_reading(sample.snapshot.get(*f)))
            .collect();
        lines.push(format!("  {} | {}", sample.time, values.join(" | ")));
    }

    let legend: Vec<String> = AqiCategory::ALL
        .iter()
        .map(|c| format!("{} ({})", c.label(), c.range_label()))
        .collect();
    lines.push(format!("PM2.5 levels: {}", legend.join(", ")));

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryWindow;
    use crate::models::{SensorSnapshot, TimestampedSample};
    use crate::status::ConnectionState;
    use rstest::rstest;
    use time::macros::datetime;

    #[rstest]
    #[case(None, "--")]
    #[case(Some(0.0), "0.0")]
    #[case(Some(42.0), "42.0")]
    #[case(Some(17.24), "17.2")]
    #[case(Some(-3.46), "-3.5")]
    fn test_format_reading(#[case] value: Option<f64>, #[case] expected: &str) {
        assert_eq!(format_reading(value), expected);
    }

    #[test]
    fn test_format_capture_time() {
        let dt = datetime!(2025-09-15 07:05:09 UTC);
        assert_eq!(format_capture_time(&dt, false), "07:05");
        assert_eq!(format_capture_time(&dt, true), "07:05:09");

        let dt = datetime!(2025-09-15 23:59:00 +5:30);
        assert_eq!(format_capture_time(&dt, false), "23:59");
    }

    #[test]
    fn test_render_before_data() {
        let view = DashboardView {
            status: ConnectionState::Connecting,
            latest: None,
            category: AqiCategory::Unknown,
            severity_rank: None,
            history: Vec::new(),
            chart: Vec::new(),
            capacity: 30,
        };

        assert_eq!(
            render_view(&view),
            vec!["Status: Connecting...", "Waiting for live data..."]
        );
    }

    #[test]
    fn test_render_with_data() {
        let latest = SensorSnapshot {
            pm25: Some(75.0),
            co2: Some(412.0),
            ..Default::default()
        };
        let mut window = HistoryWindow::with_capacity(30);
        window.push(TimestampedSample {
            time: "10:00".into(),
            snapshot: latest,
        });
        let view = DashboardView {
            status: ConnectionState::Live,
            latest: Some(latest),
            category: AqiCategory::Moderate,
            severity_rank: Some(2),
            history: window.to_vec(),
            chart: window.chart(),
            capacity: 30,
        };

        let lines = render_view(&view);
        assert_eq!(lines[0], "Status: Live");
        assert_eq!(lines[1], "PM2.5: 75.0 µg/m³ [Moderate]");
        assert!(lines.contains(&"  PM10: -- µg/m³".to_string()));
        assert!(lines.contains(&"  Carbon Dioxide (CO₂): 412.0 ppm".to_string()));
        assert!(lines.contains(&"Historical trends (1 of 30 samples)".to_string()));
        assert!(lines.contains(&"  PM2.5: 75.0 .. 75.0".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("  PM10: ") && l.contains("..")));
        assert!(lines.contains(&"  10:00 | 75.0 | -- | 412.0 | -- | -- | -- | --".to_string()));
        assert!(lines.last().unwrap().contains("Very Poor (121-250)"));
    }
}
