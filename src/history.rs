/// Bounded history of received samples for the trend chart
use serde::Serialize;
use std::collections::VecDeque;

use crate::models::{SensorField, TimestampedSample};

pub const DEFAULT_CAPACITY: usize = 30;

/// Largest window the configuration accepts
pub const MAX_CAPACITY: usize = 10_000;

/// Data for one line of the trend chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub key: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub points: Vec<(String, Option<f64>)>,
    pub range: Option<(f64, f64)>,
}

/// Keeps the most recent `capacity` samples, oldest first.
///
/// Samples are never reordered or merged, two updates stamped with the same
/// minute are both kept.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    samples: VecDeque<TimestampedSample>,
    capacity: usize,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl HistoryWindow {
    /// Create an empty window. A capacity of zero is raised to one.
    ///
    /// Storage grows with the samples, only the default size is reserved up
    /// front.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest ones beyond capacity.
    pub fn push(&mut self, sample: TimestampedSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate samples oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = &TimestampedSample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<TimestampedSample> {
        self.iter().cloned().collect()
    }

    /// Chart points for one field as `(time, value)` pairs.
    /// Gaps stay in place as `None` so the time axis lines up across series.
    pub fn series(&self, field: SensorField) -> Vec<(String, Option<f64>)> {
        self.iter()
            .map(|s| (s.time.clone(), s.snapshot.get(field)))
            .collect()
    }

    /// Min/max of the present values of a field.
    pub fn range(&self, field: SensorField) -> Option<(f64, f64)> {
        self.iter()
            .filter_map(|s| s.snapshot.get(field))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// All chart series, in legend order
    pub fn chart(&self) -> Vec<ChartSeries> {
        SensorField::ALL
            .iter()
            .map(|&field| ChartSeries {
                key: field.key(),
                name: field.series_name(),
                color: field.color(),
                points: self.series(field),
                range: self.range(field),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SensorSnapshot;

    fn sample(time: &str, pm25: Option<f64>) -> TimestampedSample {
        TimestampedSample {
            time: time.to_string(),
            snapshot: SensorSnapshot {
                pm25,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_first_push() {
        let mut window = HistoryWindow::with_capacity(30);
        assert_eq!(window.len(), 0);

        window.push(sample("10:00", Some(12.0)));

        assert_eq!(window.len(), 1);
        assert_eq!(window.to_vec(), vec![sample("10:00", Some(12.0))]);
    }

    #[test]
    fn test_keeps_last_n_in_order() {
        let capacity = 5;
        let mut window = HistoryWindow::with_capacity(capacity);

        for i in 0..12 {
            window.push(sample(&format!("10:{i:02}"), Some(i as f64)));
            assert!(window.len() <= capacity);
        }

        let values: Vec<_> = window.iter().map(|s| s.snapshot.pm25).collect();
        assert_eq!(
            values,
            vec![Some(7.0), Some(8.0), Some(9.0), Some(10.0), Some(11.0)]
        );
        assert_eq!(window.iter().next().unwrap().time, "10:07");
    }

    #[test]
    fn test_same_minute_not_merged() {
        let mut window = HistoryWindow::default();
        window.push(sample("10:00", Some(1.0)));
        window.push(sample("10:00", Some(1.0)));

        assert_eq!(window.len(), 2);
        assert_eq!(window.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn test_zero_capacity_raised() {
        let mut window = HistoryWindow::with_capacity(0);
        window.push(sample("10:00", Some(1.0)));
        window.push(sample("10:01", Some(2.0)));

        assert_eq!(window.capacity(), 1);
        assert_eq!(window.to_vec(), vec![sample("10:01", Some(2.0))]);
    }

    #[test]
    fn test_huge_capacity_allocates_lazily() {
        let mut window = HistoryWindow::with_capacity(usize::MAX);
        window.push(sample("10:00", Some(1.0)));
        window.push(sample("10:01", Some(2.0)));

        assert_eq!(window.capacity(), usize::MAX);
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_series_and_range() {
        let mut window = HistoryWindow::with_capacity(4);
        window.push(sample("10:00", Some(40.0)));
        window.push(sample("10:01", None));
        window.push(sample("10:02", Some(12.5)));

        assert_eq!(
            window.series(SensorField::Pm25),
            vec![
                ("10:00".to_string(), Some(40.0)),
                ("10:01".to_string(), None),
                ("10:02".to_string(), Some(12.5)),
            ]
        );
        assert_eq!(window.range(SensorField::Pm25), Some((12.5, 40.0)));
        assert_eq!(window.range(SensorField::Humidity), None);
    }

    #[test]
    fn test_chart_covers_every_field() {
        let mut window = HistoryWindow::with_capacity(4);
        window.push(sample("10:00", Some(40.0)));

        let chart = window.chart();
        let names: Vec<_> = chart.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            ["PM2.5", "PM10", "CO₂", "NOx", "AQI (MQ135)", "Temp (°C)", "Humidity (%)"]
        );
        assert_eq!(chart[0].key, "pm25");
        assert_eq!(chart[0].color, "#f87171");
        assert_eq!(chart[0].range, Some((40.0, 40.0)));
        assert_eq!(chart[1].points, vec![("10:00".to_string(), None)]);
    }
}
