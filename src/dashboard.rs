/// Live dashboard state fed by subscription events
use log::{debug, error, info, warn};
use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};
use tokio::sync::{mpsc, watch};

use crate::aqi::{classify, AqiCategory};
use crate::config::DashboardConfig;
use crate::history::{ChartSeries, HistoryWindow};
use crate::models::{SensorSnapshot, SnapshotEvent, TimestampedSample};
use crate::status::ConnectionState;
use crate::utils::format_capture_time;

/// Everything the presentation needs after an update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub status: ConnectionState,
    pub latest: Option<SensorSnapshot>,
    pub category: AqiCategory,
    pub severity_rank: Option<u8>,
    pub history: Vec<TimestampedSample>,
    pub chart: Vec<ChartSeries>,
    pub capacity: usize,
}

/// Sole owner of the history window and connection status.
///
/// Events must be applied in the order the subscription delivered them.
#[derive(Debug)]
pub struct Dashboard {
    window: HistoryWindow,
    status: ConnectionState,
    latest: Option<SensorSnapshot>,
    utc_offset: UtcOffset,
    time_with_seconds: bool,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig) -> Self {
        Self {
            utc_offset: config.utc_offset,
            time_with_seconds: config.time_with_seconds,
            ..Self::with_capacity(config.history_capacity)
        }
    }

    /// A dashboard stamping samples in UTC with minute resolution
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            window: HistoryWindow::with_capacity(capacity),
            status: ConnectionState::default(),
            latest: None,
            utc_offset: UtcOffset::UTC,
            time_with_seconds: false,
        }
    }

    /// Apply an event received just now
    pub fn apply(&mut self, event: SnapshotEvent) -> DashboardView {
        self.apply_at(event, OffsetDateTime::now_utc())
    }

    /// Apply an event received at `received_at`
    pub fn apply_at(&mut self, event: SnapshotEvent, received_at: OffsetDateTime) -> DashboardView {
        self.status = self.status.reduce(&event);

        match event {
            SnapshotEvent::Data(snapshot) => {
                let local = received_at.to_offset(self.utc_offset);
                let time = format_capture_time(&local, self.time_with_seconds);
                self.window.push(TimestampedSample { time, snapshot });
                self.latest = Some(snapshot);
                debug!(
                    "Snapshot received: pm25={:?} ({} samples kept)",
                    snapshot.pm25,
                    self.window.len()
                );
            }
            SnapshotEvent::Empty => {
                warn!("Sensor path holds no data");
                self.latest = None;
            }
            SnapshotEvent::Resumed => {
                info!("Sensor subscription resumed");
            }
            SnapshotEvent::Error(reason) => {
                error!("Sensor subscription failed: {}", reason);
            }
        }

        self.view()
    }

    /// Current view, classified from the latest snapshot
    pub fn view(&self) -> DashboardView {
        let category = classify(self.latest.and_then(|s| s.pm25));

        DashboardView {
            status: self.status,
            latest: self.latest,
            category,
            severity_rank: category.rank(),
            history: self.window.to_vec(),
            chart: self.window.chart(),
            capacity: self.window.capacity(),
        }
    }

    /// Consume events until the transport side closes, publishing a view
    /// after each one.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<SnapshotEvent>,
        views: watch::Sender<DashboardView>,
    ) {
        info!("Dashboard started");

        while let Some(event) = events.recv().await {
            let view = self.apply(event);
            if views.send(view).is_err() {
                debug!("No view receivers left");
                break;
            }
        }

        info!("Dashboard stopped");
    }
}
