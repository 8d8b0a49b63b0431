/// Connection status of the sensor subscription
use serde::Serialize;

use crate::models::SnapshotEvent;

/// Last observed outcome of the subscription.
///
/// There is no terminal state, every event moves the status directly to the
/// state it implies regardless of where it was before.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionState {
    #[default]
    Connecting,
    Live,
    NoData,
    Error,
}

impl ConnectionState {
    pub fn reduce(self, event: &SnapshotEvent) -> ConnectionState {
        match event {
            SnapshotEvent::Data(_) | SnapshotEvent::Resumed => ConnectionState::Live,
            SnapshotEvent::Empty => ConnectionState::NoData,
            SnapshotEvent::Error(_) => ConnectionState::Error,
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Live => "Live",
            ConnectionState::NoData => "No Data",
            ConnectionState::Error => "Error",
        }
    }
}
