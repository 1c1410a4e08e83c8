use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::StationId;

/// A bookable station (a PC, a console, a table) as listed by the club directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub station_type: String,
    pub capacity: u32,
}

/// One station in a draft or committed selection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StationSelection {
    pub station_id: StationId,
    pub player_count: u32,
}

impl StationSelection {
    pub fn new(station_id: StationId) -> Self {
        Self {
            station_id,
            player_count: 1,
        }
    }

    /// `1 <= player_count <= capacity`
    pub fn fits(&self, capacity: u32) -> bool {
        self.player_count >= 1 && self.player_count <= capacity
    }
}

/// Bounds a slot search in station-based mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchWindow {
    pub start_time: DateTime<Utc>,
    pub window_hours: u32,
}

impl SearchWindow {
    pub fn new(start_time: DateTime<Utc>, window_hours: u32) -> Self {
        Self {
            start_time,
            window_hours,
        }
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::hours(i64::from(self.window_hours))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start_time && instant < self.end_time()
    }
}
