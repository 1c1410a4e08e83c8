use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::station::{SearchWindow, Station};
use crate::{ClubId, StationId};

/// By-time query: which stations of a type are free for a fixed window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeAvailabilityRequest {
    pub club_id: ClubId,
    pub station_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// One row of a by-time availability answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StationAvailability {
    pub station: Station,
    pub available: bool,
}

/// By-station query: candidate start times for a fixed station set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotSearchRequest {
    pub club_id: ClubId,
    pub station_type: String,
    pub station_ids: Vec<StationId>,
    pub duration_hours: u32,
    pub search_window: SearchWindow,
}
