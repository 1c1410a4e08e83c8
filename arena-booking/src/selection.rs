use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use arena_core::{FlowError, FlowResult};
use arena_shared::{
    ClubId, CreateIntentRequest, Identity, Masked, SearchWindow, SlotSearchRequest, Station,
    StationAvailability, StationId, StationSelection, TimeAvailabilityRequest,
};

use crate::availability::AvailabilityQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Fixed start/end; stations picked from the availability map.
    TimeBased,
    /// Fixed station set; start picked from the server's candidate slots.
    StationBased,
}

/// Holds the in-progress, not-yet-committed choice.
///
/// Anything that changes what an availability answer means (club, station type, mode,
/// window) clears every downstream selection so old and new data never mix.
#[derive(Debug, Clone)]
pub struct SelectionManager {
    mode: SelectionMode,
    club_id: Option<ClubId>,
    station_type: Option<String>,

    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    available_stations: HashMap<StationId, StationAvailability>,

    catalog: HashMap<StationId, Station>,
    search_window: Option<SearchWindow>,
    booking_duration_hours: u32,
    available_slots: Vec<DateTime<Utc>>,
    selected_slot: Option<DateTime<Utc>>,

    selected: BTreeMap<StationId, u32>,
    target_phone: Option<Masked<String>>,
}

impl SelectionManager {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            club_id: None,
            station_type: None,
            start_time: None,
            end_time: None,
            available_stations: HashMap::new(),
            catalog: HashMap::new(),
            search_window: None,
            booking_duration_hours: 1,
            available_slots: Vec::new(),
            selected_slot: None,
            selected: BTreeMap::new(),
            target_phone: None,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn club_id(&self) -> Option<ClubId> {
        self.club_id
    }

    pub fn station_type(&self) -> Option<&str> {
        self.station_type.as_deref()
    }

    pub fn available_stations(&self) -> &HashMap<StationId, StationAvailability> {
        &self.available_stations
    }

    pub fn available_slots(&self) -> &[DateTime<Utc>] {
        &self.available_slots
    }

    pub fn selected_slot(&self) -> Option<DateTime<Utc>> {
        self.selected_slot
    }

    pub fn booking_duration_hours(&self) -> u32 {
        self.booking_duration_hours
    }

    /// Current selection, ordered by station id.
    pub fn selected_stations(&self) -> Vec<StationSelection> {
        self.selected
            .iter()
            .map(|(&station_id, &player_count)| StationSelection {
                station_id,
                player_count,
            })
            .collect()
    }

    pub fn is_selected(&self, station_id: StationId) -> bool {
        self.selected.contains_key(&station_id)
    }

    pub fn player_count(&self, station_id: StationId) -> Option<u32> {
        self.selected.get(&station_id).copied()
    }

    pub fn set_club(&mut self, club_id: ClubId) {
        if self.club_id != Some(club_id) {
            self.club_id = Some(club_id);
            self.catalog.clear();
            self.clear_downstream();
        }
    }

    pub fn set_station_type(&mut self, station_type: impl Into<String>) {
        let station_type = station_type.into();
        if self.station_type.as_deref() != Some(station_type.as_str()) {
            debug!("Station type -> {}", station_type);
            self.station_type = Some(station_type);
            self.catalog.clear();
            self.clear_downstream();
        }
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        if self.mode != mode {
            debug!("Selection mode -> {:?}", mode);
            self.mode = mode;
            self.clear_downstream();
        }
    }

    /// Club's stations of the current type, used as choices in station-based mode.
    pub fn load_catalog(&mut self, stations: Vec<Station>) {
        let station_type = self.station_type.clone();
        self.catalog = stations
            .into_iter()
            .filter(|s| station_type.as_deref().map_or(true, |t| s.station_type == t))
            .map(|s| (s.id, s))
            .collect();
        self.selected.retain(|id, _| self.catalog.contains_key(id));
    }

    /// Time-based window. A new window invalidates the availability answer.
    pub fn set_time_range(&mut self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) {
        if self.start_time != Some(start_time) || self.end_time != Some(end_time) {
            self.start_time = Some(start_time);
            self.end_time = Some(end_time);
            if self.mode == SelectionMode::TimeBased {
                self.clear_downstream();
            }
        }
    }

    pub fn set_search_window(&mut self, window: SearchWindow) {
        if self.search_window != Some(window) {
            self.search_window = Some(window);
            self.clear_slots();
        }
    }

    pub fn set_booking_duration(&mut self, hours: u32) -> FlowResult<()> {
        if hours == 0 {
            return Err(FlowError::validation("booking duration must be at least one hour"));
        }
        if self.booking_duration_hours != hours {
            self.booking_duration_hours = hours;
            self.clear_slots();
        }
        Ok(())
    }

    pub fn set_target_phone(&mut self, phone: Option<String>) {
        self.target_phone = phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(Masked);
    }

    /// Add or remove a station. Returns whether it is selected afterwards.
    ///
    /// (Re-)selection always starts at one player.
    pub fn toggle_station(&mut self, station_id: StationId) -> FlowResult<bool> {
        if self.selected.remove(&station_id).is_some() {
            if self.mode == SelectionMode::StationBased {
                self.clear_slots();
            }
            return Ok(false);
        }

        self.selectable_capacity(station_id)?;
        self.selected.insert(station_id, 1);
        if self.mode == SelectionMode::StationBased {
            self.clear_slots();
        }
        Ok(true)
    }

    /// Rejected without mutating when outside `1..=capacity`.
    pub fn set_player_count(&mut self, station_id: StationId, count: u32) -> FlowResult<()> {
        if !self.selected.contains_key(&station_id) {
            return Err(FlowError::validation(format!(
                "station {} is not selected",
                station_id
            )));
        }
        let capacity = self.capacity_of(station_id).ok_or_else(|| {
            FlowError::validation(format!("station {} is no longer offered", station_id))
        })?;
        if count < 1 || count > capacity {
            return Err(FlowError::validation(format!(
                "player count for station {} must be between 1 and {}",
                station_id, capacity
            )));
        }

        self.selected.insert(station_id, count);
        Ok(())
    }

    pub fn can_increment(&self, station_id: StationId) -> bool {
        match (self.player_count(station_id), self.capacity_of(station_id)) {
            (Some(count), Some(capacity)) => count < capacity,
            _ => false,
        }
    }

    pub fn can_decrement(&self, station_id: StationId) -> bool {
        self.player_count(station_id).map_or(false, |count| count > 1)
    }

    pub fn increment(&mut self, station_id: StationId) -> FlowResult<u32> {
        let next = self.player_count(station_id).unwrap_or(0).saturating_add(1);
        self.set_player_count(station_id, next)?;
        Ok(next)
    }

    pub fn decrement(&mut self, station_id: StationId) -> FlowResult<u32> {
        let next = self.player_count(station_id).unwrap_or(0).saturating_sub(1);
        self.set_player_count(station_id, next)?;
        Ok(next)
    }

    pub fn select_slot(&mut self, slot: DateTime<Utc>) -> FlowResult<()> {
        if self.mode != SelectionMode::StationBased {
            return Err(FlowError::validation("slots are only used in station-based mode"));
        }
        if !self.available_slots.contains(&slot) {
            return Err(FlowError::validation("slot is not among the available slots"));
        }
        self.selected_slot = Some(slot);
        Ok(())
    }

    /// Explicit, user-triggered query. On success the previous answer is replaced, not merged.
    pub async fn check_availability(&mut self, query: &AvailabilityQuery) -> FlowResult<()> {
        let club_id = self
            .club_id
            .ok_or_else(|| FlowError::validation("select a club first"))?;
        let station_type = self
            .station_type
            .clone()
            .ok_or_else(|| FlowError::validation("select a station type first"))?;

        match self.mode {
            SelectionMode::TimeBased => {
                let (start_time, end_time) = match (self.start_time, self.end_time) {
                    (Some(s), Some(e)) => (s, e),
                    _ => return Err(FlowError::validation("start and end time are required")),
                };
                let request = TimeAvailabilityRequest {
                    club_id,
                    station_type,
                    start_time,
                    end_time,
                };
                let map = query.by_time(&request).await?;

                self.available_stations = map;
                self.selected.clear();
                self.clear_slots();
            }
            SelectionMode::StationBased => {
                let search_window = self
                    .search_window
                    .ok_or_else(|| FlowError::validation("a search window is required"))?;
                let request = SlotSearchRequest {
                    club_id,
                    station_type,
                    station_ids: self.selected.keys().copied().collect(),
                    duration_hours: self.booking_duration_hours,
                    search_window,
                };
                let slots = query.by_stations(&request).await?;

                self.available_slots = slots;
                self.selected_slot = None;
            }
        }
        Ok(())
    }

    /// Start/end from the time fields, or `selected_slot + duration` in station mode.
    pub fn resolved_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match self.mode {
            SelectionMode::TimeBased => match (self.start_time, self.end_time) {
                (Some(s), Some(e)) if s < e => Some((s, e)),
                _ => None,
            },
            SelectionMode::StationBased => self.selected_slot.map(|slot| {
                (
                    slot,
                    slot + Duration::hours(i64::from(self.booking_duration_hours)),
                )
            }),
        }
    }

    /// Builds the create-intent body, failing fast on any missing precondition.
    pub fn build_request(&self, identity: &Identity) -> FlowResult<CreateIntentRequest> {
        let club_id = self
            .club_id
            .ok_or_else(|| FlowError::validation("club is required"))?;
        let station_type = self
            .station_type
            .clone()
            .ok_or_else(|| FlowError::validation("station type is required"))?;
        if self.selected.is_empty() {
            return Err(FlowError::validation("select at least one station"));
        }
        let (start_time, end_time) = self.resolved_window().ok_or_else(|| match self.mode {
            SelectionMode::TimeBased => FlowError::validation("start and end time are required"),
            SelectionMode::StationBased => FlowError::validation("select a start slot"),
        })?;

        let stations = self.selected_stations();
        for selection in &stations {
            let capacity = self.capacity_of(selection.station_id).ok_or_else(|| {
                FlowError::validation(format!(
                    "station {} is no longer offered",
                    selection.station_id
                ))
            })?;
            if !selection.fits(capacity) {
                return Err(FlowError::validation(format!(
                    "player count for station {} must be between 1 and {}",
                    selection.station_id, capacity
                )));
            }
        }

        let phone_number = if identity.is_proxy_booker() {
            Some(self.target_phone.clone().ok_or_else(|| {
                FlowError::validation("a phone number is required when booking for a player")
            })?)
        } else {
            None
        };

        Ok(CreateIntentRequest {
            club_id,
            station_type,
            stations,
            start_time,
            end_time,
            phone_number,
        })
    }

    /// Drops the draft once it has been promoted into an intent.
    pub fn clear_draft(&mut self) {
        self.selected.clear();
        self.selected_slot = None;
        self.target_phone = None;
    }

    fn capacity_of(&self, station_id: StationId) -> Option<u32> {
        match self.mode {
            SelectionMode::TimeBased => self
                .available_stations
                .get(&station_id)
                .map(|row| row.station.capacity),
            SelectionMode::StationBased => self.catalog.get(&station_id).map(|s| s.capacity),
        }
    }

    fn selectable_capacity(&self, station_id: StationId) -> FlowResult<u32> {
        match self.mode {
            SelectionMode::TimeBased => match self.available_stations.get(&station_id) {
                Some(row) if row.available => Ok(row.station.capacity),
                Some(_) => Err(FlowError::validation(format!(
                    "station {} is not available for this window",
                    station_id
                ))),
                None => Err(FlowError::validation(format!(
                    "station {} is not in the availability results",
                    station_id
                ))),
            },
            SelectionMode::StationBased => self
                .catalog
                .get(&station_id)
                .map(|s| s.capacity)
                .ok_or_else(|| {
                    FlowError::validation(format!("station {} is not offered", station_id))
                }),
        }
    }

    fn clear_slots(&mut self) {
        self.available_slots.clear();
        self.selected_slot = None;
    }

    fn clear_downstream(&mut self) {
        self.available_stations.clear();
        self.selected.clear();
        self.clear_slots();
    }
}

impl Default for SelectionManager {
    fn default() -> Self {
        Self::new(SelectionMode::TimeBased)
    }
}
