use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use arena_core::{AvailabilityService, FlowError, FlowResult};
use arena_shared::{SlotSearchRequest, StationAvailability, StationId, TimeAvailabilityRequest};

/// Stateless wrapper over the availability service. The two query shapes never share
/// a code path.
#[derive(Clone)]
pub struct AvailabilityQuery {
    service: Arc<dyn AvailabilityService>,
}

impl AvailabilityQuery {
    pub fn new(service: Arc<dyn AvailabilityService>) -> Self {
        Self { service }
    }

    /// Which stations are free for a fixed window, keyed by station id.
    pub async fn by_time(
        &self,
        request: &TimeAvailabilityRequest,
    ) -> FlowResult<HashMap<StationId, StationAvailability>> {
        if request.start_time >= request.end_time {
            return Err(FlowError::validation("end time must be after start time"));
        }

        let rows = self.service.check_by_time(request).await.map_err(|e| {
            warn!("Availability by time failed for club {}: {}", request.club_id, e);
            FlowError::from(e)
        })?;

        let map: HashMap<_, _> = rows.into_iter().map(|row| (row.station.id, row)).collect();
        info!(
            "Club {} {}: {} stations, {} free",
            request.club_id,
            request.station_type,
            map.len(),
            map.values().filter(|r| r.available).count()
        );
        Ok(map)
    }

    /// Candidate start times for a fixed station set inside the search window, ascending
    /// and de-duplicated.
    pub async fn by_stations(
        &self,
        request: &SlotSearchRequest,
    ) -> FlowResult<Vec<DateTime<Utc>>> {
        if request.station_ids.is_empty() {
            return Err(FlowError::validation("select at least one station"));
        }
        if request.duration_hours == 0 {
            return Err(FlowError::validation("booking duration must be at least one hour"));
        }

        let mut slots = self.service.check_by_stations(request).await.map_err(|e| {
            warn!("Slot search failed for club {}: {}", request.club_id, e);
            FlowError::from(e)
        })?;

        let window = request.search_window;
        slots.retain(|slot| window.contains(*slot));
        slots.sort();
        slots.dedup();
        info!("Club {}: {} candidate slots", request.club_id, slots.len());
        Ok(slots)
    }
}
