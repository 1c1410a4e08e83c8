use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use arena_core::{AvailabilityService, ServiceResult};
use arena_shared::{SlotSearchRequest, StationAvailability, TimeAvailabilityRequest};

use crate::http::ApiClient;

pub const DOMAIN: &str = "AVAILABILITY";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotSearchResponse {
    start_times: Vec<DateTime<Utc>>,
}

pub struct HttpAvailabilityService {
    api: ApiClient,
}

impl HttpAvailabilityService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AvailabilityService for HttpAvailabilityService {
    async fn check_by_time(
        &self,
        request: &TimeAvailabilityRequest,
    ) -> ServiceResult<Vec<StationAvailability>> {
        self.api.post("/availability/by-time", request).await
    }

    async fn check_by_stations(
        &self,
        request: &SlotSearchRequest,
    ) -> ServiceResult<Vec<DateTime<Utc>>> {
        let response: SlotSearchResponse =
            self.api.post("/availability/by-stations", request).await?;
        Ok(response.start_times)
    }
}
