use async_trait::async_trait;

use arena_core::{BookingService, ServiceResult};
use arena_shared::{ActiveScope, Booking, BookingIntent, ClubId, CreateIntentRequest};

use crate::http::ApiClient;

pub const DOMAIN: &str = "BOOKING";

pub struct HttpBookingService {
    api: ApiClient,
}

impl HttpBookingService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl BookingService for HttpBookingService {
    async fn create_intent(&self, request: &CreateIntentRequest) -> ServiceResult<BookingIntent> {
        self.api.post("/intents", request).await
    }

    async fn get_active_intents(&self, scope: ActiveScope) -> ServiceResult<Vec<BookingIntent>> {
        match scope {
            ActiveScope::Player => self.api.get("/intents/active").await,
            ActiveScope::Club(club_id) => {
                self.api
                    .get(&format!("/clubs/{}/intents/active", club_id))
                    .await
            }
        }
    }

    async fn cancel_intent(&self, club_id: ClubId, intent_id: &str) -> ServiceResult<()> {
        self.api
            .delete(&format!("/clubs/{}/intents/{}", club_id, intent_id))
            .await
    }

    async fn get_booking_by_intent_id(
        &self,
        club_id: ClubId,
        intent_id: &str,
    ) -> ServiceResult<Booking> {
        self.api
            .get(&format!("/clubs/{}/intents/{}/booking", club_id, intent_id))
            .await
    }
}
