use async_trait::async_trait;
use chrono::{DateTime, Utc};

use arena_shared::{
    ActiveScope, Booking, BookingIntent, ClubId, CreateIntentRequest, InitPaymentRequest,
    InitPaymentResponse, PaymentStatusResponse, SlotSearchRequest, StationAvailability,
    TimeAvailabilityRequest,
};

use crate::api_error::ApiError;

pub type ServiceResult<T> = Result<T, ApiError>;

/// External booking service.
#[async_trait]
pub trait BookingService: Send + Sync {
    /// Create an intent from a committed selection
    async fn create_intent(&self, request: &CreateIntentRequest) -> ServiceResult<BookingIntent>;

    /// All still-live intents visible to the scope
    async fn get_active_intents(&self, scope: ActiveScope) -> ServiceResult<Vec<BookingIntent>>;

    async fn cancel_intent(&self, club_id: ClubId, intent_id: &str) -> ServiceResult<()>;

    /// Final booking record for a settled intent
    async fn get_booking_by_intent_id(
        &self,
        club_id: ClubId,
        intent_id: &str,
    ) -> ServiceResult<Booking>;
}

/// External payment service.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn init_payment(
        &self,
        request: &InitPaymentRequest,
    ) -> ServiceResult<InitPaymentResponse>;

    async fn get_payment_status(&self, payment_id: &str) -> ServiceResult<PaymentStatusResponse>;
}

/// External availability service.
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    async fn check_by_time(
        &self,
        request: &TimeAvailabilityRequest,
    ) -> ServiceResult<Vec<StationAvailability>>;

    /// Candidate start times for a fixed station set
    async fn check_by_stations(
        &self,
        request: &SlotSearchRequest,
    ) -> ServiceResult<Vec<DateTime<Utc>>>;
}
