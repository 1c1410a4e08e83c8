use std::sync::Arc;
use tracing::{info, warn};

use arena_core::{BookingService, FlowError, FlowResult};
use arena_shared::{Booking, ClubId};

/// Retrieves the final booking once payment has settled.
#[derive(Clone)]
pub struct ConfirmationFetcher {
    booking: Arc<dyn BookingService>,
}

impl ConfirmationFetcher {
    pub fn new(booking: Arc<dyn BookingService>) -> Self {
        Self { booking }
    }

    pub async fn fetch(&self, club_id: ClubId, intent_id: &str) -> FlowResult<Booking> {
        let booking = self
            .booking
            .get_booking_by_intent_id(club_id, intent_id)
            .await
            .map_err(|e| {
                warn!("Confirmation fetch for intent {} failed: {}", intent_id, e);
                FlowError::from(e)
            })?;

        if booking.intent_id != intent_id {
            warn!(
                "Booking {} belongs to intent {}, expected {}",
                booking.booking_id, booking.intent_id, intent_id
            );
            return Err(FlowError::service("booking service returned a different booking"));
        }

        info!("Booking {} confirmed for intent {}", booking.booking_id, intent_id);
        Ok(booking)
    }
}
