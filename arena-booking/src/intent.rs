use std::sync::Arc;
use tracing::{info, warn};

use arena_core::{BookingService, FlowError, FlowResult};
use arena_shared::{BookingIntent, ClubId, Identity};

use crate::registry::ActiveIntentRegistry;
use crate::selection::SelectionManager;

/// Turns a committed selection into a server-issued intent, and cancels intents.
#[derive(Clone)]
pub struct IntentLifecycle {
    booking: Arc<dyn BookingService>,
    identity: Identity,
}

impl IntentLifecycle {
    pub fn new(booking: Arc<dyn BookingService>, identity: Identity) -> Self {
        Self { booking, identity }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Create an intent from the draft selection.
    ///
    /// Preconditions are checked before any network call. On success the intent is
    /// tracked in the registry and the draft is dropped; on failure the draft is kept.
    pub async fn commit(
        &self,
        selection: &mut SelectionManager,
        registry: &mut ActiveIntentRegistry,
    ) -> FlowResult<BookingIntent> {
        let request = selection.build_request(&self.identity)?;

        let intent = self.booking.create_intent(&request).await.map_err(|e| {
            warn!("Create intent failed for club {}: {}", request.club_id, e);
            FlowError::from(e)
        })?;

        if intent.intent_id.is_empty() {
            return Err(FlowError::service("booking service returned an intent without an id"));
        }

        info!(
            "Intent {} created for club {} ({} stations), expires at {}",
            intent.intent_id,
            intent.club_id,
            intent.stations.len(),
            intent.expires_at
        );

        registry.insert(intent.clone());
        selection.clear_draft();
        Ok(intent)
    }

    /// Cancel an intent server-side, then drop it from the registry.
    ///
    /// A failed cancel (e.g. the intent was already paid) leaves the registry untouched.
    pub async fn cancel(
        &self,
        club_id: ClubId,
        intent_id: &str,
        registry: &mut ActiveIntentRegistry,
    ) -> FlowResult<()> {
        if !self.identity.is_authenticated() {
            return Err(FlowError::validation("sign in to cancel a booking"));
        }
        if intent_id.is_empty() {
            return Err(FlowError::validation("intent id is required"));
        }

        self.booking
            .cancel_intent(club_id, intent_id)
            .await
            .map_err(|e| {
                warn!("Cancel of intent {} failed: {}", intent_id, e);
                FlowError::from(e)
            })?;

        registry.remove(intent_id);
        info!("Intent {} cancelled", intent_id);
        Ok(())
    }
}
