use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

use arena_core::{BookingService, FlowError, FlowResult};
use arena_shared::{ActiveScope, BookingIntent};

/// Previously created, still-live intents the user can resume or cancel.
///
/// Keyed by `intent_id`; expiry is advisory and never removes entries here.
#[derive(Debug, Default, Clone)]
pub struct ActiveIntentRegistry {
    intents: HashMap<String, BookingIntent>,
}

impl ActiveIntentRegistry {
    pub fn new() -> Self {
        Self {
            intents: HashMap::new(),
        }
    }

    /// Fetch the scope's active intents and replace the whole map with them.
    ///
    /// On failure the current map is left as it was.
    pub async fn fetch_active(
        &mut self,
        service: &dyn BookingService,
        scope: ActiveScope,
    ) -> FlowResult<usize> {
        let intents = service.get_active_intents(scope).await.map_err(|e| {
            warn!("Fetching active intents for {:?} failed: {}", scope, e);
            FlowError::from(e)
        })?;

        let count = self.replace_all(intents);
        info!("Loaded {} active intents for {:?}", count, scope);
        Ok(count)
    }

    pub fn replace_all(&mut self, intents: Vec<BookingIntent>) -> usize {
        self.intents = intents
            .into_iter()
            .map(|intent| (intent.intent_id.clone(), intent))
            .collect();
        self.intents.len()
    }

    /// Track a freshly created intent
    pub fn insert(&mut self, intent: BookingIntent) -> Option<BookingIntent> {
        self.intents.insert(intent.intent_id.clone(), intent)
    }

    /// Called after a successful cancel or a completed payment.
    pub fn remove(&mut self, intent_id: &str) -> Option<BookingIntent> {
        self.intents.remove(intent_id)
    }

    pub fn get(&self, intent_id: &str) -> Option<&BookingIntent> {
        self.intents.get(intent_id)
    }

    pub fn contains(&self, intent_id: &str) -> bool {
        self.intents.contains_key(intent_id)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BookingIntent> {
        self.intents.values()
    }

    /// Intents ordered by how soon they lapse.
    pub fn by_expiry(&self) -> Vec<&BookingIntent> {
        let mut intents: Vec<_> = self.intents.values().collect();
        intents.sort_by_key(|intent| intent.expires_at);
        intents
    }

    /// An intent that can re-enter payment directly.
    pub fn resumable(&self, intent_id: &str, now: DateTime<Utc>) -> FlowResult<BookingIntent> {
        let intent = self.intents.get(intent_id).ok_or_else(|| {
            FlowError::validation(format!("intent {} is not active", intent_id))
        })?;

        if intent.is_expired(now) {
            return Err(FlowError::validation(format!(
                "intent {} has expired",
                intent_id
            )));
        }

        Ok(intent.clone())
    }
}
