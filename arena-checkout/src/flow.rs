use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use arena_booking::{
    spawn_countdown, ActiveIntentRegistry, AvailabilityQuery, Countdown, CountdownTask,
    CountdownView, IntentLifecycle, SelectionManager, SelectionMode,
};
use arena_core::{
    AvailabilityService, BookingService, CancelSignal, Clock, FlowError, FlowResult,
    PaymentService,
};
use arena_shared::{Booking, BookingIntent, ClubId, Identity, PaymentMode};

use crate::confirmation::ConfirmationFetcher;
use crate::orchestrator::{CheckoutOutcome, PaymentOrchestrator, PollPolicy};
use crate::state::PaymentStatus;

/// External collaborators the flow talks to.
#[derive(Clone)]
pub struct Services {
    pub booking: Arc<dyn BookingService>,
    pub payments: Arc<dyn PaymentService>,
    pub availability: Arc<dyn AvailabilityService>,
}

#[derive(Debug, Clone, Copy)]
pub struct CheckoutSettings {
    pub poll: PollPolicy,
    pub countdown_tick: Duration,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            countdown_tick: Duration::from_secs(1),
        }
    }
}

/// Where the user is in the booking flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowStep {
    Selection,
    Payment { intent_id: String },
    /// Paid, but the booking record has not been fetched yet.
    AwaitingConfirmation { club_id: ClubId, intent_id: String },
    Confirmed { booking: Booking },
    PaymentFailed { intent_id: String, error: FlowError },
}

/// Selection -> commit -> payment -> confirmation, with the active-intent registry as a
/// side entry straight into payment.
pub struct BookingFlow {
    services: Services,
    lifecycle: IntentLifecycle,
    availability: AvailabilityQuery,
    confirmations: ConfirmationFetcher,
    clock: Arc<dyn Clock>,
    settings: CheckoutSettings,
    selection: SelectionManager,
    registry: ActiveIntentRegistry,
    step: FlowStep,
    last_error: Option<FlowError>,
    /// Orchestrator handed out for the intent awaiting payment, until settled.
    current: Option<Arc<PaymentOrchestrator>>,
}

impl BookingFlow {
    pub fn new(
        identity: Identity,
        services: Services,
        clock: Arc<dyn Clock>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            lifecycle: IntentLifecycle::new(services.booking.clone(), identity),
            availability: AvailabilityQuery::new(services.availability.clone()),
            confirmations: ConfirmationFetcher::new(services.booking.clone()),
            services,
            clock,
            settings,
            selection: SelectionManager::new(SelectionMode::TimeBased),
            registry: ActiveIntentRegistry::new(),
            step: FlowStep::Selection,
            last_error: None,
            current: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        self.lifecycle.identity()
    }

    pub fn step(&self) -> &FlowStep {
        &self.step
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionManager {
        &mut self.selection
    }

    pub fn registry(&self) -> &ActiveIntentRegistry {
        &self.registry
    }

    /// Last commit/cancel/query error, kept until dismissed. The selection survives it.
    pub fn last_error(&self) -> Option<&FlowError> {
        self.last_error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    pub async fn check_availability(&mut self) -> FlowResult<()> {
        let result = self.selection.check_availability(&self.availability).await;
        self.record(result)
    }

    /// Commit the draft selection and move to payment.
    pub async fn commit(&mut self) -> FlowResult<BookingIntent> {
        if let FlowStep::Payment { intent_id } = &self.step {
            return Err(FlowError::validation(format!(
                "intent {} is already awaiting payment",
                intent_id
            )));
        }

        let result = self
            .lifecycle
            .commit(&mut self.selection, &mut self.registry)
            .await;
        let intent = self.record(result)?;
        self.step = FlowStep::Payment {
            intent_id: intent.intent_id.clone(),
        };
        Ok(intent)
    }

    /// Reload the registry for this identity; admins managing `club_id` see the club's intents.
    pub async fn refresh_active(&mut self, club_id: Option<ClubId>) -> FlowResult<usize> {
        let scope = self.identity().active_scope(club_id);
        let result = self
            .registry
            .fetch_active(self.services.booking.as_ref(), scope)
            .await;
        self.record(result)
    }

    /// Re-enter payment for an abandoned intent, skipping selection and commit.
    pub fn resume(&mut self, intent_id: &str) -> FlowResult<BookingIntent> {
        self.ensure_no_payment_in_flight()?;
        let intent = self.registry.resumable(intent_id, self.clock.now())?;
        info!("Resuming checkout for intent {}", intent_id);
        self.step = FlowStep::Payment {
            intent_id: intent.intent_id.clone(),
        };
        Ok(intent)
    }

    pub async fn cancel_intent(&mut self, club_id: ClubId, intent_id: &str) -> FlowResult<()> {
        let result = self
            .lifecycle
            .cancel(club_id, intent_id, &mut self.registry)
            .await;
        self.record(result)?;

        if self.step_intent() == Some(intent_id) {
            self.step = FlowStep::Selection;
            self.current = None;
        }
        Ok(())
    }

    /// A fresh orchestrator bound to the intent awaiting payment.
    ///
    /// For callers that run the checkout on their own task; report the result back
    /// through [`BookingFlow::settle`]. Only one orchestrator is live per flow: while the
    /// previous one is unsettled and still held elsewhere, this is rejected.
    pub fn payment_orchestrator(&mut self) -> FlowResult<Arc<PaymentOrchestrator>> {
        self.ensure_no_payment_in_flight()?;
        let intent_id = match &self.step {
            FlowStep::Payment { intent_id } => intent_id,
            _ => return Err(FlowError::validation("no intent is awaiting payment")),
        };
        let intent = self
            .registry
            .get(intent_id)
            .cloned()
            .ok_or_else(|| FlowError::validation(format!("intent {} is not active", intent_id)))?;

        let orchestrator = Arc::new(PaymentOrchestrator::new(
            intent,
            self.services.payments.clone(),
            self.confirmations.clone(),
            self.settings.poll,
        ));
        self.current = Some(orchestrator.clone());
        Ok(orchestrator)
    }

    /// Pay for the intent awaiting payment and settle the flow on the result.
    pub async fn checkout(
        &mut self,
        mode: PaymentMode,
        cancel: &CancelSignal,
    ) -> FlowResult<CheckoutOutcome> {
        let orchestrator = self.payment_orchestrator()?;
        let result = orchestrator.initiate(mode, cancel).await;
        self.settle(&orchestrator, result)
    }

    /// Apply a finished checkout to the flow.
    pub fn settle(
        &mut self,
        orchestrator: &PaymentOrchestrator,
        result: FlowResult<CheckoutOutcome>,
    ) -> FlowResult<CheckoutOutcome> {
        let settled_current = self
            .current
            .as_ref()
            .map_or(false, |current| std::ptr::eq(current.as_ref(), orchestrator));
        if settled_current {
            self.current = None;
        }

        let intent = orchestrator.intent();
        match (&result, orchestrator.status()) {
            (Ok(CheckoutOutcome::Confirmed(booking)), _) => {
                self.registry.remove(&intent.intent_id);
                self.step = FlowStep::Confirmed {
                    booking: booking.clone(),
                };
            }
            (Ok(CheckoutOutcome::Abandoned { .. }), _) => {
                // Still in the registry; resumable later.
            }
            (Err(_), PaymentStatus::Success) => {
                self.registry.remove(&intent.intent_id);
                self.step = FlowStep::AwaitingConfirmation {
                    club_id: intent.club_id,
                    intent_id: intent.intent_id.clone(),
                };
            }
            (Err(error), PaymentStatus::Failed) => {
                warn!("Checkout for intent {} failed: {}", intent.intent_id, error);
                self.step = FlowStep::PaymentFailed {
                    intent_id: intent.intent_id.clone(),
                    error: error.clone(),
                };
            }
            (Err(error), _) => {
                self.last_error = Some(error.clone());
            }
        }
        result
    }

    /// Retry after FAILED: back to payment if the intent is still live, else to selection.
    pub fn retry_payment(&mut self) -> FlowResult<()> {
        let intent_id = match &self.step {
            FlowStep::PaymentFailed { intent_id, .. } => intent_id.clone(),
            _ => return Err(FlowError::validation("there is no failed payment to retry")),
        };
        self.current = None;

        match self.registry.resumable(&intent_id, self.clock.now()) {
            Ok(_) => {
                self.step = FlowStep::Payment { intent_id };
                Ok(())
            }
            Err(e) => {
                self.step = FlowStep::Selection;
                Err(e)
            }
        }
    }

    /// Fetch the booking for a paid intent whose first confirmation fetch failed.
    pub async fn fetch_confirmation(&mut self) -> FlowResult<Booking> {
        let (club_id, intent_id) = match &self.step {
            FlowStep::AwaitingConfirmation { club_id, intent_id } => (*club_id, intent_id.clone()),
            _ => return Err(FlowError::validation("no paid intent is awaiting confirmation")),
        };

        let booking = self.confirmations.fetch(club_id, &intent_id).await?;
        self.step = FlowStep::Confirmed {
            booking: booking.clone(),
        };
        Ok(booking)
    }

    pub fn countdown(&self, intent_id: &str) -> Option<CountdownView> {
        self.registry
            .get(intent_id)
            .map(|intent| Countdown::new(intent.expires_at).view(self.clock.now()))
    }

    /// Per-second countdown for an active intent. Expiry only calls `on_expire`.
    pub fn watch_expiry<T, E>(
        &self,
        intent_id: &str,
        on_tick: T,
        on_expire: E,
        teardown: CancelSignal,
    ) -> FlowResult<CountdownTask>
    where
        T: FnMut(CountdownView) + Send + 'static,
        E: FnOnce(&str) + Send + 'static,
    {
        let intent = self
            .registry
            .get(intent_id)
            .ok_or_else(|| FlowError::validation(format!("intent {} is not active", intent_id)))?;

        Ok(spawn_countdown(
            intent.intent_id.clone(),
            intent.expires_at,
            self.clock.clone(),
            self.settings.countdown_tick,
            on_tick,
            on_expire,
            teardown,
        ))
    }

    fn ensure_no_payment_in_flight(&self) -> FlowResult<()> {
        match &self.current {
            // A second holder means a checkout task may still be driving it.
            Some(current) if !current.status().is_terminal() && Arc::strong_count(current) > 1 => {
                Err(FlowError::validation(format!(
                    "a payment for intent {} is already in progress",
                    current.intent().intent_id
                )))
            }
            _ => Ok(()),
        }
    }

    fn step_intent(&self) -> Option<&str> {
        match &self.step {
            FlowStep::Payment { intent_id } | FlowStep::PaymentFailed { intent_id, .. } => {
                Some(intent_id.as_str())
            }
            _ => None,
        }
    }

    fn record<T>(&mut self, result: FlowResult<T>) -> FlowResult<T> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => self.last_error = Some(e.clone()),
        }
        result
    }
}
