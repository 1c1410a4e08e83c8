use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use arena_core::{ApiError, CancelSignal, FlowError, FlowResult, PaymentService};
use arena_shared::{Booking, BookingIntent, InitPaymentRequest, PaymentMode, ProviderStatus};

use crate::confirmation::ConfirmationFetcher;
use crate::state::{PaymentAttempt, PaymentMachine, PaymentStatus, TransitionError};

/// How the orchestrator polls an asynchronous payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until the provider reports a terminal status.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: None,
        }
    }
}

/// Non-error end of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Payment settled and the booking record was fetched.
    Confirmed(Booking),
    /// Polling was cancelled before a terminal status; the intent can be resumed.
    Abandoned { payment_id: Option<String> },
}

/// Drives one checkout for one intent. Single-use: once SUCCESS or FAILED, a retry
/// needs a new orchestrator.
pub struct PaymentOrchestrator {
    intent: BookingIntent,
    payments: Arc<dyn PaymentService>,
    confirmations: ConfirmationFetcher,
    policy: PollPolicy,
    machine: Mutex<PaymentMachine>,
    status_tx: watch::Sender<PaymentStatus>,
}

impl std::fmt::Debug for PaymentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentOrchestrator")
            .field("intent", &self.intent)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl PaymentOrchestrator {
    pub fn new(
        intent: BookingIntent,
        payments: Arc<dyn PaymentService>,
        confirmations: ConfirmationFetcher,
        policy: PollPolicy,
    ) -> Self {
        let (status_tx, _) = watch::channel(PaymentStatus::Idle);
        Self {
            intent,
            payments,
            confirmations,
            policy,
            machine: Mutex::new(PaymentMachine::new()),
            status_tx,
        }
    }

    pub fn intent(&self) -> &BookingIntent {
        &self.intent
    }

    pub fn status(&self) -> PaymentStatus {
        self.machine().status()
    }

    pub fn attempt(&self) -> Option<PaymentAttempt> {
        self.machine().attempt().cloned()
    }

    /// Status updates, e.g. to disable re-submission while PENDING.
    pub fn subscribe(&self) -> watch::Receiver<PaymentStatus> {
        self.status_tx.subscribe()
    }

    /// Start paying for the bound intent.
    ///
    /// Missing intent id or amount fails locally without a provider call. A second call
    /// while PENDING, or any call after a terminal status, is rejected. An already
    /// cancelled signal abandons before the provider is contacted.
    pub async fn initiate(
        &self,
        mode: PaymentMode,
        cancel: &CancelSignal,
    ) -> FlowResult<CheckoutOutcome> {
        let intent_id = self.intent.intent_id.clone();
        if intent_id.is_empty() {
            return Err(FlowError::validation("intent id is required to pay"));
        }
        let amount = self
            .intent
            .amount()
            .ok_or_else(|| FlowError::validation("intent has no resolved amount"))?;

        if cancel.is_cancelled() {
            info!("Checkout for intent {} cancelled before payment started", intent_id);
            return Ok(CheckoutOutcome::Abandoned { payment_id: None });
        }

        self.transition(|m| m.begin(intent_id.clone(), amount, mode))
            .map_err(|e| match e {
                TransitionError::InvalidTransition { from: PaymentStatus::Pending, .. } => {
                    FlowError::validation(format!(
                        "a payment for intent {} is already in progress",
                        intent_id
                    ))
                }
                TransitionError::InvalidTransition { from, .. } => FlowError::validation(format!(
                    "checkout for intent {} already finished ({:?}); start a new one",
                    intent_id, from
                )),
            })?;

        info!("Initiating {} payment of {} for intent {}", mode, amount, intent_id);
        let request = InitPaymentRequest {
            intent_id: intent_id.clone(),
            mode,
            amount,
        };
        let response = match self.payments.init_payment(&request).await {
            Ok(response) => response,
            Err(e) => return Err(self.fail_with(e.into())),
        };

        match (response.status, response.payment_id) {
            (ProviderStatus::Success, _) => self.confirm().await,
            (ProviderStatus::Failed, _) => {
                Err(self.fail_with(FlowError::service("payment was declined by the provider")))
            }
            (ProviderStatus::Pending, Some(payment_id)) => {
                self.transition(|m| m.record_payment_id(&payment_id))
                    .map_err(|e| FlowError::validation(e.to_string()))?;
                self.poll(&payment_id, cancel).await
            }
            (ProviderStatus::Pending, None) => Err(self.fail_with(FlowError::service(
                "provider reported a pending payment without a payment id",
            ))),
        }
    }

    /// Fixed-interval status checks until a terminal status or cancellation.
    ///
    /// Each check completes before the next tick is awaited, so at most one check per
    /// payment is ever in flight.
    async fn poll(&self, payment_id: &str, cancel: &CancelSignal) -> FlowResult<CheckoutOutcome> {
        let period = self.policy.interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts: u32 = 0;

        info!("Payment {} pending, polling every {:?}", payment_id, self.policy.interval);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(self.abandon(payment_id)),
                _ = interval.tick() => {}
            }

            attempts += 1;
            let checked = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(self.abandon(payment_id)),
                checked = self.payments.get_payment_status(payment_id) => checked,
            };

            let status = match checked {
                Ok(status) => status,
                Err(e) => return Err(self.fail_with(self.poll_error(payment_id, e))),
            };

            if let Some(reported) = status.intent_id.as_deref() {
                if reported != self.intent.intent_id {
                    warn!(
                        "Payment {} reports intent {}, expected {}",
                        payment_id, reported, self.intent.intent_id
                    );
                    return Err(
                        self.fail_with(FlowError::service("payment belongs to a different intent"))
                    );
                }
            }

            match status.status {
                ProviderStatus::Pending => {
                    debug!("Payment {} still pending after {} checks", payment_id, attempts);
                    self.transition(|m| m.still_pending())
                        .map_err(|e| FlowError::validation(e.to_string()))?;

                    if let Some(max) = self.policy.max_attempts {
                        if attempts >= max {
                            warn!("Payment {} gave up after {} checks", payment_id, attempts);
                            return Err(self.fail_with(FlowError::timeout(format!(
                                "payment still pending after {} status checks",
                                attempts
                            ))));
                        }
                    }
                }
                ProviderStatus::Success => {
                    info!("Payment {} succeeded after {} checks", payment_id, attempts);
                    return self.confirm().await;
                }
                ProviderStatus::Failed => {
                    return Err(self.fail_with(FlowError::service("payment failed")));
                }
            }
        }
    }

    /// PENDING -> SUCCESS, then hand the intent to the confirmation fetcher exactly once.
    async fn confirm(&self) -> FlowResult<CheckoutOutcome> {
        self.transition(|m| m.succeed())
            .map_err(|e| FlowError::validation(e.to_string()))?;

        let booking = self
            .confirmations
            .fetch(self.intent.club_id, &self.intent.intent_id)
            .await?;
        Ok(CheckoutOutcome::Confirmed(booking))
    }

    fn abandon(&self, payment_id: &str) -> CheckoutOutcome {
        info!("Polling for payment {} cancelled", payment_id);
        CheckoutOutcome::Abandoned {
            payment_id: Some(payment_id.to_string()),
        }
    }

    /// A not-found answer means the intent was cancelled or expired server-side while
    /// we were polling.
    fn poll_error(&self, payment_id: &str, err: ApiError) -> FlowError {
        if err.is_not_found() {
            info!("Payment {} no longer exists server-side", payment_id);
            FlowError::service("payment no longer exists; the booking may have been cancelled")
        } else {
            warn!("Status check for payment {} failed: {}", payment_id, err);
            err.into()
        }
    }

    fn fail_with(&self, error: FlowError) -> FlowError {
        if let Err(e) = self.transition(|m| m.fail()) {
            warn!("Could not mark intent {} failed: {}", self.intent.intent_id, e);
        }
        error
    }

    fn transition<F>(&self, apply: F) -> Result<(), TransitionError>
    where
        F: FnOnce(&mut PaymentMachine) -> Result<(), TransitionError>,
    {
        let status = {
            let mut machine = self.machine();
            apply(&mut *machine)?;
            machine.status()
        };
        self.status_tx.send_replace(status);
        Ok(())
    }

    fn machine(&self) -> MutexGuard<'_, PaymentMachine> {
        self.machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
