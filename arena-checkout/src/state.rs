use serde::Serialize;

use arena_shared::PaymentMode;

/// Checkout payment status. `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Idle,
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed)
    }
}

/// One checkout's payment, owned by its orchestrator.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PaymentAttempt {
    pub payment_id: Option<String>,
    pub intent_id: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub mode: PaymentMode,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Invalid state transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

/// Payment state machine.
///
/// IDLE -> PENDING -> (PENDING)* -> SUCCESS | FAILED. Nothing leaves a terminal state;
/// a retry uses a new machine.
#[derive(Debug, Clone, Default)]
pub struct PaymentMachine {
    attempt: Option<PaymentAttempt>,
}

impl PaymentMachine {
    pub fn new() -> Self {
        Self { attempt: None }
    }

    pub fn status(&self) -> PaymentStatus {
        self.attempt
            .as_ref()
            .map_or(PaymentStatus::Idle, |attempt| attempt.status)
    }

    pub fn attempt(&self) -> Option<&PaymentAttempt> {
        self.attempt.as_ref()
    }

    /// Transition: Idle -> Pending
    pub fn begin(
        &mut self,
        intent_id: String,
        amount: i64,
        mode: PaymentMode,
    ) -> Result<(), TransitionError> {
        self.guard(PaymentStatus::Idle, PaymentStatus::Pending)?;
        self.attempt = Some(PaymentAttempt {
            payment_id: None,
            intent_id,
            status: PaymentStatus::Pending,
            amount,
            mode,
        });
        Ok(())
    }

    /// Provider acknowledged the attempt (Pending -> Pending).
    pub fn record_payment_id(&mut self, payment_id: &str) -> Result<(), TransitionError> {
        let attempt = self.pending_mut(PaymentStatus::Pending)?;
        attempt.payment_id = Some(payment_id.to_string());
        Ok(())
    }

    /// Transition: Pending -> Pending (intermediate provider state)
    pub fn still_pending(&mut self) -> Result<(), TransitionError> {
        self.pending_mut(PaymentStatus::Pending).map(|_| ())
    }

    /// Transition: Pending -> Success
    pub fn succeed(&mut self) -> Result<(), TransitionError> {
        let attempt = self.pending_mut(PaymentStatus::Success)?;
        attempt.status = PaymentStatus::Success;
        Ok(())
    }

    /// Transition: Pending -> Failed
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        let attempt = self.pending_mut(PaymentStatus::Failed)?;
        attempt.status = PaymentStatus::Failed;
        Ok(())
    }

    fn guard(&self, from: PaymentStatus, to: PaymentStatus) -> Result<(), TransitionError> {
        let current = self.status();
        if current != from {
            return Err(TransitionError::InvalidTransition { from: current, to });
        }
        Ok(())
    }

    fn pending_mut(&mut self, to: PaymentStatus) -> Result<&mut PaymentAttempt, TransitionError> {
        let current = self.status();
        match self.attempt.as_mut() {
            Some(attempt) if attempt.status == PaymentStatus::Pending => Ok(attempt),
            _ => Err(TransitionError::InvalidTransition { from: current, to }),
        }
    }
}
