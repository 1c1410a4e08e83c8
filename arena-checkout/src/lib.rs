pub mod confirmation;
pub mod flow;
pub mod orchestrator;
pub mod state;

pub use confirmation::ConfirmationFetcher;
pub use flow::{BookingFlow, CheckoutSettings, FlowStep, Services};
pub use orchestrator::{CheckoutOutcome, PaymentOrchestrator, PollPolicy};
pub use state::{PaymentAttempt, PaymentMachine, PaymentStatus, TransitionError};
