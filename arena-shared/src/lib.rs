pub mod models;
pub mod pii;

pub use models::availability::{SlotSearchRequest, StationAvailability, TimeAvailabilityRequest};
pub use models::identity::{ActiveScope, Identity, Role};
pub use models::intent::{Booking, BookingIntent, CostDetails, CreateIntentRequest};
pub use models::payment::{
    InitPaymentRequest, InitPaymentResponse, PaymentMode, PaymentStatusResponse, ProviderStatus,
};
pub use models::station::{SearchWindow, Station, StationSelection};
pub use pii::Masked;

pub type ClubId = i64;
pub type StationId = i64;
