pub mod availability;
pub mod identity;
pub mod intent;
pub mod payment;
pub mod station;
