pub mod app_config;
pub mod availability;
pub mod booking;
pub mod http;
pub mod payment;

use std::sync::Arc;

use arena_checkout::Services;
use arena_shared::Identity;

pub use availability::HttpAvailabilityService;
pub use booking::HttpBookingService;
pub use http::ApiClient;
pub use payment::HttpPaymentService;

use app_config::ServicesConfig;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP-backed collaborators, authenticated as `identity`.
pub fn connect(config: &ServicesConfig, identity: &Identity) -> Result<Services, ClientError> {
    let timeout = config.request_timeout();
    let token = identity.token.clone();

    let booking = ApiClient::new(booking::DOMAIN, &config.booking_url, timeout, token.clone())?;
    let payments = ApiClient::new(payment::DOMAIN, &config.payment_url, timeout, token.clone())?;
    let availability =
        ApiClient::new(availability::DOMAIN, &config.availability_url, timeout, token)?;

    tracing::debug!(
        "Connecting to booking={} payment={} availability={}",
        booking.base_url(),
        payments.base_url(),
        availability.base_url()
    );

    Ok(Services {
        booking: Arc::new(HttpBookingService::new(booking)),
        payments: Arc::new(HttpPaymentService::new(payments)),
        availability: Arc::new(HttpAvailabilityService::new(availability)),
    })
}
