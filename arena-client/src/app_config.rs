use serde::Deserialize;
use std::env;
use std::time::Duration;

use arena_checkout::{CheckoutSettings, PollPolicy};
use arena_shared::{ClubId, Identity, Masked, Role};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub services: ServicesConfig,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub booking_url: String,
    pub payment_url: String,
    pub availability_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CheckoutConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Unset polls until the provider settles.
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,
    #[serde(default = "default_countdown_tick")]
    pub countdown_tick_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub user_id: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub managed_club_ids: Vec<ClubId>,
}

fn default_request_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    3000
}

fn default_countdown_tick() -> u64 {
    1000
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            max_poll_attempts: None,
            countdown_tick_ms: default_countdown_tick(),
        }
    }
}

impl ServicesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl CheckoutConfig {
    pub fn settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            poll: PollPolicy {
                interval: Duration::from_millis(self.poll_interval_ms),
                max_attempts: self.max_poll_attempts,
            },
            countdown_tick: Duration::from_millis(self.countdown_tick_ms),
        }
    }
}

impl IdentityConfig {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id.clone(),
            role: self.role,
            phone_number: self.phone_number.clone().map(Masked),
            managed_club_ids: self.managed_club_ids.clone(),
            token: self.token.clone().map(Masked),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Layered load from `dir`: `default`, then `{RUN_MODE}` and `local` if present, then
    /// `ARENA__*` environment variables.
    pub fn load_from(dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)))
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            .add_source(config::Environment::with_prefix("ARENA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
