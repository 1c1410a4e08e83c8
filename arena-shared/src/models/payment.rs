use serde::{Deserialize, Serialize};

/// How the player settles the intent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMode {
    /// Card/wallet through the provider; usually settles asynchronously.
    Online,
    /// Recorded at the desk by club staff; usually settles synchronously.
    Cash,
}

/// Status as reported by the payment provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    Pending,
    Success,
    Failed,
}

impl ProviderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProviderStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitPaymentRequest {
    pub intent_id: String,
    pub mode: PaymentMode,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InitPaymentResponse {
    pub payment_id: Option<String>,
    pub status: ProviderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub status: ProviderStatus,
    pub intent_id: Option<String>,
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMode::Online => write!(f, "ONLINE"),
            PaymentMode::Cash => write!(f, "CASH"),
        }
    }
}

impl std::str::FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ONLINE" => Ok(PaymentMode::Online),
            "CASH" => Ok(PaymentMode::Cash),
            other => Err(format!("unknown payment mode: {}", other)),
        }
    }
}
