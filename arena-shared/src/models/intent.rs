use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::station::StationSelection;
use crate::pii::Masked;
use crate::ClubId;

/// Cost breakdown attached to an intent by the booking service. Amounts are in minor
/// currency units.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CostDetails {
    pub currency: Option<String>,
    pub subtotal: Option<i64>,
    pub taxes: Option<i64>,
    pub discount: Option<i64>,
    pub total_amount: Option<i64>,
}

/// Server-issued, time-bounded hold taken before payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingIntent {
    pub intent_id: String,
    pub club_id: ClubId,
    pub station_type: String,
    pub stations: Vec<StationSelection>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub cost_details: CostDetails,
}

impl BookingIntent {
    /// Amount to charge, if the service resolved one.
    pub fn amount(&self) -> Option<i64> {
        self.cost_details.total_amount
    }

    /// Time left before the hold lapses, floor-clamped at zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.expires_at - now;
        if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn player_total(&self) -> u32 {
        self.stations.iter().map(|s| s.player_count).sum()
    }
}

/// Body of the create-intent call, built from a committed selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub club_id: ClubId,
    pub station_type: String,
    pub stations: Vec<StationSelection>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<Masked<String>>,
}

/// The committed, billable record once payment settles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: String,
    pub intent_id: String,
    pub club_id: ClubId,
    pub station_type: String,
    pub stations: Vec<StationSelection>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_amount: Option<i64>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
