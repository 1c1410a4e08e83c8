#![allow(dead_code)]

use arena_core::{ApiError, AvailabilityService, BookingService, PaymentService, ServiceResult};
use arena_shared::{
    ActiveScope, Booking, BookingIntent, ClubId, CostDetails, CreateIntentRequest,
    InitPaymentRequest, InitPaymentResponse, PaymentStatusResponse, ProviderStatus,
    SlotSearchRequest, Station, StationAvailability, StationSelection, TimeAvailabilityRequest,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
}

/// "Now" for every test; intents expire ten minutes later.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

pub fn intent(intent_id: &str, amount: Option<i64>) -> BookingIntent {
    BookingIntent {
        intent_id: intent_id.to_string(),
        club_id: 1,
        station_type: "PC".to_string(),
        stations: vec![StationSelection { station_id: 5, player_count: 2 }],
        start_time: at(10),
        end_time: at(11),
        expires_at: now() + Duration::minutes(10),
        cost_details: CostDetails {
            currency: Some("USD".to_string()),
            total_amount: amount,
            ..CostDetails::default()
        },
    }
}

fn not_found(domain: &str) -> ApiError {
    ApiError::fallback(domain, Some(404))
}

/// Payment provider that answers init with a fixed response and status checks from a
/// script. Once the script runs out every check reports PENDING.
pub struct ScriptedPayments {
    init: Mutex<Option<ServiceResult<InitPaymentResponse>>>,
    statuses: Mutex<VecDeque<ServiceResult<PaymentStatusResponse>>>,
    pub init_requests: Mutex<Vec<InitPaymentRequest>>,
    pub status_calls: AtomicUsize,
}

impl ScriptedPayments {
    pub fn new(init: ServiceResult<InitPaymentResponse>) -> Self {
        Self {
            init: Mutex::new(Some(init)),
            statuses: Mutex::new(VecDeque::new()),
            init_requests: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn pending(payment_id: &str) -> Self {
        Self::new(Ok(InitPaymentResponse {
            payment_id: Some(payment_id.to_string()),
            status: ProviderStatus::Pending,
        }))
    }

    pub fn settled(status: ProviderStatus) -> Self {
        Self::new(Ok(InitPaymentResponse {
            payment_id: Some("pay_sync".to_string()),
            status,
        }))
    }

    pub fn then(self, status: ProviderStatus) -> Self {
        self.statuses.lock().unwrap().push_back(Ok(PaymentStatusResponse {
            status,
            intent_id: None,
        }));
        self
    }

    pub fn then_response(self, response: ServiceResult<PaymentStatusResponse>) -> Self {
        self.statuses.lock().unwrap().push_back(response);
        self
    }

    pub fn init_calls(&self) -> usize {
        self.init_requests.lock().unwrap().len()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentService for ScriptedPayments {
    async fn init_payment(&self, request: &InitPaymentRequest) -> ServiceResult<InitPaymentResponse> {
        self.init_requests.lock().unwrap().push(request.clone());
        // Later inits (a fresh checkout) answer PENDING with a new id.
        self.init.lock().unwrap().take().unwrap_or_else(|| {
            Ok(InitPaymentResponse {
                payment_id: Some("pay_retry".to_string()),
                status: ProviderStatus::Pending,
            })
        })
    }

    async fn get_payment_status(&self, _payment_id: &str) -> ServiceResult<PaymentStatusResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses.lock().unwrap().pop_front().unwrap_or(Ok(PaymentStatusResponse {
            status: ProviderStatus::Pending,
            intent_id: None,
        }))
    }
}

/// Booking service that issues intents and confirms whatever intent it is asked about.
#[derive(Default)]
pub struct FakeBooking {
    pub active: Mutex<Vec<BookingIntent>>,
    pub confirmations: Mutex<Vec<String>>,
    pub cancelled: Mutex<Vec<String>>,
    /// Number of confirmation fetches to fail before answering.
    pub confirmation_failures: AtomicUsize,
}

impl FakeBooking {
    pub fn with_active(intents: Vec<BookingIntent>) -> Self {
        Self {
            active: Mutex::new(intents),
            ..Self::default()
        }
    }
}

#[async_trait]
impl BookingService for FakeBooking {
    async fn create_intent(&self, request: &CreateIntentRequest) -> ServiceResult<BookingIntent> {
        Ok(BookingIntent {
            intent_id: "bi_new".to_string(),
            club_id: request.club_id,
            station_type: request.station_type.clone(),
            stations: request.stations.clone(),
            start_time: request.start_time,
            end_time: request.end_time,
            expires_at: now() + Duration::minutes(10),
            cost_details: CostDetails {
                total_amount: Some(2400),
                ..CostDetails::default()
            },
        })
    }

    async fn get_active_intents(&self, _scope: ActiveScope) -> ServiceResult<Vec<BookingIntent>> {
        Ok(self.active.lock().unwrap().clone())
    }

    async fn cancel_intent(&self, _club_id: ClubId, intent_id: &str) -> ServiceResult<()> {
        self.cancelled.lock().unwrap().push(intent_id.to_string());
        Ok(())
    }

    async fn get_booking_by_intent_id(&self, club_id: ClubId, intent_id: &str) -> ServiceResult<Booking> {
        self.confirmations.lock().unwrap().push(intent_id.to_string());

        let failures = self.confirmation_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.confirmation_failures.store(failures - 1, Ordering::SeqCst);
            return Err(not_found("BOOKING"));
        }

        Ok(Booking {
            booking_id: format!("bk_{}", intent_id),
            intent_id: intent_id.to_string(),
            club_id,
            station_type: "PC".to_string(),
            stations: vec![StationSelection { station_id: 5, player_count: 2 }],
            start_time: at(10),
            end_time: at(11),
            total_amount: Some(2400),
            status: "CONFIRMED".to_string(),
            created_at: now(),
        })
    }
}

pub struct OneStationFree;

#[async_trait]
impl AvailabilityService for OneStationFree {
    async fn check_by_time(&self, _request: &TimeAvailabilityRequest) -> ServiceResult<Vec<StationAvailability>> {
        Ok(vec![StationAvailability {
            station: Station {
                id: 5,
                name: "PC-5".to_string(),
                station_type: "PC".to_string(),
                capacity: 4,
            },
            available: true,
        }])
    }

    async fn check_by_stations(&self, _request: &SlotSearchRequest) -> ServiceResult<Vec<DateTime<Utc>>> {
        Ok(vec![at(14), at(15)])
    }
}
