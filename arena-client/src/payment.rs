use async_trait::async_trait;

use arena_core::{PaymentService, ServiceResult};
use arena_shared::{InitPaymentRequest, InitPaymentResponse, PaymentStatusResponse};

use crate::http::ApiClient;

pub const DOMAIN: &str = "PAYMENT";

pub struct HttpPaymentService {
    api: ApiClient,
}

impl HttpPaymentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PaymentService for HttpPaymentService {
    async fn init_payment(
        &self,
        request: &InitPaymentRequest,
    ) -> ServiceResult<InitPaymentResponse> {
        self.api.post("/payments", request).await
    }

    async fn get_payment_status(&self, payment_id: &str) -> ServiceResult<PaymentStatusResponse> {
        self.api
            .get(&format!("/payments/{}/status", payment_id))
            .await
    }
}
