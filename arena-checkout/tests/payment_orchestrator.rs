mod common;

use arena_checkout::{
    CheckoutOutcome, ConfirmationFetcher, PaymentOrchestrator, PaymentStatus, PollPolicy,
};
use arena_core::{ApiError, CancelSignal, ErrorKind};
use arena_shared::{PaymentMode, PaymentStatusResponse, ProviderStatus};
use common::{intent, FakeBooking, ScriptedPayments};
use std::sync::Arc;
use std::time::Duration;

fn orchestrator(
    payments: &Arc<ScriptedPayments>,
    booking: &Arc<FakeBooking>,
    amount: Option<i64>,
    policy: PollPolicy,
) -> Arc<PaymentOrchestrator> {
    Arc::new(PaymentOrchestrator::new(
        intent("bi_1", amount),
        payments.clone(),
        ConfirmationFetcher::new(booking.clone()),
        policy,
    ))
}

#[tokio::test(start_paused = true)]
async fn test_pending_then_success_confirms_once() {
    let payments = Arc::new(
        ScriptedPayments::pending("pay_1")
            .then(ProviderStatus::Pending)
            .then(ProviderStatus::Pending)
            .then(ProviderStatus::Pending)
            .then(ProviderStatus::Success),
    );
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());

    let outcome = checkout
        .initiate(PaymentMode::Online, &CancelSignal::new())
        .await
        .unwrap();

    match outcome {
        CheckoutOutcome::Confirmed(booking) => assert_eq!(booking.intent_id, "bi_1"),
        other => panic!("expected a confirmed booking, got {:?}", other),
    }
    assert_eq!(checkout.status(), PaymentStatus::Success);
    assert_eq!(payments.status_calls(), 4);
    assert_eq!(*booking.confirmations.lock().unwrap(), vec!["bi_1".to_string()]);

    let sent = payments.init_requests.lock().unwrap()[0].clone();
    assert_eq!(sent.intent_id, "bi_1");
    assert_eq!(sent.amount, 2400);
    assert_eq!(sent.mode, PaymentMode::Online);

    // Nothing keeps polling once the payment has settled.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(payments.status_calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_polls_on_a_fixed_interval() {
    let payments = Arc::new(ScriptedPayments::pending("pay_1"));
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());
    let cancel = CancelSignal::new();

    let running = {
        let checkout = checkout.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { checkout.initiate(PaymentMode::Online, &cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(2900)).await;
    assert_eq!(payments.status_calls(), 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(payments.status_calls(), 1);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(payments.status_calls(), 3);

    cancel.cancel();
    running.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_amount_fails_before_any_call() {
    let payments = Arc::new(ScriptedPayments::pending("pay_1"));
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, None, PollPolicy::default());

    let err = checkout
        .initiate(PaymentMode::Online, &CancelSignal::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(payments.init_calls(), 0);
    assert_eq!(checkout.status(), PaymentStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_second_initiate_while_pending_is_rejected() {
    let payments = Arc::new(ScriptedPayments::pending("pay_1"));
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());
    let cancel = CancelSignal::new();
    let mut status = checkout.subscribe();

    let first = {
        let checkout = checkout.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { checkout.initiate(PaymentMode::Online, &cancel).await })
    };
    status.wait_for(|s| *s == PaymentStatus::Pending).await.unwrap();

    let err = checkout
        .initiate(PaymentMode::Online, &CancelSignal::new())
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(payments.init_calls(), 1);

    cancel.cancel();
    let outcome = first.await.unwrap().unwrap();
    assert_eq!(
        outcome,
        CheckoutOutcome::Abandoned {
            payment_id: Some("pay_1".to_string())
        }
    );
    assert_eq!(payments.init_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_status_stops_polling() {
    let payments = Arc::new(
        ScriptedPayments::pending("pay_1")
            .then(ProviderStatus::Pending)
            .then(ProviderStatus::Failed),
    );
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());

    let err = checkout
        .initiate(PaymentMode::Online, &CancelSignal::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Service);
    assert_eq!(checkout.status(), PaymentStatus::Failed);
    assert!(booking.confirmations.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(payments.status_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_finished_checkout_cannot_restart() {
    let payments = Arc::new(ScriptedPayments::settled(ProviderStatus::Failed));
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());

    checkout
        .initiate(PaymentMode::Online, &CancelSignal::new())
        .await
        .unwrap_err();
    let err = checkout
        .initiate(PaymentMode::Online, &CancelSignal::new())
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(payments.init_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cash_settles_without_polling() {
    let payments = Arc::new(ScriptedPayments::settled(ProviderStatus::Success));
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());
    let mut status = checkout.subscribe();

    let outcome = checkout
        .initiate(PaymentMode::Cash, &CancelSignal::new())
        .await
        .unwrap();

    assert!(matches!(outcome, CheckoutOutcome::Confirmed(_)));
    assert_eq!(payments.status_calls(), 0);
    assert_eq!(booking.confirmations.lock().unwrap().len(), 1);
    assert_eq!(*status.borrow_and_update(), PaymentStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_while_polling_fails_gracefully() {
    let payments = Arc::new(
        ScriptedPayments::pending("pay_1")
            .then(ProviderStatus::Pending)
            .then_response(Err(ApiError::fallback("PAYMENT", Some(404)))),
    );
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());

    let err = checkout
        .initiate(PaymentMode::Online, &CancelSignal::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Service);
    assert!(err.message.contains("no longer exists"));
    assert_eq!(checkout.status(), PaymentStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_status_for_another_intent_fails() {
    let payments = Arc::new(ScriptedPayments::pending("pay_1").then_response(Ok(
        PaymentStatusResponse {
            status: ProviderStatus::Success,
            intent_id: Some("bi_other".to_string()),
        },
    )));
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());

    let err = checkout
        .initiate(PaymentMode::Online, &CancelSignal::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Service);
    assert!(booking.confirmations.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_poll_ceiling_times_out() {
    let payments = Arc::new(ScriptedPayments::pending("pay_1"));
    let booking = Arc::new(FakeBooking::default());
    let policy = PollPolicy {
        interval: Duration::from_secs(3),
        max_attempts: Some(5),
    };
    let checkout = orchestrator(&payments, &booking, Some(2400), policy);

    let err = checkout
        .initiate(PaymentMode::Online, &CancelSignal::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(payments.status_calls(), 5);
    assert_eq!(checkout.status(), PaymentStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_abandons_without_failing() {
    let payments = Arc::new(ScriptedPayments::pending("pay_1"));
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());
    let cancel = CancelSignal::new();

    let running = {
        let checkout = checkout.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { checkout.initiate(PaymentMode::Online, &cancel).await })
    };
    tokio::time::sleep(Duration::from_secs(7)).await;
    cancel.cancel();

    let outcome = running.await.unwrap().unwrap();
    assert!(matches!(outcome, CheckoutOutcome::Abandoned { .. }));
    assert_eq!(checkout.status(), PaymentStatus::Pending);
    assert_eq!(checkout.attempt().unwrap().payment_id.as_deref(), Some("pay_1"));

    let checks = payments.status_calls();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(payments.status_calls(), checks);
}

#[tokio::test]
async fn test_cancelled_before_start_makes_no_call() {
    let payments = Arc::new(ScriptedPayments::pending("pay_1"));
    let booking = Arc::new(FakeBooking::default());
    let checkout = orchestrator(&payments, &booking, Some(2400), PollPolicy::default());
    let cancel = CancelSignal::new();
    cancel.cancel();

    let outcome = checkout.initiate(PaymentMode::Online, &cancel).await.unwrap();

    assert_eq!(outcome, CheckoutOutcome::Abandoned { payment_id: None });
    assert_eq!(payments.init_calls(), 0);
    assert_eq!(checkout.status(), PaymentStatus::Idle);
}
