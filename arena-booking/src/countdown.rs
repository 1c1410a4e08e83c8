use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use arena_core::{CancelSignal, Clock};

/// What the UI shows for an intent's hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownView {
    pub remaining: Duration,
    pub expired: bool,
}

impl CountdownView {
    /// `MM:SS`, minutes uncapped.
    pub fn label(&self) -> String {
        let secs = self.remaining.num_seconds();
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

/// Countdown over a server-issued `expires_at`.
///
/// Expiry is reported once, however many ticks land past the boundary.
#[derive(Debug, Clone)]
pub struct Countdown {
    expires_at: DateTime<Utc>,
    fired: bool,
}

impl Countdown {
    pub fn new(expires_at: DateTime<Utc>) -> Self {
        Self {
            expires_at,
            fired: false,
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> CountdownView {
        let left = self.expires_at - now;
        let remaining = if left < Duration::zero() {
            Duration::zero()
        } else {
            left
        };
        CountdownView {
            remaining,
            expired: remaining == Duration::zero(),
        }
    }

    /// Recompute the view; the second value is `true` on the one tick that crosses zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> (CountdownView, bool) {
        let view = self.view(now);
        let just_expired = view.expired && !self.fired;
        if just_expired {
            self.fired = true;
        }
        (view, just_expired)
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Handle to a running countdown. Dropping it stops the timer.
pub struct CountdownTask {
    handle: JoinHandle<()>,
}

impl CountdownTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for CountdownTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Tick `on_tick` every `tick` until the hold lapses, then call `on_expire` once and stop.
///
/// The task also stops when `signal` is cancelled. It never touches the registry or any
/// in-flight payment.
pub fn spawn_countdown<T, E>(
    intent_id: String,
    expires_at: DateTime<Utc>,
    clock: Arc<dyn Clock>,
    tick: std::time::Duration,
    mut on_tick: T,
    on_expire: E,
    signal: CancelSignal,
) -> CountdownTask
where
    T: FnMut(CountdownView) + Send + 'static,
    E: FnOnce(&str) + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut countdown = Countdown::new(expires_at);
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut on_expire = Some(on_expire);

        loop {
            tokio::select! {
                _ = signal.cancelled() => {
                    debug!("Countdown for intent {} torn down", intent_id);
                    break;
                }
                _ = interval.tick() => {
                    let (view, just_expired) = countdown.tick(clock.now());
                    on_tick(view);
                    if just_expired {
                        info!("Intent {} hold lapsed", intent_id);
                        if let Some(callback) = on_expire.take() {
                            callback(&intent_id);
                        }
                        break;
                    }
                }
            }
        }
    });

    CountdownTask { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    /// Wall clock driven by tokio's (pausable) clock.
    struct TokioClock {
        base: DateTime<Utc>,
        started: tokio::time::Instant,
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            let elapsed = tokio::time::Instant::now() - self.started;
            self.base + Duration::from_std(elapsed).unwrap()
        }
    }

    #[test]
    fn test_view_is_floor_clamped() {
        let countdown = Countdown::new(base());
        let view = countdown.view(base() - Duration::seconds(75));
        assert_eq!(view.label(), "01:15");
        assert!(!view.expired);

        let view = countdown.view(base() + Duration::seconds(30));
        assert_eq!(view.remaining, Duration::zero());
        assert!(view.expired);
        assert_eq!(view.label(), "00:00");
    }

    #[test]
    fn test_expiry_reported_exactly_once() {
        let mut countdown = Countdown::new(base());
        assert!(!countdown.tick(base() - Duration::seconds(1)).1);
        assert!(countdown.tick(base()).1);
        assert!(!countdown.tick(base() + Duration::seconds(1)).1);
        assert!(!countdown.tick(base() + Duration::seconds(2)).1);
        assert!(countdown.has_fired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_task_fires_once_and_stops() {
        let clock = Arc::new(TokioClock {
            base: base(),
            started: tokio::time::Instant::now(),
        });
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let expired = Arc::new(AtomicUsize::new(0));

        let ticks_seen = ticks.clone();
        let expired_seen = expired.clone();
        let task = spawn_countdown(
            "bi_1".to_string(),
            base() + Duration::seconds(3),
            clock,
            std::time::Duration::from_secs(1),
            move |view| ticks_seen.lock().unwrap().push(view.remaining.num_seconds()),
            move |id| {
                assert_eq!(id, "bi_1");
                expired_seen.fetch_add(1, Ordering::SeqCst);
            },
            CancelSignal::new(),
        );

        tokio::time::sleep(std::time::Duration::from_secs(10)).await;

        assert_eq!(expired.load(Ordering::SeqCst), 1);
        assert_eq!(*ticks.lock().unwrap(), vec![3, 2, 1, 0]);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticking() {
        let clock = Arc::new(TokioClock {
            base: base(),
            started: tokio::time::Instant::now(),
        });
        let ticks = Arc::new(AtomicUsize::new(0));
        let signal = CancelSignal::new();

        let seen = ticks.clone();
        let task = spawn_countdown(
            "bi_2".to_string(),
            base() + Duration::minutes(10),
            clock,
            std::time::Duration::from_secs(1),
            move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            },
            |_| panic!("should not expire"),
            signal.clone(),
        );

        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        signal.cancel();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let after_cancel = ticks.load(Ordering::SeqCst);

        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), after_cancel);
        assert_eq!(after_cancel, 3);
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_task() {
        let clock = Arc::new(TokioClock {
            base: base(),
            started: tokio::time::Instant::now(),
        });
        let ticks = Arc::new(AtomicUsize::new(0));

        let seen = ticks.clone();
        let task = spawn_countdown(
            "bi_3".to_string(),
            base() + Duration::minutes(10),
            clock,
            std::time::Duration::from_secs(1),
            move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            },
            |_| {},
            CancelSignal::new(),
        );

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        drop(task);
        let at_drop = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), at_drop);
    }
}
