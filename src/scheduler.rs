//! Refresh scheduler: owns the refresh state and the current market report.
//!
//! At most one fetch is in flight. The guard is an `AtomicBool` claimed with
//! compare-and-swap, so concurrent callers on the multi-threaded runtime cannot
//! both start a fetch. All other state sits behind one `Mutex` that is never
//! held across an `.await`; each mutation (request, completion, language
//! switch) is applied in a single critical section.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::ai::{self, DynMarketClient};
use crate::config::clamp_interval;
use crate::i18n;
use crate::market::{Language, MarketReport};

/// Time source, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshState {
    pub is_loading: bool,
    pub next_update_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

/// Consistent copy of everything the rendering layer needs.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub language: Language,
    pub interval: Duration,
    pub state: RefreshState,
    pub report: Option<Arc<MarketReport>>,
}

struct Inner {
    state: RefreshState,
    report: Option<Arc<MarketReport>>,
    language: Language,
    interval: Duration,
    /// Bumped on language switch so results for the old language are dropped.
    generation: u64,
    /// Last failure was a configuration error; ticks stop retrying until a
    /// fetch succeeds.
    config_blocked: bool,
}

struct Shared {
    client: DynMarketClient,
    clock: Arc<dyn Clock>,
    in_flight: AtomicBool,
    inner: Mutex<Inner>,
}

#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl Scheduler {
    pub fn new(client: DynMarketClient, language: Language, interval: Duration) -> Self {
        Self::with_clock(client, language, interval, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: DynMarketClient,
        language: Language,
        interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let interval = clamp_interval(interval);
        let next_update_at = clock.now() + to_chrono(interval);
        let inner = Inner {
            state: RefreshState {
                is_loading: false,
                next_update_at,
                last_error: None,
            },
            report: None,
            language,
            interval,
            generation: 0,
            config_blocked: false,
        };
        Self {
            shared: Arc::new(Shared {
                client,
                clock,
                in_flight: AtomicBool::new(false),
                inner: Mutex::new(inner),
            }),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.shared.clock.now()
    }

    /// Start a fetch unless one is already running. Returns the task handle, or
    /// `None` when the request was skipped.
    pub fn request_refresh(&self) -> Option<JoinHandle<()>> {
        if self
            .shared
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            counter!("dashboard_fetch_skipped_total").increment(1);
            debug!(target: "scheduler", "refresh skipped: fetch already in flight");
            return None;
        }

        let (language, generation) = {
            let mut g = self.shared.lock();
            g.state.is_loading = true;
            (g.language, g.generation)
        };

        let shared = Arc::clone(&self.shared);
        Some(tokio::spawn(async move {
            Shared::run_fetch(shared, language, generation).await;
        }))
    }

    /// Periodic check: refresh once `now` has reached the armed deadline.
    /// A configuration failure is not retried by ticks; manual requests still go through.
    pub fn tick(&self, now: DateTime<Utc>) -> Option<JoinHandle<()>> {
        let due = {
            let g = self.shared.lock();
            !g.state.is_loading && !g.config_blocked && now >= g.state.next_update_at
        };
        if due {
            self.request_refresh()
        } else {
            None
        }
    }

    /// New interval for future scheduling. The armed deadline is left alone.
    pub fn set_interval(&self, interval: Duration) -> Duration {
        let interval = clamp_interval(interval);
        self.shared.lock().interval = interval;
        info!(target: "scheduler", interval_secs = interval.as_secs(), "refresh interval changed");
        interval
    }

    /// Drops the current report (its text is in the old language) and fetches
    /// again. A fetch still running for the old language is discarded when it
    /// completes and a new one starts straight after.
    pub fn set_language(&self, language: Language) -> Option<JoinHandle<()>> {
        {
            let mut g = self.shared.lock();
            if g.language == language {
                return None;
            }
            g.language = language;
            g.report = None;
            g.state.last_error = None;
            g.generation = g.generation.wrapping_add(1);
        }
        info!(target: "scheduler", language = language.code(), "display language changed");
        self.request_refresh()
    }

    pub fn snapshot(&self) -> DashboardView {
        let g = self.shared.lock();
        DashboardView {
            language: g.language,
            interval: g.interval,
            state: g.state.clone(),
            report: g.report.clone(),
        }
    }

    pub fn state(&self) -> RefreshState {
        self.shared.lock().state.clone()
    }

    pub fn report(&self) -> Option<Arc<MarketReport>> {
        self.shared.lock().report.clone()
    }

    pub fn client(&self) -> &DynMarketClient {
        &self.shared.client
    }

    /// Spawn the periodic task that calls [`Scheduler::tick`] every `period`.
    pub fn spawn_ticker(&self, period: Duration) -> TickerHandle {
        let (tx, mut rx) = watch::channel(false);
        let scheduler = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let _ = scheduler.tick(scheduler.now());
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!(target: "scheduler", "ticker stopped");
        });
        TickerHandle {
            shutdown: tx,
            task: Some(task),
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Poisoning ignored: writes are single-field assignments.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn run_fetch(shared: Arc<Shared>, language: Language, generation: u64) {
        let mut guard = FetchGuard {
            shared: Arc::clone(&shared),
            armed: true,
        };
        let started = Instant::now();
        counter!("dashboard_fetch_total").increment(1);

        let clock = Arc::clone(&shared.clock);
        let result = ai::fetch_market_report(shared.client.as_ref(), language, || {
            clock.now().with_timezone(&Local).fixed_offset()
        })
        .await;
        histogram!("dashboard_fetch_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        let now = shared.clock.now();
        let stale = {
            let mut g = shared.lock();
            let stale = g.generation != generation;
            if stale {
                debug!(target: "scheduler", "discarding result fetched for previous language");
            } else {
                match result {
                    Ok(report) => {
                        g.report = Some(Arc::new(report));
                        g.state.last_error = None;
                        g.config_blocked = false;
                        g.state.next_update_at = now + to_chrono(g.interval);
                        gauge!("dashboard_last_success_ts").set(now.timestamp() as f64);
                        info!(
                            target: "scheduler",
                            next_update_at = %g.state.next_update_at,
                            "market data refreshed"
                        );
                    }
                    Err(e) => {
                        counter!("dashboard_fetch_errors_total").increment(1);
                        let repeated = e.is_configuration() && g.config_blocked;
                        if repeated {
                            debug!(target: "scheduler", error = %e, "market data still unavailable");
                        } else {
                            warn!(target: "scheduler", error = %e, "market data fetch failed");
                        }
                        g.config_blocked = e.is_configuration();
                        g.state.last_error = Some(i18n::error_message(&e, language));
                    }
                }
            }
            g.state.is_loading = false;
            shared.in_flight.store(false, Ordering::Release);
            guard.armed = false;
            stale
        };

        if stale {
            let scheduler = Scheduler { shared };
            // Detached; completion is observed through state.
            let _ = scheduler.request_refresh();
        }
    }
}

/// Releases the fetch slot if the task ends before its completion step,
/// e.g. a panicking client or an aborted task.
struct FetchGuard {
    shared: Arc<Shared>,
    armed: bool,
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        if self.armed {
            self.shared.lock().state.is_loading = false;
            self.shared.in_flight.store(false, Ordering::Release);
        }
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    // Intervals are clamped well below chrono's range.
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::zero())
}

/// Handle to the periodic tick task. `shutdown` stops it cleanly; dropping the
/// handle aborts it.
pub struct TickerHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TickerHandle {
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{DisabledClient, MockClient};
    use crate::config::MIN_INTERVAL;

    #[tokio::test]
    async fn initial_state_is_idle_and_armed_one_interval_ahead() {
        let s = Scheduler::new(Arc::new(MockClient), Language::En, Duration::from_secs(60));
        let st = s.state();
        assert!(!st.is_loading);
        assert!(st.last_error.is_none());
        assert!(st.next_update_at > Utc::now());
        assert!(s.report().is_none());
    }

    #[tokio::test]
    async fn configuration_error_is_localized() {
        let s = Scheduler::new(Arc::new(DisabledClient), Language::Ar, Duration::from_secs(60));
        s.request_refresh().unwrap().await.unwrap();
        let st = s.state();
        assert!(!st.is_loading);
        assert_eq!(
            st.last_error.as_deref(),
            Some(i18n::messages(Language::Ar).missing_key)
        );
        assert!(s.tick(Utc::now() + chrono::Duration::days(1)).is_none());
    }

    #[tokio::test]
    async fn zero_interval_is_clamped() {
        let s = Scheduler::new(Arc::new(MockClient), Language::En, Duration::ZERO);
        assert_eq!(s.snapshot().interval, MIN_INTERVAL);
        assert_eq!(s.set_interval(Duration::ZERO), MIN_INTERVAL);
    }

    #[tokio::test]
    async fn same_language_is_noop() {
        let s = Scheduler::new(Arc::new(MockClient), Language::En, Duration::from_secs(60));
        assert!(s.set_language(Language::En).is_none());
        assert!(!s.state().is_loading);
    }
}
