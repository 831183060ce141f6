//! Periodic health checking.
//!
//! # Responsibilities
//! - Probe every registered provider on a fixed interval
//! - Recompute the eligible count in the same lock acquisition
//! - Report excluded providers to the exclusion sink

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::entropy::RandomSource;
use crate::health::sink::ExclusionSink;
use crate::health::state::CheckerState;
use crate::lifecycle::Shutdown;
use crate::load_balancer::pool::SharedPool;
use crate::load_balancer::types::ProviderId;
use crate::observability::metrics;

/// Result of one probe pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub eligible: usize,
    pub excluded: Vec<ProviderId>,
}

/// Everything a probe pass needs, cloned into each spawned loop.
#[derive(Clone)]
struct ProbeCycle {
    pool: SharedPool,
    source: Arc<dyn RandomSource>,
    sink: Arc<dyn ExclusionSink>,
    message: Arc<Mutex<String>>,
}

impl ProbeCycle {
    /// Probe all providers while holding the pool lock for the whole pass, so
    /// dispatch never sees a partially updated eligible set.
    fn run(&self) -> CycleReport {
        let mut state = self.pool.lock();

        {
            let message = self.message.lock().unwrap_or_else(PoisonError::into_inner);
            if !message.is_empty() {
                tracing::info!("{}", message);
            }
        }

        let mut eligible = 0;
        let mut excluded = Vec::new();
        for provider in state.registry.providers_mut() {
            if provider.probe(self.source.as_ref()) {
                eligible += 1;
            } else {
                excluded.push(provider.id().clone());
            }
            metrics::record_provider_health(provider.id().as_str(), provider.is_working());
        }
        state.registry.set_eligible_count(eligible);

        if !excluded.is_empty() {
            self.sink.providers_excluded(&excluded);
        }
        metrics::record_health_cycle(eligible);
        tracing::debug!(
            eligible,
            excluded = excluded.len(),
            total = state.registry.len(),
            "Health check cycle complete"
        );

        CycleReport { eligible, excluded }
    }

    async fn run_loop(self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_ms = interval.as_millis() as u64, "Health checker starting");

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Health checker received stop signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.run();
                }
            }
        }
    }
}

struct RunningLoop {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl RunningLoop {
    /// The loop holds its receiver until it exits.
    fn is_live(&self) -> bool {
        self.shutdown.listeners() > 0
    }
}

/// Background task that keeps provider health current.
pub struct HealthChecker {
    cycle: ProbeCycle,
    interval_ms: AtomicU64,
    running: Mutex<Option<RunningLoop>>,
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthChecker")
            .field("interval", &self.interval())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl HealthChecker {
    pub fn new(
        pool: SharedPool,
        source: Arc<dyn RandomSource>,
        sink: Arc<dyn ExclusionSink>,
        config: &HealthCheckConfig,
    ) -> Self {
        Self {
            cycle: ProbeCycle {
                pool,
                source,
                sink,
                message: Arc::new(Mutex::new(config.cycle_message.clone())),
            },
            interval_ms: AtomicU64::new(config.interval_ms.max(1)),
            running: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.load(Ordering::Relaxed))
    }

    /// Change the probe interval. Rejects zero; applies from the next start.
    pub fn set_interval(&self, interval: Duration) -> bool {
        let millis = interval.as_millis();
        if millis == 0 {
            return false;
        }
        self.interval_ms
            .store(u64::try_from(millis).unwrap_or(u64::MAX), Ordering::Relaxed);
        true
    }

    /// Line logged at the start of every pass; empty disables it.
    pub fn set_cycle_message(&self, message: impl Into<String>) {
        *self.cycle.message.lock().unwrap_or_else(PoisonError::into_inner) = message.into();
    }

    pub fn state(&self) -> CheckerState {
        let running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        match running.as_ref() {
            Some(r) if r.is_live() => CheckerState::Running,
            _ => CheckerState::Stopped,
        }
    }

    /// Spawn the probe loop on the current Tokio runtime.
    ///
    /// Returns false if a loop is already running, or if called outside a
    /// runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(running.as_ref(), Some(r) if r.is_live()) {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Health checker needs a Tokio runtime");
                return false;
            }
        };

        let shutdown = Shutdown::new();
        let handle = runtime.spawn(self.cycle.clone().run_loop(self.interval(), shutdown.subscribe()));
        *running = Some(RunningLoop { shutdown, handle });
        true
    }

    /// Signal the loop to exit. Returns whether a loop was running.
    ///
    /// The pass itself never awaits, so the pool lock is never held when the
    /// loop observes the signal.
    pub fn stop(&self) -> bool {
        let taken = self.running.lock().unwrap_or_else(PoisonError::into_inner).take();
        taken.is_some_and(|r| r.shutdown.trigger())
    }

    /// Stop the loop and wait for it to finish.
    pub async fn shutdown(&self) {
        let taken = self.running.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(r) = taken {
            r.shutdown.trigger();
            if let Err(e) = r.handle.await {
                tracing::error!(error = %e, "Health checker task failed");
            }
        }
    }

    /// Run one probe pass on the calling thread.
    pub fn run_once(&self) -> CycleReport {
        self.cycle.run()
    }
}

impl Drop for HealthChecker {
    fn drop(&mut self) {
        self.stop();
    }
}
