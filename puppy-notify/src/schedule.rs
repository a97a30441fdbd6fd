//! Periodic trigger for the hourly worker (feature `async`).
//!
//! Mirrors the host's unique periodic work: one tick per interval, and a
//! tick that asks for a retry is re-run with doubling backoff until it
//! succeeds or the next periodic tick is due.
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::config::NotifierConfig;
use crate::store::PersistedStore;
use crate::worker::{HourlyWorker, NotificationSink, WorkResult};

/// Timing for the periodic trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlySchedule {
    pub unique_name: String,
    pub interval: Duration,
    pub retry_backoff: Duration,
    pub max_backoff: Duration,
}

impl HourlySchedule {
    #[must_use]
    pub fn new(
        unique_name: &str,
        interval: Duration,
        retry_backoff: Duration,
        max_backoff: Duration,
    ) -> Self {
        Self {
            unique_name: unique_name.to_string(),
            interval: interval.max(Duration::from_millis(1)),
            retry_backoff,
            max_backoff: max_backoff.max(retry_backoff),
        }
    }

    #[must_use]
    pub fn from_config(config: &NotifierConfig) -> Self {
        Self::new(
            &config.unique_work_name,
            config.interval(),
            config.retry_backoff(),
            config.max_backoff(),
        )
    }

    /// Delay before retry number `attempt` (zero-based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.retry_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Counters collected while the schedule ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleReport {
    pub ticks: u32,
    pub attempts: u32,
    pub successes: u32,
    pub retries: u32,
}

/// Run one blocking tick. On a multi-threaded runtime the worker's store I/O
/// moves off the async worker thread; a current-thread runtime runs it inline.
fn run_tick<S, C, K>(worker: &HourlyWorker<S, C, K>) -> WorkResult
where
    S: PersistedStore,
    C: Clock,
    K: NotificationSink,
{
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(|| worker.do_work()),
        _ => worker.do_work(),
    }
}

/// Drive `worker` on `schedule` until `shutdown` flips to `true` or its sender drops.
///
/// On a multi-threaded runtime each tick runs under `block_in_place`; on a
/// current-thread runtime a slow store blocks the loop for the tick.
pub async fn run_schedule<S, C, K>(
    worker: &HourlyWorker<S, C, K>,
    schedule: &HourlySchedule,
    mut shutdown: watch::Receiver<bool>,
) -> ScheduleReport
where
    S: PersistedStore,
    C: Clock,
    K: NotificationSink,
{
    let mut report = ScheduleReport::default();
    if *shutdown.borrow() {
        return report;
    }

    let mut interval = tokio::time::interval(schedule.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    log::info!(
        "schedule `{}` started, every {:?}",
        schedule.unique_name,
        schedule.interval
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        report.ticks += 1;
        let mut retry = 0_u32;
        let mut waited = Duration::ZERO;
        loop {
            report.attempts += 1;
            if run_tick(worker) == WorkResult::Success {
                report.successes += 1;
                break;
            }
            report.retries += 1;
            let delay = schedule.backoff_for(retry);
            retry = retry.saturating_add(1);
            if waited + delay >= schedule.interval {
                log::debug!("giving up on tick {} until the next interval", report.ticks);
                break;
            }
            waited += delay;
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return report;
                    }
                }
            }
        }
    }

    log::info!("schedule `{}` stopped: {report:?}", schedule.unique_name);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MessageCatalog;
    use crate::clock::FixedClock;
    use crate::engine::RotationEngine;
    use crate::store::{JsonFileStore, MemoryStore};
    use crate::worker::RecordingSink;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn fast_schedule() -> HourlySchedule {
        HourlySchedule::new(
            "test",
            Duration::from_millis(20),
            Duration::from_millis(2),
            Duration::from_millis(4),
        )
    }

    fn worker(
        store: &MemoryStore,
        sink: &RecordingSink,
    ) -> HourlyWorker<MemoryStore, FixedClock, RecordingSink> {
        let engine = Arc::new(RotationEngine::with_seed(
            Arc::new(MessageCatalog::from_pool(["A", "B", "C"])),
            store.clone(),
            3,
        ));
        HourlyWorker::new(
            engine,
            FixedClock::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()),
            sink.clone(),
            &NotifierConfig::default(),
        )
    }

    fn stop_after(millis: u64) -> watch::Receiver<bool> {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            let _ = tx.send(true);
        });
        rx
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let schedule = HourlySchedule::new(
            "x",
            Duration::from_secs(3600),
            Duration::from_secs(30),
            Duration::from_secs(100),
        );
        assert_eq!(schedule.backoff_for(0), Duration::from_secs(30));
        assert_eq!(schedule.backoff_for(1), Duration::from_secs(60));
        assert_eq!(schedule.backoff_for(2), Duration::from_secs(100));
        assert_eq!(schedule.backoff_for(40), Duration::from_secs(100));
    }

    #[test]
    fn from_config_uses_config_timing() {
        let schedule = HourlySchedule::from_config(&NotifierConfig::default());
        assert_eq!(schedule.interval, Duration::from_secs(3600));
        assert_eq!(schedule.retry_backoff, Duration::from_secs(30));
        assert_eq!(schedule.unique_name, "findmypuppy_hourly_notifications");
    }

    #[tokio::test]
    async fn runs_ticks_until_shutdown() {
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let worker = worker(&store, &sink);
        let report = run_schedule(&worker, &fast_schedule(), stop_after(70)).await;
        assert!(report.ticks >= 2, "{report:?}");
        assert_eq!(report.successes, report.ticks);
        assert_eq!(report.retries, 0);
        assert_eq!(sink.delivered().len() as u32, report.successes);
    }

    #[tokio::test]
    async fn retries_while_store_is_offline() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let sink = RecordingSink::new();
        let worker = worker(&store, &sink);
        let report = run_schedule(&worker, &fast_schedule(), stop_after(50)).await;
        assert!(report.retries > report.ticks, "{report:?}");
        assert_eq!(report.successes, 0);
        assert!(sink.delivered().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn file_store_ticks_on_multi_thread_runtime() {
        let dir = std::env::temp_dir().join(format!(
            "puppy-notify-schedule-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let store = JsonFileStore::open(&dir, "schedule").unwrap();
        let sink = RecordingSink::new();
        let engine = Arc::new(RotationEngine::with_seed(
            Arc::new(MessageCatalog::from_pool(["A", "B", "C"])),
            store,
            3,
        ));
        let worker = HourlyWorker::new(
            engine,
            FixedClock::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()),
            sink.clone(),
            &NotifierConfig::default(),
        );
        let report = run_schedule(&worker, &fast_schedule(), stop_after(70)).await;
        assert!(report.successes >= 2, "{report:?}");
        assert_eq!(sink.delivered().len() as u32, report.successes);
        assert!(dir.join("schedule.json").exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn already_stopped_schedule_does_nothing() {
        let (_tx, rx) = watch::channel(true);
        let store = MemoryStore::new();
        let sink = RecordingSink::new();
        let report = run_schedule(&worker(&store, &sink), &fast_schedule(), rx).await;
        assert_eq!(report, ScheduleReport::default());
    }
}
