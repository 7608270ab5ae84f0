//! Periodic grouping runs
//!
//! Scheduled and manual runs share one lock, so a run never starts while
//! another is still loading, grouping or writing.

use crate::config::ScheduleConfig;
use crate::grouping::error::Result;
use crate::grouping::{GroupingRunner, RespondentSource, RosterSink, RunOutcome, RunOverrides};
use crate::{log_error, log_info, log_warn};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

pub struct GroupingScheduler<S> {
    runner: AsyncMutex<GroupingRunner<S>>,
    period: Duration,
    run_on_start: bool,
}

impl<S> GroupingScheduler<S>
where
    S: RespondentSource + RosterSink,
{
    pub fn new(runner: GroupingRunner<S>, config: &ScheduleConfig) -> Self {
        Self {
            runner: AsyncMutex::new(runner),
            period: Duration::from_secs(config.interval_secs.max(1)),
            run_on_start: config.run_on_start,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Run once, waiting for any run already in flight
    pub async fn run_now(&self, overrides: RunOverrides) -> Result<RunOutcome> {
        let runner = self.runner.lock().await;
        let outcome = runner.run(overrides).await;
        report(&outcome);
        outcome
    }

    /// Run on every tick until `cancel` fires. A failed run is logged and the
    /// next tick tries again. Returns the number of runs attempted.
    pub async fn run_forever(&self, cancel: CancellationToken) -> usize {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.run_on_start {
            // the first tick completes immediately
            ticker.tick().await;
        }

        let mut attempts = 0;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log_info!("Grouping scheduler stopped after {} runs", attempts);
                    return attempts;
                }
                _ = ticker.tick() => {
                    attempts += 1;
                    let _ = self.run_now(RunOverrides::default()).await;
                }
            }
        }
    }
}

fn report(outcome: &Result<RunOutcome>) {
    match outcome {
        Ok(RunOutcome::Grouped(run)) => log_info!(
            "Clustering completed: {} groups from {} respondents ({} transfers)",
            run.groups.len(),
            run.respondent_count(),
            run.transfers.len()
        ),
        Ok(RunOutcome::Skipped {
            respondents,
            required,
        }) => log_warn!(
            "Clustering skipped - not enough data ({} of {} respondents)",
            respondents,
            required
        ),
        Err(e) => log_error!("Error during clustering: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupingConfig;
    use crate::db::DatabaseError;
    use crate::grouping::{GroupRecord, RespondentRecord, RosterWriteMode};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryStore {
        records: Vec<RespondentRecord>,
        writes: Mutex<Vec<Vec<GroupRecord>>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl RespondentSource for MemoryStore {
        async fn load_respondents(&self) -> std::result::Result<Vec<RespondentRecord>, DatabaseError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(self.records.clone())
        }
    }

    #[async_trait]
    impl RosterSink for MemoryStore {
        async fn write_roster(
            &self,
            groups: &[GroupRecord],
            _mode: RosterWriteMode,
        ) -> std::result::Result<(), DatabaseError> {
            tokio::task::yield_now().await;
            self.writes.lock().unwrap().push(groups.to_vec());
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn store(n: usize) -> Arc<MemoryStore> {
        Arc::new(MemoryStore {
            records: (0..n)
                .map(|i| RespondentRecord::new(format!("u{i}@x"), format!("h{}", i % 3), "t"))
                .collect(),
            ..Default::default()
        })
    }

    fn scheduler(store: Arc<MemoryStore>, config: ScheduleConfig) -> GroupingScheduler<MemoryStore> {
        let grouping = GroupingConfig {
            rng_seed: Some(1),
            ..Default::default()
        };
        GroupingScheduler::new(
            GroupingRunner::new(store, grouping, RosterWriteMode::Replace),
            &config,
        )
    }

    #[tokio::test]
    async fn test_concurrent_triggers_are_serialized() {
        let store = store(10);
        let scheduler = Arc::new(scheduler(store.clone(), ScheduleConfig::default()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = scheduler.clone();
                tokio::spawn(async move { s.run_now(RunOverrides::default()).await })
            })
            .collect();
        for h in handles {
            assert!(!h.await.unwrap().unwrap().is_skipped());
        }

        assert_eq!(store.writes.lock().unwrap().len(), 4);
        assert_eq!(store.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_skipped_run_writes_nothing() {
        let store = store(3);
        let outcome = scheduler(store.clone(), ScheduleConfig::default())
            .run_now(RunOverrides::default())
            .await
            .unwrap();
        assert!(outcome.is_skipped());
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_forever_ticks_until_cancelled() {
        let store = store(10);
        let config = ScheduleConfig {
            interval_secs: 60,
            run_on_start: true,
        };
        let scheduler = Arc::new(scheduler(store.clone(), config));
        let cancel = CancellationToken::new();

        let task = {
            let s = scheduler.clone();
            let c = cancel.clone();
            tokio::spawn(async move { s.run_forever(c).await })
        };

        tokio::time::sleep(Duration::from_secs(150)).await;
        cancel.cancel();
        let attempts = task.await.unwrap();

        // ticks at 0s, 60s and 120s
        assert_eq!(attempts, 3);
        assert_eq!(store.writes.lock().unwrap().len(), 3);
    }
}
