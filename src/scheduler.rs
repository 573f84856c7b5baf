use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::monitor::{CycleReport, MonitoringCycle};
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval_minutes: u64,
    pub next_run: Option<DateTime<Utc>>,
    pub cycle_in_progress: bool,
    pub last_report: Option<CycleReport>,
}

struct ActiveJob {
    scheduler: JobScheduler,
    job_id: Uuid,
}

/// Fires the monitoring cycle on a fixed interval. Owns its own lifecycle;
/// construct one per process and share it by reference.
pub struct CycleScheduler {
    cycle: Arc<MonitoringCycle>,
    interval: Duration,
    active: Mutex<Option<ActiveJob>>,
    last_report: Arc<RwLock<Option<CycleReport>>>,
}

impl CycleScheduler {
    pub fn new(cycle: Arc<MonitoringCycle>, interval: Duration) -> Self {
        Self {
            cycle,
            interval,
            active: Mutex::new(None),
            last_report: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            tracing::warn!("Scheduler is already running");
            return Ok(());
        }

        let scheduler = JobScheduler::new().await?;

        let cycle = Arc::clone(&self.cycle);
        let last_report = Arc::clone(&self.last_report);
        let job = Job::new_repeated_async(self.interval, move |_uuid, _l| {
            let cycle = Arc::clone(&cycle);
            let last_report = Arc::clone(&last_report);

            Box::pin(async move {
                // Detached so that stopping the scheduler never cuts a cycle short
                tokio::spawn(Self::execute_cycle(cycle, last_report));
            })
        })?;

        let job_id = scheduler.add(job).await?;
        scheduler.start().await?;

        *active = Some(ActiveJob { scheduler, job_id });
        tracing::info!(interval_minutes = self.interval_minutes(), "Scheduler started");
        Ok(())
    }

    /// Cancels future runs. A cycle already running is left to finish.
    pub async fn stop(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(mut job) => {
                job.scheduler.shutdown().await?;
                tracing::info!("Scheduler stopped");
            }
            None => tracing::debug!("Scheduler is not running"),
        }
        Ok(())
    }

    pub async fn status(&self) -> SchedulerStatus {
        let mut active = self.active.lock().await;
        let next_run = match active.as_mut() {
            Some(job) => job
                .scheduler
                .next_tick_for_job(job.job_id)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        SchedulerStatus {
            running: active.is_some(),
            interval_minutes: self.interval_minutes(),
            next_run,
            cycle_in_progress: self.cycle.is_running(),
            last_report: self.last_report.read().await.clone(),
        }
    }

    /// Runs a cycle right away, outside the interval trigger.
    pub async fn run_now(&self) -> Result<Option<CycleReport>> {
        let report = self.cycle.run().await?;
        if let Some(report) = &report {
            *self.last_report.write().await = Some(report.clone());
        }
        Ok(report)
    }

    fn interval_minutes(&self) -> u64 {
        self.interval.as_secs() / 60
    }

    async fn execute_cycle(cycle: Arc<MonitoringCycle>, last_report: Arc<RwLock<Option<CycleReport>>>) {
        match cycle.run().await {
            Ok(Some(report)) => *last_report.write().await = Some(report),
            Ok(None) => {}
            Err(e) => tracing::error!(error = %e, "Scheduled monitoring cycle failed"),
        }
    }
}
