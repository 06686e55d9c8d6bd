//! In-process scheduler for daily jobs
//!
//! Each job fires once a day at a fixed UTC time. A firing while the previous
//! run of the same job is still active is skipped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::domain::DomainError;

/// Work run by the scheduler
#[async_trait]
pub trait Job: Send + Sync {
    fn id(&self) -> &str;

    async fn run(&self) -> Result<(), DomainError>;
}

/// Fixed time of day, UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32) -> Result<Self, DomainError> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
            DomainError::configuration(format!("Invalid schedule time {:02}:{:02}", hour, minute))
        })?;

        Ok(Self { time })
    }

    /// First firing strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.time).and_utc();

        if today > now {
            today
        } else {
            today
                .checked_add_days(Days::new(1))
                .unwrap_or(today)
        }
    }
}

/// A job with its schedule and overlap guard
#[derive(Clone)]
pub struct ScheduledJob {
    job: Arc<dyn Job>,
    schedule: DailySchedule,
    running: Arc<AtomicBool>,
}

impl ScheduledJob {
    pub fn new(job: Arc<dyn Job>, schedule: DailySchedule) -> Self {
        Self {
            job,
            schedule,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &str {
        self.job.id()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start one run unless the previous one is still active
    pub fn trigger(&self) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!(job_id = %self.id(), "Previous run still active, skipping");
            return None;
        }

        let job = self.job.clone();
        let running = self.running.clone();

        Some(tokio::spawn(async move {
            debug!(job_id = %job.id(), "Running job");
            if let Err(e) = job.run().await {
                error!(job_id = %job.id(), error = %e, "Job failed");
            }
            running.store(false, Ordering::SeqCst);
        }))
    }
}

/// Owns the job loops and stops them on shutdown
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);

        Self {
            jobs: Vec::new(),
            shutdown,
            handles: Vec::new(),
        }
    }

    pub fn add_daily(&mut self, job: Arc<dyn Job>, schedule: DailySchedule) {
        info!(job_id = %job.id(), time = %schedule.time, "Added daily job");
        self.jobs.push(ScheduledJob::new(job, schedule));
    }

    pub fn jobs(&self) -> &[ScheduledJob] {
        &self.jobs
    }

    pub fn is_started(&self) -> bool {
        !self.handles.is_empty()
    }

    pub fn start(&mut self) {
        if self.is_started() {
            return;
        }

        self.shutdown.send_replace(false);
        info!(jobs = self.jobs.len(), "Starting scheduler");

        for job in &self.jobs {
            let job = job.clone();
            let mut shutdown = self.shutdown.subscribe();

            self.handles.push(tokio::spawn(async move {
                loop {
                    let now = Utc::now();
                    let next = job.schedule.next_after(now);
                    let wait = (next - now).to_std().unwrap_or_default();
                    debug!(job_id = %job.id(), next = %next, "Next run scheduled");

                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {
                            job.trigger();
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            }));
        }
    }

    pub async fn shutdown(&mut self) {
        info!("Shutting down scheduler");
        self.shutdown.send_replace(true);

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "Scheduler loop ended abnormally");
            }
        }
    }
}
