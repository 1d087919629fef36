//! Background job runner
//!
//! Each job has a cron expression. The loop sleeps until the earliest next
//! fire time, runs whatever is due, and exits when the shutdown channel fires.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::config::Config;
use crate::db::Database;
use crate::email;
use crate::integrations::{IntegrationError, Integrations};
use crate::spheresync::{self, SphereWeek};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Generate the current week's SphereSync tasks
    SphereSyncWeekly,
    /// Re-send failed emails
    EmailRetry,
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SphereSyncWeekly => "spheresync_weekly",
            Self::EmailRetry => "email_retry",
        }
    }
}

struct ScheduledJob {
    job: Job,
    schedule: Schedule,
}

pub struct Scheduler {
    db: Arc<Database>,
    integrations: Arc<Integrations>,
    jobs: Vec<ScheduledJob>,
}

impl Scheduler {
    /// Build from config. A bad cron expression is a startup error.
    pub fn new(db: Arc<Database>, integrations: Arc<Integrations>, config: &Config) -> Result<Self, String> {
        let jobs = vec![
            ScheduledJob {
                job: Job::SphereSyncWeekly,
                schedule: parse_schedule(Job::SphereSyncWeekly, &config.spheresync_cron)?,
            },
            ScheduledJob {
                job: Job::EmailRetry,
                schedule: parse_schedule(Job::EmailRetry, &config.email_retry_cron)?,
            },
        ];
        Ok(Self { db, integrations, jobs })
    }

    /// Earliest upcoming fire time after `after`
    fn next_due(&self, after: DateTime<Utc>) -> Option<(DateTime<Utc>, Vec<Job>)> {
        let upcoming: Vec<(DateTime<Utc>, Job)> = self
            .jobs
            .iter()
            .filter_map(|j| j.schedule.after(&after).next().map(|at| (at, j.job)))
            .collect();

        let earliest = upcoming.iter().map(|(at, _)| *at).min()?;
        let due = upcoming
            .into_iter()
            .filter(|(at, _)| *at == earliest)
            .map(|(_, job)| job)
            .collect();
        Some((earliest, due))
    }

    pub async fn start(&self, mut shutdown: oneshot::Receiver<()>) {
        log::info!("[SCHEDULER] Started with {} jobs", self.jobs.len());

        loop {
            let Some((at, due)) = self.next_due(Utc::now()) else {
                log::warn!("[SCHEDULER] No upcoming job times, stopping");
                return;
            };
            let wait = (at - Utc::now()).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    for job in due {
                        self.run_job(job).await;
                    }
                }
                _ = &mut shutdown => {
                    log::info!("[SCHEDULER] Shutting down");
                    return;
                }
            }
        }
    }

    pub async fn run_job(&self, job: Job) {
        log::info!("[SCHEDULER] Running {}", job.name());
        let result = match job {
            Job::SphereSyncWeekly => self.run_spheresync().await,
            Job::EmailRetry => self.run_email_retry().await,
        };
        if let Err(e) = result {
            log::error!("[SCHEDULER] {} failed: {}", job.name(), e);
        }
    }

    async fn run_spheresync(&self) -> Result<(), String> {
        let week = SphereWeek::of(Utc::now().date_naive());
        let summary = spheresync::generate_week(&self.db, week).map_err(|e| e.to_string())?;

        // Tracker push is optional
        match self.integrations.clickup() {
            Ok(tracker) => {
                spheresync::push_week_to_clickup(&self.db, &tracker, week)
                    .await
                    .map_err(|e| e.to_string())?;
            }
            Err(e @ (IntegrationError::MissingApiKey(_) | IntegrationError::MissingConfig(_))) => {
                log::warn!("[SCHEDULER] Skipping ClickUp push: {}", e);
            }
            Err(e) => return Err(e.to_string()),
        }

        log::info!(
            "[SCHEDULER] SphereSync {}-W{:02}: {} tasks created",
            summary.year,
            summary.week,
            summary.created
        );
        Ok(())
    }

    async fn run_email_retry(&self) -> Result<(), String> {
        let sender = match self.integrations.resend() {
            Ok(sender) => sender,
            Err(e) => {
                log::warn!("[SCHEDULER] Skipping email retry: {}", e);
                return Ok(());
            }
        };
        email::retry_failed(&self.db, &sender).await.map_err(|e| e.to_string())?;
        Ok(())
    }
}

fn parse_schedule(job: Job, expr: &str) -> Result<Schedule, String> {
    Schedule::from_str(expr).map_err(|e| format!("Invalid cron expression for {} ({:?}): {}", job.name(), expr, e))
}
