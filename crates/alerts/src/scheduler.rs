//! Periodic escalation of overdue pending alerts.
//!
//! Each pass collects overdue alerts and escalates them through the same
//! path as a manual escalation. A failure on one alert is logged and the
//! pass moves on to the next. Passes run on a fixed interval until the
//! cancellation token fires.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use carecall_core::alert::Alert;
use carecall_core::error::CoreError;

use crate::service::AlertService;

/// Default time between scheduler passes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default number of alerts escalated concurrently within a pass.
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    /// Uniform overdue cutoff. `None` uses each alert's own timeout.
    pub timeout_minutes: Option<i32>,
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout_minutes: None,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Counts for a single scheduler pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Overdue alerts found at the start of the pass.
    pub candidates: usize,
    /// Escalated and handed to another staff member.
    pub escalated: usize,
    /// Escalated with nobody eligible on duty.
    pub unassigned: usize,
    /// Changed by someone else between lookup and commit.
    pub conflicts: usize,
    pub failed: usize,
    /// Not attempted because the pass was cancelled.
    pub skipped: usize,
}

impl PassReport {
    pub fn total_escalated(&self) -> usize {
        self.escalated + self.unassigned
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Escalated,
    Unassigned,
    Conflict,
    Failed,
    Skipped,
}

pub struct EscalationScheduler {
    service: AlertService,
    config: SchedulerConfig,
}

impl EscalationScheduler {
    pub fn new(service: AlertService, config: SchedulerConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run scheduler passes on the configured interval until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            timeout_minutes = ?self.config.timeout_minutes,
            concurrency = self.config.concurrency,
            "Escalation scheduler started"
        );

        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Escalation scheduler stopping");
                    break;
                }
                _ = interval.tick() => {
                    match self.run_pass(&cancel).await {
                        Ok(report) if report.candidates == 0 => {
                            tracing::debug!("Escalation pass: nothing overdue");
                        }
                        Ok(report) => {
                            tracing::info!(
                                candidates = report.candidates,
                                escalated = report.escalated,
                                unassigned = report.unassigned,
                                conflicts = report.conflicts,
                                failed = report.failed,
                                skipped = report.skipped,
                                "Escalation pass complete"
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Escalation pass: overdue lookup failed");
                        }
                    }
                }
            }
        }
    }

    /// Run a single pass.
    ///
    /// Fails only when the overdue lookup itself fails. Per-alert failures
    /// are counted in the report. Alerts not yet started when `cancel`
    /// fires are skipped.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<PassReport, CoreError> {
        let candidates = self.service.find_overdue(self.config.timeout_minutes).await?;

        let mut report = PassReport {
            candidates: candidates.len(),
            ..PassReport::default()
        };

        let outcomes: Vec<Outcome> = stream::iter(candidates)
            .map(|alert| self.escalate_one(alert, cancel))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Outcome::Escalated => report.escalated += 1,
                Outcome::Unassigned => report.unassigned += 1,
                Outcome::Conflict => report.conflicts += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Skipped => report.skipped += 1,
            }
        }

        Ok(report)
    }

    async fn escalate_one(&self, alert: Alert, cancel: &CancellationToken) -> Outcome {
        if cancel.is_cancelled() {
            return Outcome::Skipped;
        }

        match self.service.escalate(alert.id, None).await {
            Ok(escalation) if escalation.reassigned_to.is_some() => Outcome::Escalated,
            Ok(_) => Outcome::Unassigned,
            // Acknowledged or escalated by someone else since the lookup.
            Err(CoreError::Conflict(_) | CoreError::InvalidTransition { .. }) => {
                tracing::debug!(alert_id = alert.id, "Overdue alert changed before escalation");
                Outcome::Conflict
            }
            Err(e) => {
                tracing::error!(
                    alert_id = alert.id,
                    room_id = alert.room_id,
                    error = %e,
                    "Failed to escalate overdue alert"
                );
                Outcome::Failed
            }
        }
    }
}
