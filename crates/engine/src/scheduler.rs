//! Periodic overdue sweep.
//!
//! [`EscalationScheduler`] runs one sweep immediately on start, so tickets
//! that went overdue while the process was down are caught at once, then
//! one per configured interval. Each sweep loads the actionable tickets,
//! picks those the escalation policy wants escalated and escalates them
//! through [`TicketService::auto_escalate`], which re-checks each ticket
//! under its lock.
//!
//! A failure on one ticket is logged and reported but never stops the
//! sweep. Failed tickets are simply picked up again next cycle, which is
//! safe because auto escalation is idempotent.

use std::sync::Arc;
use std::time::Duration;

use campusdesk_core::error::CoreError;
use campusdesk_core::types::DbId;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::service::TicketService;

/// A ticket (or the initial load, when `ticket_id` is `None`) that failed
/// during a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepFailure {
    pub ticket_id: Option<DbId>,
    pub error: String,
    pub retryable: bool,
}

impl SweepFailure {
    fn new(ticket_id: Option<DbId>, error: &CoreError) -> Self {
        Self {
            ticket_id,
            error: error.to_string(),
            retryable: error.is_retryable(),
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Actionable tickets loaded.
    pub examined: usize,
    /// Tickets that received an automatic escalation.
    pub escalated: usize,
    pub failures: Vec<SweepFailure>,
    /// Cancellation arrived before every candidate was processed.
    pub interrupted: bool,
}

enum Outcome {
    Escalated,
    Unchanged,
    Skipped,
    Failed(SweepFailure),
}

pub struct EscalationScheduler {
    service: Arc<TicketService>,
    interval: Duration,
    concurrency: usize,
}

impl EscalationScheduler {
    /// A zero sweep interval falls back to the default one.
    pub fn new(service: Arc<TicketService>, config: &EngineConfig) -> Self {
        let interval = if config.sweep_interval.is_zero() {
            let fallback = EngineConfig::default().sweep_interval;
            tracing::warn!(
                fallback_secs = fallback.as_secs(),
                "Sweep interval must be positive, using default"
            );
            fallback
        } else {
            config.sweep_interval
        };
        Self {
            service,
            interval,
            concurrency: config.sweep_concurrency.max(1),
        }
    }

    /// Run sweeps until `cancel` fires. The first sweep starts immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            concurrency = self.concurrency,
            "Escalation scheduler started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Escalation scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.sweep(&cancel).await;
                    if report.interrupted {
                        tracing::info!("Escalation sweep interrupted by shutdown");
                    }
                }
            }
        }
    }

    /// Perform one sweep.
    ///
    /// Once `cancel` fires no new ticket is started; tickets already being
    /// escalated finish their save so no decision is left half-applied.
    pub async fn sweep(&self, cancel: &CancellationToken) -> SweepReport {
        let mut report = SweepReport::default();

        let (examined, candidates) = match self.service.escalation_candidates().await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(error = %e, "Escalation sweep could not load tickets");
                report.failures.push(SweepFailure::new(None, &e));
                return report;
            }
        };
        report.examined = examined;

        let outcomes: Vec<Outcome> = stream::iter(candidates)
            .map(|ticket_id| self.process(ticket_id, cancel))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Outcome::Escalated => report.escalated += 1,
                Outcome::Unchanged => {}
                Outcome::Skipped => report.interrupted = true,
                Outcome::Failed(failure) => report.failures.push(failure),
            }
        }

        if report.escalated > 0 || !report.failures.is_empty() {
            tracing::info!(
                examined = report.examined,
                escalated = report.escalated,
                failed = report.failures.len(),
                "Escalation sweep complete"
            );
        } else {
            tracing::debug!(examined = report.examined, "Escalation sweep found nothing to do");
        }
        report
    }

    async fn process(&self, ticket_id: DbId, cancel: &CancellationToken) -> Outcome {
        if cancel.is_cancelled() {
            return Outcome::Skipped;
        }
        match self.service.auto_escalate(ticket_id).await {
            Ok((_, true)) => Outcome::Escalated,
            Ok((_, false)) => Outcome::Unchanged,
            Err(e) => {
                tracing::error!(ticket_id, error = %e, "Failed to escalate ticket");
                Outcome::Failed(SweepFailure::new(Some(ticket_id), &e))
            }
        }
    }
}
