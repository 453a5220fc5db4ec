//! Ticket operations with per-ticket serialization.
//!
//! Every mutation follows the same discipline:
//!
//! 1. take the ticket's lock,
//! 2. reload the ticket from the store,
//! 3. compute the next state with the pure core functions,
//! 4. save it,
//! 5. only then publish notification intents.
//!
//! A failed save leaves the stored ticket untouched and publishes nothing;
//! the computed state is simply dropped. Store calls are bounded by the
//! configured repository timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use campusdesk_core::actor::Actor;
use campusdesk_core::clock::Clock;
use campusdesk_core::error::CoreError;
use campusdesk_core::escalation::{self, EscalationDecision, Escalated};
use campusdesk_core::notification::NotificationIntent;
use campusdesk_core::overdue::{assess, is_overdue, SlaAssessment};
use campusdesk_core::state_machine::{self, AssignmentPolicy};
use campusdesk_core::status::{ActorRole, TicketStatus};
use campusdesk_core::store::{CategoryDirectory, TicketStore};
use campusdesk_core::ticket::{prepare_ticket, CreateTicket, Ticket};
use campusdesk_core::timeline::TimelineEvent;
use campusdesk_core::types::{DbId, Timestamp};
use campusdesk_events::EventBus;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::locks::TicketLocks;

/// A ticket together with its live SLA projection.
#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub sla: SlaAssessment,
}

impl TicketView {
    pub fn at(ticket: Ticket, now: Timestamp) -> Self {
        let sla = assess(&ticket, now);
        Self { ticket, sla }
    }
}

pub struct TicketService {
    store: Arc<dyn TicketStore>,
    categories: Arc<dyn CategoryDirectory>,
    clock: Arc<dyn Clock>,
    bus: Arc<EventBus>,
    locks: TicketLocks,
    policy: AssignmentPolicy,
    repository_timeout: Duration,
}

impl TicketService {
    pub fn new(
        store: Arc<dyn TicketStore>,
        categories: Arc<dyn CategoryDirectory>,
        clock: Arc<dyn Clock>,
        bus: Arc<EventBus>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            store,
            categories,
            clock,
            bus,
            locks: TicketLocks::new(),
            policy: AssignmentPolicy {
                auto_acknowledge: config.auto_acknowledge_on_assign,
            },
            repository_timeout: config.repository_timeout,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Submit a new ticket on behalf of `requester`.
    pub async fn create_ticket(
        &self,
        input: CreateTicket,
        requester: &Actor,
    ) -> Result<Ticket, CoreError> {
        let category_id = input.category_id;
        let category = self
            .bounded("get_category", self.categories.get_category(category_id))
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Category",
                id: category_id,
            })?;

        let new = prepare_ticket(input, &category, requester, self.clock.now())?;
        let ticket = self.bounded("insert", self.store.insert(new)).await?;

        tracing::info!(
            ticket_id = ticket.id,
            code = %ticket.code,
            category_id,
            deadline = %ticket.deadline,
            "Ticket created"
        );
        self.bus
            .publish_intent(&NotificationIntent::ticket_created(&ticket, requester.user_id));
        Ok(ticket)
    }

    /// Move a ticket to `to`.
    ///
    /// Staff and admins may request any legal transition. Students may
    /// only cancel tickets they submitted. Illegal moves are rejected the
    /// same way for every role, before permissions are checked.
    pub async fn transition_ticket(
        &self,
        ticket_id: DbId,
        to: TicketStatus,
        actor: &Actor,
        note: Option<String>,
    ) -> Result<Ticket, CoreError> {
        let _guard = self.locks.acquire(ticket_id).await;
        let current = self.load(ticket_id).await?;
        state_machine::validate_transition(current.status, to)
            .inspect_err(|e| log_rejection(ticket_id, current.status, to, e))?;
        authorize_transition(&current, to, actor)?;

        let next = state_machine::transition(&current, to, actor, note, self.clock.now())
            .inspect_err(|e| log_rejection(ticket_id, current.status, to, e))?;
        self.persist(&next).await?;

        tracing::info!(
            ticket_id,
            from = %current.status,
            to = %next.status,
            actor = %actor.name,
            "Ticket transitioned"
        );
        Ok(next)
    }

    /// Assign or reassign a ticket. Staff and admins only.
    pub async fn assign_ticket(
        &self,
        ticket_id: DbId,
        assignee_id: DbId,
        actor: &Actor,
    ) -> Result<Ticket, CoreError> {
        require_staff(actor, "assign tickets")?;

        let _guard = self.locks.acquire(ticket_id).await;
        let current = self.load(ticket_id).await?;
        let next = state_machine::assign(&current, assignee_id, actor, self.policy, self.clock.now())
            .inspect_err(|e| {
                tracing::warn!(ticket_id, assignee_id, error = %e, "Assignment rejected");
            })?;

        if next.timeline.len() == current.timeline.len() {
            tracing::debug!(ticket_id, assignee_id, "Ticket already assigned to this user");
            return Ok(next);
        }
        self.persist(&next).await?;

        tracing::info!(
            ticket_id,
            assignee_id,
            status = %next.status,
            actor = %actor.name,
            "Ticket assigned"
        );
        self.bus.publish_intent(&NotificationIntent::ticket_assigned(
            &next,
            assignee_id,
            actor.user_id,
        ));
        Ok(next)
    }

    /// Escalate a ticket.
    ///
    /// With an actor this is a manual escalation. Without one it is the
    /// automatic path: the ticket is escalated only if it is overdue and
    /// has never been escalated, and is otherwise returned unchanged.
    pub async fn escalate_ticket(
        &self,
        ticket_id: DbId,
        actor: Option<&Actor>,
        note: Option<String>,
    ) -> Result<Ticket, CoreError> {
        let Some(actor) = actor else {
            let (ticket, _) = self.auto_escalate(ticket_id).await?;
            return Ok(ticket);
        };

        let _guard = self.locks.acquire(ticket_id).await;
        let current = self.load(ticket_id).await?;
        let Escalated { ticket, intent } =
            escalation::manual_escalate(&current, actor, note, self.clock.now()).inspect_err(
                |e| tracing::warn!(ticket_id, actor = %actor.name, error = %e, "Escalation rejected"),
            )?;
        self.persist(&ticket).await?;

        tracing::info!(ticket_id, actor = %actor.name, "Ticket escalated manually");
        self.bus.publish_intent(&intent);
        Ok(ticket)
    }

    /// Apply automatic escalation to one ticket if the policy calls for it.
    ///
    /// Returns the stored ticket and whether an escalation was recorded.
    /// The ticket is re-read under its lock, so a concurrent transition
    /// that completed it first wins and nothing is appended.
    pub async fn auto_escalate(&self, ticket_id: DbId) -> Result<(Ticket, bool), CoreError> {
        let _guard = self.locks.acquire(ticket_id).await;
        let current = self.load(ticket_id).await?;

        let Some(Escalated { ticket, intent }) =
            escalation::auto_escalate(&current, self.clock.now())
        else {
            return Ok((current, false));
        };
        self.persist(&ticket).await?;

        tracing::info!(
            ticket_id,
            code = %ticket.code,
            status = %ticket.status,
            "Overdue ticket escalated"
        );
        self.bus.publish_intent(&intent);
        Ok((ticket, true))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn get_ticket(&self, ticket_id: DbId) -> Result<TicketView, CoreError> {
        let ticket = self.load(ticket_id).await?;
        Ok(TicketView::at(ticket, self.clock.now()))
    }

    pub async fn get_ticket_timeline(
        &self,
        ticket_id: DbId,
    ) -> Result<Vec<TimelineEvent>, CoreError> {
        let ticket = self.load(ticket_id).await?;
        Ok(ticket.timeline.events().to_vec())
    }

    /// Actionable tickets past their deadline, most overdue first.
    pub async fn list_overdue_tickets(&self) -> Result<Vec<TicketView>, CoreError> {
        let now = self.clock.now();
        let tickets = self
            .bounded("load_actionable", self.store.load_actionable())
            .await?;

        let mut overdue: Vec<TicketView> = tickets
            .into_iter()
            .filter(|t| is_overdue(t, now))
            .map(|t| TicketView::at(t, now))
            .collect();
        overdue.sort_by_key(|v| (v.ticket.deadline, v.ticket.id));
        Ok(overdue)
    }

    /// Ids of actionable tickets the policy currently wants escalated.
    ///
    /// This is a snapshot; each id is re-evaluated under its lock by
    /// [`auto_escalate`](Self::auto_escalate).
    pub async fn escalation_candidates(&self) -> Result<(usize, Vec<DbId>), CoreError> {
        let now = self.clock.now();
        let tickets = self
            .bounded("load_actionable", self.store.load_actionable())
            .await?;
        let examined = tickets.len();
        let ids = tickets
            .iter()
            .filter(|t| matches!(escalation::evaluate(t, now), EscalationDecision::AutoEscalate(_)))
            .map(|t| t.id)
            .collect();
        Ok((examined, ids))
    }

    // -----------------------------------------------------------------------
    // Store access
    // -----------------------------------------------------------------------

    async fn load(&self, ticket_id: DbId) -> Result<Ticket, CoreError> {
        self.bounded("find_by_id", self.store.find_by_id(ticket_id))
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Ticket",
                id: ticket_id,
            })
    }

    async fn persist(&self, ticket: &Ticket) -> Result<(), CoreError> {
        self.bounded("save", self.store.save(ticket))
            .await
            .inspect_err(|e| {
                tracing::error!(ticket_id = ticket.id, error = %e, "Failed to save ticket");
            })
    }

    /// Run a store call under the repository timeout.
    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        match tokio::time::timeout(self.repository_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.repository_timeout.as_millis() as u64,
                    "Ticket store call timed out"
                );
                Err(CoreError::RepositoryUnavailable(format!(
                    "{operation} timed out after {}ms",
                    self.repository_timeout.as_millis()
                )))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Authorization
// ---------------------------------------------------------------------------

fn require_staff(actor: &Actor, what: &str) -> Result<(), CoreError> {
    if actor.is_system() || !actor.is_staff_or_admin() {
        return Err(CoreError::Forbidden(format!(
            "Only staff or administrators can {what}"
        )));
    }
    Ok(())
}

fn authorize_transition(ticket: &Ticket, to: TicketStatus, actor: &Actor) -> Result<(), CoreError> {
    if actor.is_system() {
        return Err(CoreError::Forbidden(
            "Status transitions require an identified user".to_string(),
        ));
    }
    if actor.role != ActorRole::Student {
        return Ok(());
    }
    if to == TicketStatus::Cancelled && actor.user_id == Some(ticket.requester_id) {
        return Ok(());
    }
    Err(CoreError::Forbidden(
        "Students may only cancel tickets they submitted".to_string(),
    ))
}

fn log_rejection(ticket_id: DbId, current: TicketStatus, requested: TicketStatus, err: &CoreError) {
    tracing::warn!(
        ticket_id,
        current_status = %current,
        requested_status = %requested,
        error = %err,
        "Transition rejected"
    );
}
