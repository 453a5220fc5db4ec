//! Overdue detection.
//!
//! Two distinct questions, never to be conflated:
//!
//! - **Actionable overdue** ([`is_overdue`]): past the deadline and not yet
//!   completed. Drives escalation and the overdue list.
//! - **SLA breach** ([`is_sla_breached`]): work finished (or is still
//!   unfinished) after the deadline. Used for reporting; a ticket resolved
//!   late is a breach but no longer actionable.
//!
//! Both are recomputed from `deadline` and the supplied `now`; the
//! ticket's persisted `overdue_hint` is never consulted.

use chrono::Duration;
use serde::Serialize;

use crate::status::TicketStatus;
use crate::ticket::Ticket;
use crate::types::Timestamp;

/// Remaining time at or above which a ticket is comfortably on track.
pub const ATTENTION_THRESHOLD_HOURS: i64 = 6;

/// Remaining time below which a ticket needs urgent work.
pub const WARNING_THRESHOLD_HOURS: i64 = 2;

/// Informational urgency band derived from `deadline - now`.
///
/// Bands never gate transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyBand {
    /// Six hours or more remaining.
    Ok,
    /// Between two and six hours remaining.
    Attention,
    /// Under two hours remaining.
    Warning,
    /// Past the deadline.
    Overdue,
}

/// Actionable overdue: `now > deadline` and status not `resolved`/`closed`.
///
/// Cancelled tickets are terminal and excluded as well.
pub fn is_overdue(ticket: &Ticket, now: Timestamp) -> bool {
    ticket.status.is_actionable() && now > ticket.deadline
}

/// How far past the deadline an actionable ticket is; zero otherwise.
pub fn overdue_by(ticket: &Ticket, now: Timestamp) -> Duration {
    if is_overdue(ticket, now) {
        now - ticket.deadline
    } else {
        Duration::zero()
    }
}

/// SLA breach: the moment work stopped (or `now`, if it has not) is after
/// the deadline. Cancelled tickets owe no resolution and never breach.
pub fn is_sla_breached(ticket: &Ticket, now: Timestamp) -> bool {
    if ticket.status == TicketStatus::Cancelled {
        return false;
    }
    let finished_at = ticket.resolved_at.or(ticket.closed_at).unwrap_or(now);
    finished_at > ticket.deadline
}

/// Classify the time left until `deadline`.
pub fn urgency_band(deadline: Timestamp, now: Timestamp) -> UrgencyBand {
    let remaining = deadline - now;
    if remaining < Duration::zero() {
        UrgencyBand::Overdue
    } else if remaining < Duration::hours(WARNING_THRESHOLD_HOURS) {
        UrgencyBand::Warning
    } else if remaining < Duration::hours(ATTENTION_THRESHOLD_HOURS) {
        UrgencyBand::Attention
    } else {
        UrgencyBand::Ok
    }
}

/// Live SLA projection of a ticket, computed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlaAssessment {
    pub is_overdue: bool,
    pub overdue_by_minutes: i64,
    pub sla_breached: bool,
    /// Minutes until the deadline; negative once past it.
    pub remaining_minutes: i64,
    /// `None` for tickets that are no longer actionable.
    pub band: Option<UrgencyBand>,
}

/// Compute the full projection for display and reporting.
pub fn assess(ticket: &Ticket, now: Timestamp) -> SlaAssessment {
    SlaAssessment {
        is_overdue: is_overdue(ticket, now),
        overdue_by_minutes: overdue_by(ticket, now).num_minutes(),
        sla_breached: is_sla_breached(ticket, now),
        remaining_minutes: (ticket.deadline - now).num_minutes(),
        band: ticket
            .status
            .is_actionable()
            .then(|| urgency_band(ticket.deadline, now)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::actor::Actor;
    use crate::state_machine::transition;
    use crate::status::{ActorRole, Priority};
    use crate::timeline::{EventDraft, EventKind, Timeline};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 2, 2, 10, 0, 0).unwrap()
    }

    fn ticket(sla_hours: i64, status: TicketStatus) -> Ticket {
        let mut timeline = Timeline::new();
        timeline.append(EventDraft {
            timestamp: t0(),
            status,
            kind: EventKind::Created,
            actor: Actor::user(1, "Ana", ActorRole::Student),
            action: "Ticket submitted".into(),
            note: None,
        });
        Ticket {
            id: 1,
            code: "IT-000001".into(),
            category_id: 1,
            priority: Priority::Medium,
            status,
            requester_id: 1,
            assignee_id: None,
            location_id: None,
            description: "Lab PC will not boot".into(),
            created_at: t0(),
            deadline: t0() + Duration::hours(sla_hours),
            resolved_at: None,
            closed_at: None,
            cancelled_at: None,
            overdue_hint: false,
            timeline,
        }
    }

    fn resolve_at(ticket: &Ticket, at: Timestamp) -> Ticket {
        let staff = Actor::user(2, "Kim", ActorRole::Staff);
        transition(ticket, TicketStatus::Resolved, &staff, None, at).unwrap()
    }

    #[test]
    fn open_ticket_past_deadline_is_overdue() {
        let t = ticket(24, TicketStatus::Open);
        let now = t0() + Duration::hours(25);
        assert!(is_overdue(&t, now));
        assert_eq!(overdue_by(&t, now), Duration::hours(1));
        assert!(is_sla_breached(&t, now));
    }

    #[test]
    fn exactly_at_deadline_is_not_overdue() {
        let t = ticket(24, TicketStatus::InProgress);
        assert!(!is_overdue(&t, t.deadline));
        assert_eq!(overdue_by(&t, t.deadline), Duration::zero());
    }

    #[test]
    fn resolved_before_deadline_is_neither_overdue_nor_breach() {
        let t = resolve_at(&ticket(24, TicketStatus::InProgress), t0() + Duration::hours(20));
        let now = t0() + Duration::hours(25);
        assert!(!is_overdue(&t, now));
        assert!(!is_sla_breached(&t, now));
    }

    #[test]
    fn resolved_after_deadline_is_breach_but_not_actionable() {
        let t = resolve_at(&ticket(10, TicketStatus::InProgress), t0() + Duration::hours(15));
        let now = t0() + Duration::hours(16);
        assert!(!is_overdue(&t, now));
        assert!(is_sla_breached(&t, now));
    }

    #[test]
    fn cancelled_ticket_is_never_overdue_or_breached() {
        let t = ticket(1, TicketStatus::Cancelled);
        let now = t0() + Duration::hours(48);
        assert!(!is_overdue(&t, now));
        assert!(!is_sla_breached(&t, now));
    }

    #[test]
    fn stale_overdue_hint_is_ignored() {
        let mut t = ticket(24, TicketStatus::Open);
        t.overdue_hint = true;
        assert!(!is_overdue(&t, t0() + Duration::hours(1)));
    }

    #[test]
    fn urgency_bands_follow_thresholds() {
        let deadline = t0();
        assert_eq!(urgency_band(deadline, deadline - Duration::hours(6)), UrgencyBand::Ok);
        assert_eq!(
            urgency_band(deadline, deadline - Duration::minutes(359)),
            UrgencyBand::Attention
        );
        assert_eq!(
            urgency_band(deadline, deadline - Duration::hours(2)),
            UrgencyBand::Attention
        );
        assert_eq!(
            urgency_band(deadline, deadline - Duration::minutes(119)),
            UrgencyBand::Warning
        );
        assert_eq!(urgency_band(deadline, deadline), UrgencyBand::Warning);
        assert_eq!(
            urgency_band(deadline, deadline + Duration::seconds(1)),
            UrgencyBand::Overdue
        );
    }

    #[test]
    fn assessment_of_completed_ticket_has_no_band() {
        let t = resolve_at(&ticket(10, TicketStatus::InProgress), t0() + Duration::hours(15));
        let a = assess(&t, t0() + Duration::hours(16));
        assert!(!a.is_overdue);
        assert!(a.sla_breached);
        assert_eq!(a.overdue_by_minutes, 0);
        assert_eq!(a.remaining_minutes, -360);
        assert!(a.band.is_none());
    }

    #[test]
    fn assessment_of_open_ticket_reports_band() {
        let t = ticket(24, TicketStatus::Open);
        let a = assess(&t, t0() + Duration::hours(23));
        assert_eq!(a.band, Some(UrgencyBand::Warning));
        assert_eq!(a.remaining_minutes, 60);
    }
}
