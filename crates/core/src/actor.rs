//! Identity of whoever causes a ticket mutation.

use serde::{Deserialize, Serialize};

use crate::status::ActorRole;
use crate::types::DbId;

/// Display name used for mutations made by the escalation scheduler.
pub const SYSTEM_ACTOR_NAME: &str = "system";

/// The person or process behind a timeline event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// `None` only for the system actor.
    pub user_id: Option<DbId>,
    pub name: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn user(user_id: DbId, name: impl Into<String>, role: ActorRole) -> Self {
        Self {
            user_id: Some(user_id),
            name: name.into(),
            role,
        }
    }

    /// The scheduler's identity: no user, acting with admin authority.
    pub fn system() -> Self {
        Self {
            user_id: None,
            name: SYSTEM_ACTOR_NAME.to_string(),
            role: ActorRole::Admin,
        }
    }

    pub fn is_system(&self) -> bool {
        self.user_id.is_none()
    }

    /// Staff and admins may act on tickets beyond their own submissions.
    pub fn is_staff_or_admin(&self) -> bool {
        matches!(self.role, ActorRole::Staff | ActorRole::Admin)
    }
}
