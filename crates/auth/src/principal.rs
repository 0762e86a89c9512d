use serde::{Deserialize, Serialize};

use loandesk_core::ActorId;

use crate::Role;

/// Identity of the user acting on the console, resolved by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub actor_id: ActorId,
    pub display_name: String,
    pub role: Role,
}

impl Principal {
    pub fn new(actor_id: ActorId, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            actor_id,
            display_name: display_name.into(),
            role,
        }
    }
}
