use loandesk_auth::{AuthzError, Permission, Principal, Role, authorize};
use loandesk_core::ActorId;

/// Who is calling. Passed explicitly into every desk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    principal: Principal,
}

impl RequestContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    /// Context for a fresh actor with the given role.
    pub fn for_role(display_name: impl Into<String>, role: Role) -> Self {
        Self::new(Principal::new(ActorId::new(), display_name, role))
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn actor_id(&self) -> ActorId {
        self.principal.actor_id
    }

    pub fn role(&self) -> Role {
        self.principal.role
    }

    pub fn require(&self, permission: Permission) -> Result<(), AuthzError> {
        authorize(&self.principal, permission)
    }
}
