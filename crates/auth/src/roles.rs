use serde::{Deserialize, Serialize};

use crate::Permission;

/// Console user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }

    /// Permissions granted to this role.
    pub fn permissions(&self) -> &'static [Permission] {
        const BORROWER: &[Permission] = &[
            Permission::CatalogRead,
            Permission::InventoryRead,
            Permission::LoansRead,
            Permission::LoansRequest,
        ];
        match self {
            Role::Student | Role::Teacher => BORROWER,
            Role::Admin => Permission::ALL,
        }
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
