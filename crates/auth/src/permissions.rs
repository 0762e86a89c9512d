use serde::{Deserialize, Serialize};

/// Permission identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CatalogRead,
    CatalogManage,
    InventoryRead,
    InventoryManage,
    LoansRead,
    LoansRequest,
    /// Record returns and browse every requester's loans.
    LoansManage,
    DenyListManage,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::CatalogRead,
        Permission::CatalogManage,
        Permission::InventoryRead,
        Permission::InventoryManage,
        Permission::LoansRead,
        Permission::LoansRequest,
        Permission::LoansManage,
        Permission::DenyListManage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::CatalogRead => "catalog.read",
            Permission::CatalogManage => "catalog.manage",
            Permission::InventoryRead => "inventory.read",
            Permission::InventoryManage => "inventory.manage",
            Permission::LoansRead => "loans.read",
            Permission::LoansRequest => "loans.request",
            Permission::LoansManage => "loans.manage",
            Permission::DenyListManage => "deny_list.manage",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
