use serde::{Deserialize, Serialize};

use loandesk_core::{AggregateId, DomainError, DomainResult, Entity};

/// Catalog entity identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogEntityId(pub AggregateId);

impl CatalogEntityId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }

    pub fn nil() -> Self {
        Self(AggregateId::nil())
    }
}

impl core::fmt::Display for CatalogEntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The closed set of catalog entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    Category,
    Color,
    Condition,
    ItemType,
    Location,
    Warehouse,
    Material,
    State,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 8] = [
        CatalogKind::Category,
        CatalogKind::Color,
        CatalogKind::Condition,
        CatalogKind::ItemType,
        CatalogKind::Location,
        CatalogKind::Warehouse,
        CatalogKind::Material,
        CatalogKind::State,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogKind::Category => "category",
            CatalogKind::Color => "color",
            CatalogKind::Condition => "condition",
            CatalogKind::ItemType => "item_type",
            CatalogKind::Location => "location",
            CatalogKind::Warehouse => "warehouse",
            CatalogKind::Material => "material",
            CatalogKind::State => "state",
        }
    }

    /// Kinds whose entities may carry a `parent_id`.
    pub fn is_hierarchical(&self) -> bool {
        matches!(self, CatalogKind::Category | CatalogKind::Location)
    }

    /// Kinds keyed by an administrative code in addition to their name.
    pub fn requires_code(&self) -> bool {
        matches!(self, CatalogKind::Category | CatalogKind::ItemType)
    }
}

impl core::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogDetails {
    Category {
        /// Standard useful life, in years.
        useful_life_years: u32,
        /// Yearly depreciation in basis points (2000 = 20.00%).
        depreciation_bps: u32,
    },
    Color {
        hex_code: String,
    },
    Condition {
        requires_maintenance: bool,
    },
    ItemType,
    Location {
        warehouse_id: CatalogEntityId,
        building: String,
        floor: String,
        capacity: u32,
    },
    Warehouse {
        address: String,
        responsible: Option<String>,
    },
    Material {
        material_type: String,
    },
    State {
        requires_maintenance: bool,
    },
}

impl CatalogDetails {
    pub fn kind(&self) -> CatalogKind {
        match self {
            CatalogDetails::Category { .. } => CatalogKind::Category,
            CatalogDetails::Color { .. } => CatalogKind::Color,
            CatalogDetails::Condition { .. } => CatalogKind::Condition,
            CatalogDetails::ItemType => CatalogKind::ItemType,
            CatalogDetails::Location { .. } => CatalogKind::Location,
            CatalogDetails::Warehouse { .. } => CatalogKind::Warehouse,
            CatalogDetails::Material { .. } => CatalogKind::Material,
            CatalogDetails::State { .. } => CatalogKind::State,
        }
    }

    /// Administrative override flag carried by conditions and states.
    pub fn requires_maintenance(&self) -> bool {
        match self {
            CatalogDetails::Condition { requires_maintenance }
            | CatalogDetails::State { requires_maintenance } => *requires_maintenance,
            _ => false,
        }
    }

    pub fn warehouse_id(&self) -> Option<CatalogEntityId> {
        match self {
            CatalogDetails::Location { warehouse_id, .. } => Some(*warehouse_id),
            _ => None,
        }
    }

    fn validate(&self) -> DomainResult<()> {
        match self {
            CatalogDetails::Category { depreciation_bps, .. } if *depreciation_bps > 10_000 => Err(
                DomainError::validation("depreciation cannot exceed 100%"),
            ),
            CatalogDetails::Color { hex_code } if !is_hex_color(hex_code) => Err(
                DomainError::validation(format!("'{hex_code}' is not a #RGB or #RRGGBB color")),
            ),
            CatalogDetails::Material { material_type } if material_type.trim().is_empty() => {
                Err(DomainError::validation("material type is required"))
            }
            _ => Ok(()),
        }
    }
}

fn is_hex_color(code: &str) -> bool {
    match code.strip_prefix('#') {
        Some(digits) => {
            matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDraft {
    pub code: Option<String>,
    pub name: String,
    pub description: String,
    pub parent_id: Option<CatalogEntityId>,
    pub details: CatalogDetails,
}

impl CatalogDraft {
    pub fn new(name: impl Into<String>, details: CatalogDetails) -> Self {
        Self {
            code: None,
            name: name.into(),
            description: String::new(),
            parent_id: None,
            details,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parent(mut self, parent_id: CatalogEntityId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Normalize and check the shape of a draft (no cross-record rules).
    pub(crate) fn normalized(mut self, kind: CatalogKind) -> DomainResult<Self> {
        if self.details.kind() != kind {
            return Err(DomainError::validation(format!(
                "{} attributes supplied for a {kind}",
                self.details.kind()
            )));
        }

        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }

        self.code = self
            .code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if kind.requires_code() && self.code.is_none() {
            return Err(DomainError::validation(format!("a {kind} requires a code")));
        }

        if self.parent_id.is_some() && !kind.is_hierarchical() {
            return Err(DomainError::validation(format!("a {kind} cannot have a parent")));
        }

        self.details.validate()?;
        Ok(self)
    }
}

/// A catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntity {
    id: CatalogEntityId,
    kind: CatalogKind,
    code: Option<String>,
    name: String,
    description: String,
    parent_id: Option<CatalogEntityId>,
    details: CatalogDetails,
    active: bool,
}

impl CatalogEntity {
    pub(crate) fn from_draft(id: CatalogEntityId, draft: CatalogDraft) -> Self {
        Self {
            id,
            kind: draft.details.kind(),
            code: draft.code,
            name: draft.name,
            description: draft.description,
            parent_id: draft.parent_id,
            details: draft.details,
            active: true,
        }
    }

    pub(crate) fn revise(&mut self, draft: CatalogDraft) {
        self.code = draft.code;
        self.name = draft.name;
        self.description = draft.description;
        self.parent_id = draft.parent_id;
        self.details = draft.details;
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn id_typed(&self) -> CatalogEntityId {
        self.id
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parent_id(&self) -> Option<CatalogEntityId> {
        self.parent_id
    }

    pub fn details(&self) -> &CatalogDetails {
        &self.details
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn requires_maintenance(&self) -> bool {
        self.details.requires_maintenance()
    }
}

impl Entity for CatalogEntity {
    type Id = CatalogEntityId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
