use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loandesk_catalog::{CatalogEntityId, CatalogKind};
use loandesk_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Entity};
use loandesk_events::Event;

/// Item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub AggregateId);

impl ItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Catalog references that classify an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemClassification {
    pub category: CatalogEntityId,
    /// The department / item type the asset belongs to.
    pub item_type: CatalogEntityId,
    pub location: CatalogEntityId,
    pub material: Option<CatalogEntityId>,
    pub color: Option<CatalogEntityId>,
    pub condition: Option<CatalogEntityId>,
    pub state: Option<CatalogEntityId>,
}

impl ItemClassification {
    pub fn new(category: CatalogEntityId, item_type: CatalogEntityId, location: CatalogEntityId) -> Self {
        Self {
            category,
            item_type,
            location,
            material: None,
            color: None,
            condition: None,
            state: None,
        }
    }

    fn unassigned() -> Self {
        Self::new(CatalogEntityId::nil(), CatalogEntityId::nil(), CatalogEntityId::nil())
    }

    /// Every reference set on this classification, tagged with its kind.
    pub fn references(&self) -> Vec<(CatalogKind, CatalogEntityId)> {
        let mut refs = vec![
            (CatalogKind::Category, self.category),
            (CatalogKind::ItemType, self.item_type),
            (CatalogKind::Location, self.location),
        ];
        let optional = [
            (CatalogKind::Material, self.material),
            (CatalogKind::Color, self.color),
            (CatalogKind::Condition, self.condition),
            (CatalogKind::State, self.state),
        ];
        refs.extend(optional.into_iter().filter_map(|(kind, id)| id.map(|id| (kind, id))));
        refs
    }

    pub fn references_entity(&self, kind: CatalogKind, id: CatalogEntityId) -> bool {
        self.references().contains(&(kind, id))
    }
}

/// Descriptive attributes of an item (validated).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemDetails {
    pub name: String,
    pub description: String,
    pub quantity_on_hand: u32,
    /// Unit cost in minor currency units.
    pub cost_cents: u64,
    pub image_ref: Option<String>,
}

/// Create payload as it arrives from a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub barcode: String,
    pub name: String,
    pub description: String,
    pub quantity_on_hand: i64,
    pub cost_cents: i64,
    pub image_ref: Option<String>,
    pub classification: ItemClassification,
}

impl NewItem {
    pub(crate) fn details(&self) -> Result<ItemDetails, DomainError> {
        Ok(ItemDetails {
            name: required_name(&self.name)?,
            description: self.description.trim().to_string(),
            quantity_on_hand: quantity(self.quantity_on_hand)?,
            cost_cents: cost(self.cost_cents)?,
            image_ref: self.image_ref.clone(),
        })
    }
}

/// Partial update. `None` leaves a field untouched; for optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity_on_hand: Option<i64>,
    pub cost_cents: Option<i64>,
    pub image_ref: Option<Option<String>>,
    pub category: Option<CatalogEntityId>,
    pub item_type: Option<CatalogEntityId>,
    pub location: Option<CatalogEntityId>,
    pub material: Option<Option<CatalogEntityId>>,
    pub color: Option<Option<CatalogEntityId>>,
    pub condition: Option<Option<CatalogEntityId>>,
    pub state: Option<Option<CatalogEntityId>>,
}

impl ItemPatch {
    /// Resulting details and classification after applying this patch.
    pub(crate) fn applied_to(
        &self,
        details: &ItemDetails,
        classification: &ItemClassification,
    ) -> Result<(ItemDetails, ItemClassification), DomainError> {
        let mut details = details.clone();
        if let Some(name) = &self.name {
            details.name = required_name(name)?;
        }
        if let Some(description) = &self.description {
            details.description = description.trim().to_string();
        }
        if let Some(q) = self.quantity_on_hand {
            details.quantity_on_hand = quantity(q)?;
        }
        if let Some(c) = self.cost_cents {
            details.cost_cents = cost(c)?;
        }
        if let Some(image_ref) = &self.image_ref {
            details.image_ref = image_ref.clone();
        }

        let mut classification = classification.clone();
        if let Some(id) = self.category {
            classification.category = id;
        }
        if let Some(id) = self.item_type {
            classification.item_type = id;
        }
        if let Some(id) = self.location {
            classification.location = id;
        }
        if let Some(id) = self.material {
            classification.material = id;
        }
        if let Some(id) = self.color {
            classification.color = id;
        }
        if let Some(id) = self.condition {
            classification.condition = id;
        }
        if let Some(id) = self.state {
            classification.state = id;
        }

        Ok((details, classification))
    }
}

fn required_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name.to_string())
}

fn quantity(value: i64) -> Result<u32, DomainError> {
    u32::try_from(value)
        .map_err(|_| DomainError::validation(format!("quantity on hand must be between 0 and {}, got {value}", u32::MAX)))
}

fn cost(value: i64) -> Result<u64, DomainError> {
    u64::try_from(value).map_err(|_| DomainError::validation(format!("cost cannot be negative, got {value}")))
}

/// Aggregate root: Item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    barcode: String,
    details: ItemDetails,
    classification: ItemClassification,
    active: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Item {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ItemId) -> Self {
        Self {
            id,
            barcode: String::new(),
            details: ItemDetails::default(),
            classification: ItemClassification::unassigned(),
            active: false,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn barcode(&self) -> &str {
        &self.barcode
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn description(&self) -> &str {
        &self.details.description
    }

    pub fn quantity_on_hand(&self) -> u32 {
        self.details.quantity_on_hand
    }

    pub fn cost_cents(&self) -> u64 {
        self.details.cost_cents
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.details.image_ref.as_deref()
    }

    pub fn details(&self) -> &ItemDetails {
        &self.details
    }

    pub fn classification(&self) -> &ItemClassification {
        &self.classification
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Command: RegisterItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterItem {
    pub item_id: ItemId,
    pub barcode: String,
    pub details: ItemDetails,
    pub classification: ItemClassification,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReviseItem (full resulting attribute set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviseItem {
    pub item_id: ItemId,
    pub details: ItemDetails,
    pub classification: ItemClassification,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateItem {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReactivateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactivateItem {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PurgeItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeItem {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemCommand {
    RegisterItem(RegisterItem),
    ReviseItem(ReviseItem),
    DeactivateItem(DeactivateItem),
    ReactivateItem(ReactivateItem),
    PurgeItem(PurgeItem),
}

/// Event: ItemRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRegistered {
    pub item_id: ItemId,
    pub barcode: String,
    pub details: ItemDetails,
    pub classification: ItemClassification,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRevised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRevised {
    pub item_id: ItemId,
    pub details: ItemDetails,
    pub classification: ItemClassification,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDeactivated {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemReactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReactivated {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemPurged. The record is gone after this; the barcode is kept for
/// audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPurged {
    pub item_id: ItemId,
    pub barcode: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEvent {
    ItemRegistered(ItemRegistered),
    ItemRevised(ItemRevised),
    ItemDeactivated(ItemDeactivated),
    ItemReactivated(ItemReactivated),
    ItemPurged(ItemPurged),
}

impl ItemEvent {
    pub fn item_id(&self) -> ItemId {
        match self {
            ItemEvent::ItemRegistered(e) => e.item_id,
            ItemEvent::ItemRevised(e) => e.item_id,
            ItemEvent::ItemDeactivated(e) => e.item_id,
            ItemEvent::ItemReactivated(e) => e.item_id,
            ItemEvent::ItemPurged(e) => e.item_id,
        }
    }
}

impl Event for ItemEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ItemEvent::ItemRegistered(_) => "inventory.item.registered",
            ItemEvent::ItemRevised(_) => "inventory.item.revised",
            ItemEvent::ItemDeactivated(_) => "inventory.item.deactivated",
            ItemEvent::ItemReactivated(_) => "inventory.item.reactivated",
            ItemEvent::ItemPurged(_) => "inventory.item.purged",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ItemEvent::ItemRegistered(e) => e.occurred_at,
            ItemEvent::ItemRevised(e) => e.occurred_at,
            ItemEvent::ItemDeactivated(e) => e.occurred_at,
            ItemEvent::ItemReactivated(e) => e.occurred_at,
            ItemEvent::ItemPurged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Item {
    type Command = ItemCommand;
    type Event = ItemEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ItemEvent::ItemRegistered(e) => {
                self.id = e.item_id;
                self.barcode = e.barcode.clone();
                self.details = e.details.clone();
                self.classification = e.classification.clone();
                self.active = true;
                self.created = true;
                self.created_at = Some(e.occurred_at);
                self.updated_at = Some(e.occurred_at);
            }
            ItemEvent::ItemRevised(e) => {
                self.details = e.details.clone();
                self.classification = e.classification.clone();
                self.updated_at = Some(e.occurred_at);
            }
            ItemEvent::ItemDeactivated(e) => {
                self.active = false;
                self.updated_at = Some(e.occurred_at);
            }
            ItemEvent::ItemReactivated(e) => {
                self.active = true;
                self.updated_at = Some(e.occurred_at);
            }
            ItemEvent::ItemPurged(e) => {
                self.active = false;
                self.updated_at = Some(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ItemCommand::RegisterItem(cmd) => self.handle_register(cmd),
            ItemCommand::ReviseItem(cmd) => self.handle_revise(cmd),
            ItemCommand::DeactivateItem(cmd) => self.handle_deactivate(cmd),
            ItemCommand::ReactivateItem(cmd) => self.handle_reactivate(cmd),
            ItemCommand::PurgeItem(cmd) => self.handle_purge(cmd),
        }
    }
}

impl Item {
    fn ensure_item_id(&self, item_id: ItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::invalid_state("item_id mismatch"));
        }
        Ok(())
    }

    fn ensure_created(&self, item_id: ItemId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("item {item_id}")));
        }
        self.ensure_item_id(item_id)
    }

    fn handle_register(&self, cmd: &RegisterItem) -> Result<Vec<ItemEvent>, DomainError> {
        if self.created {
            return Err(DomainError::invalid_state("item already registered"));
        }
        let barcode = cmd.barcode.trim();
        if barcode.is_empty() {
            return Err(DomainError::validation("barcode cannot be empty"));
        }
        if cmd.details.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(vec![ItemEvent::ItemRegistered(ItemRegistered {
            item_id: cmd.item_id,
            barcode: barcode.to_string(),
            details: cmd.details.clone(),
            classification: cmd.classification.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revise(&self, cmd: &ReviseItem) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_created(cmd.item_id)?;
        if !self.active {
            return Err(DomainError::invalid_state("deactivated items cannot be edited"));
        }
        if cmd.details.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(vec![ItemEvent::ItemRevised(ItemRevised {
            item_id: cmd.item_id,
            details: cmd.details.clone(),
            classification: cmd.classification.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deactivate(&self, cmd: &DeactivateItem) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_created(cmd.item_id)?;
        if !self.active {
            return Err(DomainError::invalid_state("item is already deactivated"));
        }
        Ok(vec![ItemEvent::ItemDeactivated(ItemDeactivated {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reactivate(&self, cmd: &ReactivateItem) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_created(cmd.item_id)?;
        if self.active {
            return Err(DomainError::invalid_state("item is already active"));
        }
        Ok(vec![ItemEvent::ItemReactivated(ItemReactivated {
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_purge(&self, cmd: &PurgeItem) -> Result<Vec<ItemEvent>, DomainError> {
        self.ensure_created(cmd.item_id)?;
        Ok(vec![ItemEvent::ItemPurged(ItemPurged {
            item_id: cmd.item_id,
            barcode: self.barcode.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
