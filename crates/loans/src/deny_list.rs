//! Deny-list ("lista negra"): requesters barred from new loans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use loandesk_core::{AggregateId, DomainError, DomainResult, InMemoryRepository, Repository};

use crate::requester::{Requester, name_key, national_id_key};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DenyListEntryId(pub AggregateId);

impl DenyListEntryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(AggregateId::new())
    }
}

impl core::fmt::Display for DenyListEntryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "term", content = "until")]
pub enum SanctionTerm {
    /// In force while `now < until`.
    Until(DateTime<Utc>),
    Indefinite,
}

impl SanctionTerm {
    pub fn in_force(&self, now: DateTime<Utc>) -> bool {
        match self {
            SanctionTerm::Until(until) => now < *until,
            SanctionTerm::Indefinite => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenyListEntry {
    id: DenyListEntryId,
    full_name: String,
    national_id: Option<String>,
    reason: String,
    incident_date: DateTime<Utc>,
    sanction: SanctionTerm,
    recorded_at: DateTime<Utc>,
    lifted_at: Option<DateTime<Utc>>,
}

impl DenyListEntry {
    pub fn id(&self) -> DenyListEntryId {
        self.id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn national_id(&self) -> Option<&str> {
        self.national_id.as_deref()
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn incident_date(&self) -> DateTime<Utc> {
        self.incident_date
    }

    pub fn sanction(&self) -> SanctionTerm {
        self.sanction
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn lifted_at(&self) -> Option<DateTime<Utc>> {
        self.lifted_at
    }

    pub fn in_force(&self, now: DateTime<Utc>) -> bool {
        self.sanction.in_force(now)
    }

    /// Identity match. An entry carrying a national id matches on that id
    /// alone; otherwise it falls back to the normalized full name.
    pub fn matches(&self, requester: &Requester) -> bool {
        match &self.national_id {
            Some(id) => national_id_key(id) == national_id_key(&requester.national_id),
            None => name_key(&self.full_name) == name_key(&requester.full_name),
        }
    }
}

/// Input for [`DenyList::add`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDenyListEntry {
    pub full_name: String,
    pub national_id: Option<String>,
    pub reason: String,
    pub incident_date: DateTime<Utc>,
    pub sanction: SanctionTerm,
}

impl NewDenyListEntry {
    fn into_entry(self, recorded_at: DateTime<Utc>) -> DomainResult<DenyListEntry> {
        let full_name = self.full_name.split_whitespace().collect::<Vec<_>>().join(" ");
        if full_name.is_empty() {
            return Err(DomainError::validation("deny-list entry needs a name"));
        }
        let reason = self.reason.trim().to_string();
        if reason.is_empty() {
            return Err(DomainError::validation("deny-list entry needs a reason"));
        }
        if let SanctionTerm::Until(until) = self.sanction {
            if until <= self.incident_date {
                return Err(DomainError::validation(
                    "sanction must end after the incident date",
                ));
            }
        }
        let national_id = self
            .national_id
            .map(|id| id.trim().to_string())
            .filter(|id| !national_id_key(id).is_empty());

        Ok(DenyListEntry {
            id: DenyListEntryId::generate(),
            full_name,
            national_id,
            reason,
            incident_date: self.incident_date,
            sanction: self.sanction,
            recorded_at,
            lifted_at: None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct DenyList<R = InMemoryRepository<DenyListEntryId, DenyListEntry>> {
    repo: R,
}

impl DenyList {
    pub fn in_memory() -> Self {
        Self::new(InMemoryRepository::new())
    }
}

impl Default for DenyList {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<R> DenyList<R>
where
    R: Repository<DenyListEntryId, DenyListEntry>,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn add(&mut self, entry: NewDenyListEntry, now: DateTime<Utc>) -> DomainResult<DenyListEntry> {
        let entry = entry.into_entry(now)?;
        self.repo.upsert(entry.id, entry.clone());
        Ok(entry)
    }

    /// End a sanction early. The entry stays on record, expired as of `now`.
    pub fn lift(&mut self, id: DenyListEntryId, now: DateTime<Utc>) -> DomainResult<DenyListEntry> {
        let mut entry = self.get(id)?;
        if !entry.in_force(now) {
            return Err(DomainError::invalid_state(format!(
                "sanction {id} is no longer in force"
            )));
        }
        entry.sanction = SanctionTerm::Until(now);
        entry.lifted_at = Some(now);
        self.repo.upsert(id, entry.clone());
        Ok(entry)
    }

    pub fn get(&self, id: DenyListEntryId) -> DomainResult<DenyListEntry> {
        self.repo
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("deny-list entry {id}")))
    }

    /// Every entry ever recorded, expired ones included.
    pub fn list(&self) -> Vec<DenyListEntry> {
        self.repo.list()
    }

    pub fn in_force(&self, now: DateTime<Utc>) -> Vec<DenyListEntry> {
        self.repo
            .list()
            .into_iter()
            .filter(|entry| entry.in_force(now))
            .collect()
    }

    pub fn find_match(&self, requester: &Requester, now: DateTime<Utc>) -> Option<DenyListEntry> {
        self.repo
            .list()
            .into_iter()
            .find(|entry| entry.in_force(now) && entry.matches(requester))
    }

    /// Gate for loan creation.
    pub fn check(&self, requester: &Requester, now: DateTime<Utc>) -> DomainResult<()> {
        match self.find_match(requester, now) {
            Some(entry) => Err(DomainError::deny_listed(format!(
                "{} is sanctioned ({}) {}",
                entry.full_name,
                entry.reason,
                match entry.sanction {
                    SanctionTerm::Until(until) => format!("until {}", until.format("%Y-%m-%d")),
                    SanctionTerm::Indefinite => "indefinitely".to_string(),
                }
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requester::RequesterRole;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn juan() -> Requester {
        Requester::new("Juan Pérez", "123456789", RequesterRole::Student)
    }

    fn sanction_juan(list: &mut DenyList) -> DenyListEntry {
        list.add(
            NewDenyListEntry {
                full_name: "Juan Pérez".into(),
                national_id: Some("123456789".into()),
                reason: "Equipo devuelto con daños".into(),
                incident_date: at(2024, 6, 1),
                sanction: SanctionTerm::Until(at(2024, 12, 31)),
            },
            at(2024, 6, 2),
        )
        .unwrap()
    }

    #[test]
    fn sanction_blocks_until_it_expires() {
        let mut list = DenyList::in_memory();
        sanction_juan(&mut list);

        let err = list.check(&juan(), at(2024, 11, 15)).unwrap_err();
        assert!(matches!(err, DomainError::DenyListed(_)));
        assert!(list.check(&juan(), at(2025, 1, 15)).is_ok());
        assert!(list.check(&juan(), at(2024, 12, 31)).is_ok());
    }

    #[test]
    fn national_id_match_ignores_name_and_formatting() {
        let mut list = DenyList::in_memory();
        sanction_juan(&mut list);

        let alias = Requester::new("J. Perez", "123-456-789", RequesterRole::Student);
        assert!(list.find_match(&alias, at(2024, 7, 1)).is_some());

        let namesake = Requester::new("Juan Pérez", "987654321", RequesterRole::Student);
        assert!(list.find_match(&namesake, at(2024, 7, 1)).is_none());
    }

    #[test]
    fn entries_without_id_match_by_name() {
        let mut list = DenyList::in_memory();
        list.add(
            NewDenyListEntry {
                full_name: "María  Gómez".into(),
                national_id: None,
                reason: "No devolvió el proyector".into(),
                incident_date: at(2024, 3, 1),
                sanction: SanctionTerm::Indefinite,
            },
            at(2024, 3, 2),
        )
        .unwrap();

        let requester = Requester::new("maría gómez", "555", RequesterRole::Teacher);
        assert!(list.check(&requester, at(2030, 1, 1)).is_err());
    }

    #[test]
    fn lift_ends_the_sanction_now() {
        let mut list = DenyList::in_memory();
        let entry = sanction_juan(&mut list);

        let lifted = list.lift(entry.id(), at(2024, 8, 1)).unwrap();
        assert_eq!(lifted.sanction(), SanctionTerm::Until(at(2024, 8, 1)));
        assert_eq!(lifted.lifted_at(), Some(at(2024, 8, 1)));
        assert!(list.check(&juan(), at(2024, 8, 1)).is_ok());
        assert!(list.in_force(at(2024, 8, 1)).is_empty());
        assert_eq!(list.list().len(), 1);

        let err = list.lift(entry.id(), at(2024, 9, 1)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn add_validates_input() {
        let mut list = DenyList::in_memory();
        let base = NewDenyListEntry {
            full_name: "Juan Pérez".into(),
            national_id: None,
            reason: "Daños".into(),
            incident_date: at(2024, 6, 1),
            sanction: SanctionTerm::Until(at(2024, 5, 1)),
        };
        assert!(matches!(
            list.add(base.clone(), at(2024, 6, 2)),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            list.add(
                NewDenyListEntry {
                    reason: "  ".into(),
                    sanction: SanctionTerm::Indefinite,
                    ..base.clone()
                },
                at(2024, 6, 2)
            ),
            Err(DomainError::Validation(_))
        ));
        assert!(list.list().is_empty());
    }
}
