//! Business-admin catalogs: tags, domains and document types.
//!
//! The three catalogs share one implementation: named entries with a
//! case-insensitive unique name, search by name or id, and a creation-day
//! filter. Tags additionally carry a review status.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{matches_needle, timestamp, within_days, FixtureError, IdSequence, ListFilter};

/// A catalog row.
pub trait CatalogEntry: Clone {
    /// Singular noun used in messages ("Tag", "Domain", ...).
    const KIND: &'static str;
    const ID_PREFIX: &'static str;
    const DUPLICATE: &'static str;

    fn create(id: String, name: String, now: DateTime<Utc>) -> Self;
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn rename(&mut self, name: String, now: DateTime<Utc>);
    fn created(&self) -> &str;

    fn status(&self) -> Option<&'static str> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TagStatus {
    Active,
    Inactive,
    Pending,
}

impl TagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagStatus::Active => "ACTIVE",
            TagStatus::Inactive => "INACTIVE",
            TagStatus::Pending => "PENDING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub status: TagStatus,
    pub created_date: String,
}

impl CatalogEntry for Tag {
    const KIND: &'static str = "Tag";
    const ID_PREFIX: &'static str = "tag";
    const DUPLICATE: &'static str = "This tag name already exists. Please choose another name.";

    fn create(id: String, name: String, now: DateTime<Utc>) -> Self {
        Tag {
            id,
            name,
            status: TagStatus::Active,
            created_date: timestamp(now),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rename(&mut self, name: String, _now: DateTime<Utc>) {
        self.name = name;
    }

    fn created(&self) -> &str {
        &self.created_date
    }

    fn status(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    pub name: String,
    pub created_date: String,
}

impl CatalogEntry for Domain {
    const KIND: &'static str = "Domain";
    const ID_PREFIX: &'static str = "domain";
    const DUPLICATE: &'static str = "Domain name already in use. Please choose another name.";

    fn create(id: String, name: String, now: DateTime<Utc>) -> Self {
        Domain {
            id,
            name,
            created_date: timestamp(now),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rename(&mut self, name: String, _now: DateTime<Utc>) {
        self.name = name;
    }

    fn created(&self) -> &str {
        &self.created_date
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl CatalogEntry for DocumentType {
    const KIND: &'static str = "Type";
    const ID_PREFIX: &'static str = "type";
    const DUPLICATE: &'static str = "Type name already in use. Please choose another name.";

    fn create(id: String, name: String, now: DateTime<Utc>) -> Self {
        let at = timestamp(now);
        DocumentType {
            id,
            name,
            created_at: at.clone(),
            updated_at: at,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rename(&mut self, name: String, now: DateTime<Utc>) {
        self.name = name;
        self.updated_at = timestamp(now);
    }

    fn created(&self) -> &str {
        &self.created_at
    }
}

struct Inner<E> {
    entries: Vec<E>,
    ids: IdSequence,
}

/// A named catalog guarded by one lock.
pub struct Catalog<E: CatalogEntry> {
    inner: Mutex<Inner<E>>,
}

pub type TagStore = Catalog<Tag>;
pub type DomainStore = Catalog<Domain>;
pub type DocumentTypeStore = Catalog<DocumentType>;

impl<E: CatalogEntry> Catalog<E> {
    pub fn new(entries: Vec<E>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries,
                ids: IdSequence::default(),
            }),
        }
    }

    fn not_found(id: &str) -> FixtureError {
        FixtureError::NotFound(format!("{} with id {} not found", E::KIND, id))
    }

    fn empty_name() -> FixtureError {
        FixtureError::Invalid(format!("{} name cannot be empty.", E::KIND))
    }

    pub fn list(&self, filter: &ListFilter) -> Result<Vec<E>, FixtureError> {
        let needle = filter.needle();
        let days = filter.days()?;
        let status = filter
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let inner = self.inner.lock().expect("catalog mutex poisoned");
        Ok(inner
            .entries
            .iter()
            .filter(|e| matches_needle(&needle, e.id(), e.name()))
            .filter(|e| match (status, e.status()) {
                (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
                _ => true,
            })
            .filter(|e| within_days(e.created(), days))
            .cloned()
            .collect())
    }

    pub fn get(&self, id: &str) -> Option<E> {
        let inner = self.inner.lock().expect("catalog mutex poisoned");
        inner.entries.iter().find(|e| e.id() == id).cloned()
    }

    /// New entries go to the front.
    pub fn create(&self, name: &str) -> Result<E, FixtureError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Self::empty_name());
        }

        let mut inner = self.inner.lock().expect("catalog mutex poisoned");
        if inner.entries.iter().any(|e| same_name(e.name(), name)) {
            return Err(FixtureError::Conflict(E::DUPLICATE.to_string()));
        }

        let now = Utc::now();
        let id = inner.ids.next(E::ID_PREFIX, now);
        let entry = E::create(id, name.to_string(), now);
        inner.entries.insert(0, entry.clone());
        Ok(entry)
    }

    /// Rename (when `name` is given) and apply `edit`, atomically.
    pub fn update_with<F>(&self, id: &str, name: Option<&str>, edit: F) -> Result<E, FixtureError>
    where
        F: FnOnce(&mut E) -> Result<(), FixtureError>,
    {
        let mut inner = self.inner.lock().expect("catalog mutex poisoned");
        let index = inner
            .entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| Self::not_found(id))?;

        let rename = match name.map(str::trim) {
            Some("") => return Err(Self::empty_name()),
            Some(n) if n != inner.entries[index].name() => {
                if inner
                    .entries
                    .iter()
                    .any(|e| e.id() != id && same_name(e.name(), n))
                {
                    return Err(FixtureError::Conflict(E::DUPLICATE.to_string()));
                }
                Some(n.to_string())
            }
            _ => None,
        };

        let mut updated = inner.entries[index].clone();
        if let Some(n) = rename {
            updated.rename(n, Utc::now());
        }
        edit(&mut updated)?;
        inner.entries[index] = updated.clone();
        Ok(updated)
    }

    pub fn update(&self, id: &str, name: Option<&str>) -> Result<E, FixtureError> {
        self.update_with(id, name, |_| Ok(()))
    }

    pub fn delete(&self, id: &str) -> Result<E, FixtureError> {
        let mut inner = self.inner.lock().expect("catalog mutex poisoned");
        let index = inner
            .entries
            .iter()
            .position(|e| e.id() == id)
            .ok_or_else(|| Self::not_found(id))?;
        Ok(inner.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("catalog mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl Catalog<Tag> {
    pub fn seeded() -> Self {
        use TagStatus::*;
        let seed = [
            ("Machine Learning", Active, "2025-01-15T10:00:00Z"),
            ("Artificial Intelligence", Active, "2025-01-16T11:00:00Z"),
            ("Data Science", Active, "2025-01-17T12:00:00Z"),
            ("Web Development", Active, "2025-01-18T13:00:00Z"),
            ("Software Engineering", Active, "2025-01-19T14:00:00Z"),
            ("Algorithms", Active, "2025-01-20T15:00:00Z"),
            ("Database", Inactive, "2025-01-21T16:00:00Z"),
            ("Security", Active, "2025-01-22T17:00:00Z"),
            ("Cloud Computing", Active, "2025-01-23T18:00:00Z"),
            ("DevOps", Active, "2025-01-24T19:00:00Z"),
            ("Mobile Development", Active, "2025-01-25T20:00:00Z"),
            ("Blockchain", Inactive, "2025-01-26T21:00:00Z"),
            ("Cybersecurity", Pending, "2025-01-27T10:00:00Z"),
            ("Quantum Computing", Pending, "2025-01-28T11:00:00Z"),
            ("Internet of Things", Pending, "2025-01-29T12:00:00Z"),
        ];
        Self::new(
            seed.into_iter()
                .enumerate()
                .map(|(i, (name, status, created))| Tag {
                    id: format!("tag-{}", i + 1),
                    name: name.to_string(),
                    status,
                    created_date: created.to_string(),
                })
                .collect(),
        )
    }

    /// Rename and/or change status.
    pub fn update_tag(
        &self,
        id: &str,
        name: Option<&str>,
        status: Option<TagStatus>,
    ) -> Result<Tag, FixtureError> {
        self.update_with(id, name, |tag| {
            if let Some(status) = status {
                tag.status = status;
            }
            Ok(())
        })
    }

    /// Only pending tags can be approved; they become active.
    pub fn approve(&self, id: &str) -> Result<Tag, FixtureError> {
        self.review(id, true)
    }

    /// Settle a pending tag: active when approved, inactive when rejected.
    pub fn review(&self, id: &str, approved: bool) -> Result<Tag, FixtureError> {
        self.update_with(id, None, |tag| {
            if tag.status != TagStatus::Pending {
                return Err(FixtureError::Invalid(if approved {
                    "Only pending tags can be approved".into()
                } else {
                    "Only pending tags can be rejected".into()
                }));
            }
            tag.status = if approved {
                TagStatus::Active
            } else {
                TagStatus::Inactive
            };
            Ok(())
        })
    }
}

impl Catalog<Domain> {
    pub fn seeded() -> Self {
        let names = [
            "Computer Science",
            "Mathematics",
            "Physics",
            "Biology",
            "Chemistry",
            "Engineering",
            "Medicine",
            "Economics",
            "Psychology",
            "Literature",
        ];
        Self::new(
            names
                .into_iter()
                .enumerate()
                .map(|(i, name)| Domain {
                    id: format!("domain-{}", i + 1),
                    name: name.to_string(),
                    created_date: format!("2025-01-{:02}T{:02}:00:00Z", 10 + i, 10 + i),
                })
                .collect(),
        )
    }
}

impl Catalog<DocumentType> {
    pub fn seeded() -> Self {
        let names = [
            "Research Paper",
            "Article",
            "Book",
            "Report",
            "Thesis",
            "Tutorial",
            "Technical Report",
            "Case Study",
            "Review",
            "Conference Paper",
        ];
        Self::new(
            names
                .into_iter()
                .enumerate()
                .map(|(i, name)| {
                    let at = format!("2025-01-{:02}T{:02}:00:00Z", 10 + i, 10 + i);
                    DocumentType {
                        id: format!("type-{}", i + 1),
                        name: name.to_string(),
                        created_at: at.clone(),
                        updated_at: at,
                    }
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_tag_name_is_case_insensitive() {
        let tags = TagStore::seeded();
        let err = tags.create("  machine learning ").unwrap_err();
        assert_eq!(
            err,
            FixtureError::Conflict("This tag name already exists. Please choose another name.".into())
        );
        assert_eq!(tags.len(), 15);
    }

    #[test]
    fn test_create_puts_new_entry_first() {
        let domains = DomainStore::seeded();
        let created = domains.create("Astronomy").unwrap();
        let listed = domains.list(&ListFilter::default()).unwrap();
        assert_eq!(listed[0], created);
        assert!(created.id.starts_with("domain-"));
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let types = DocumentTypeStore::seeded();
        assert_eq!(
            types.create("   ").unwrap_err(),
            FixtureError::Invalid("Type name cannot be empty.".into())
        );
    }

    #[test]
    fn test_only_pending_tags_can_be_approved() {
        let tags = TagStore::seeded();
        assert_eq!(tags.approve("tag-13").unwrap().status, TagStatus::Active);
        assert!(matches!(tags.approve("tag-13"), Err(FixtureError::Invalid(_))));
        assert!(matches!(tags.approve("tag-1"), Err(FixtureError::Invalid(_))));
        assert_eq!(
            tags.approve("tag-99").unwrap_err(),
            FixtureError::NotFound("Tag with id tag-99 not found".into())
        );
    }

    #[test]
    fn test_rejected_tag_becomes_inactive() {
        let tags = TagStore::seeded();
        assert_eq!(tags.review("tag-14", false).unwrap().status, TagStatus::Inactive);
        assert_eq!(
            tags.review("tag-14", true).unwrap_err(),
            FixtureError::Invalid("Only pending tags can be approved".into())
        );
    }

    #[test]
    fn test_filters_combine() {
        let tags = TagStore::seeded();
        let filter = ListFilter {
            search: Some("comput".into()),
            status: Some("ACTIVE".into()),
            ..ListFilter::default()
        };
        let names: Vec<String> = tags.list(&filter).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Cloud Computing"]);

        let by_day = ListFilter {
            date_from: Some("2025-01-28".into()),
            ..ListFilter::default()
        };
        assert_eq!(tags.list(&by_day).unwrap().len(), 2);
    }

    #[test]
    fn test_rename_to_own_name_in_other_case_is_allowed() {
        let domains = DomainStore::seeded();
        let renamed = domains.update("domain-1", Some("computer science")).unwrap();
        assert_eq!(renamed.name, "computer science");
        assert!(matches!(
            domains.update("domain-1", Some("Physics")),
            Err(FixtureError::Conflict(_))
        ));
    }

    #[test]
    fn test_document_type_rename_touches_updated_at() {
        let types = DocumentTypeStore::seeded();
        let before = types.get("type-1").unwrap();
        let after = types.update("type-1", Some("Paper")).unwrap();
        assert_eq!(after.created_at, before.created_at);
        assert_ne!(after.updated_at, before.updated_at);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let domains = DomainStore::seeded();
        assert!(domains.delete("domain-3").is_ok());
        assert!(matches!(domains.delete("domain-3"), Err(FixtureError::NotFound(_))));
        assert!(domains.get("domain-3").is_none());
    }
}
