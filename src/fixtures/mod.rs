//! In-process fixture stores used in mock mode.
//!
//! # Data Flow
//! ```text
//! Route handler (mock mode)
//!     → Fixtures (shared through AppState)
//!         - notifications.rs (inbox, read state)
//!         - tickets.rs (contact-admin tickets)
//!         - taxonomy.rs (tags, domains, document types)
//!         - specializations.rs (per-domain specializations)
//!         - organizations.rs (reader memberships)
//!         - profile.rs (per-role profiles plus local edits)
//!     → Envelope { mode: mock }
//! ```
//!
//! # Design Decisions
//! - Stores are constructed explicitly and injected, never global
//! - Each operation holds its store's lock for the whole read-modify-write
//! - Mutations live for the process lifetime only

pub mod notifications;
pub mod organizations;
pub mod profile;
pub mod specializations;
pub mod taxonomy;
pub mod tickets;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;

pub use notifications::NotificationStore;
pub use organizations::OrganizationStore;
pub use profile::ProfileStore;
pub use specializations::SpecializationStore;
pub use taxonomy::{DocumentTypeStore, DomainStore, TagStore};
pub use tickets::TicketStore;

/// Failure of a fixture operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixtureError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Conflict(String),
}

/// Every fixture store, shared by the mock-mode handlers.
pub struct Fixtures {
    pub notifications: NotificationStore,
    pub tickets: TicketStore,
    pub tags: TagStore,
    pub domains: DomainStore,
    pub document_types: DocumentTypeStore,
    pub specializations: SpecializationStore,
    pub organizations: OrganizationStore,
    pub profile: ProfileStore,
}

impl Fixtures {
    /// The default fixture set.
    pub fn seeded() -> Self {
        let now = Utc::now();
        Self {
            notifications: NotificationStore::seeded(now),
            tickets: TicketStore::new(),
            tags: TagStore::seeded(),
            domains: DomainStore::seeded(),
            document_types: DocumentTypeStore::seeded(),
            specializations: SpecializationStore::seeded(),
            organizations: OrganizationStore::seeded(),
            profile: ProfileStore::seeded(),
        }
    }
}

impl Default for Fixtures {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Filters shared by the catalog listings, as sent in the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    /// Case-insensitive substring of the name or id.
    pub search: Option<String>,
    pub status: Option<String>,
    /// Inclusive lower bound on the creation day.
    pub date_from: Option<String>,
    /// Inclusive upper bound on the creation day.
    pub date_to: Option<String>,
}

impl ListFilter {
    pub fn search(search: Option<String>) -> Self {
        Self {
            search,
            ..Self::default()
        }
    }

    /// Search needle, lowercased; blank searches match everything.
    pub(crate) fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// The parsed day range.
    pub(crate) fn days(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), FixtureError> {
        let parse = |field: &str, value: &Option<String>| match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_day(raw)
                .map(Some)
                .ok_or_else(|| FixtureError::Invalid(format!("Invalid {field}: {raw}"))),
        };
        Ok((parse("dateFrom", &self.date_from)?, parse("dateTo", &self.date_to)?))
    }
}

pub(crate) fn matches_needle(needle: &Option<String>, id: &str, name: &str) -> bool {
    match needle {
        Some(n) => name.to_lowercase().contains(n) || id.to_lowercase().contains(n),
        None => true,
    }
}

pub(crate) fn within_days(
    created: &str,
    (from, to): (Option<NaiveDate>, Option<NaiveDate>),
) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(day) = parse_day(created) else {
        return false;
    };
    from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
}

/// `YYYY-MM-DD` or an RFC 3339 timestamp, reduced to its UTC day.
pub(crate) fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

/// RFC 3339 with millisecond precision, the format fixtures are written in.
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Allocates `<prefix>-<millis>` ids that never repeat within a store.
#[derive(Debug, Default)]
pub(crate) struct IdSequence {
    last: i64,
}

impl IdSequence {
    pub(crate) fn next(&mut self, prefix: &str, now: DateTime<Utc>) -> String {
        self.last = now.timestamp_millis().max(self.last + 1);
        format!("{prefix}-{}", self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_day_accepts_dates_and_timestamps() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(parse_day("2025-01-15"), Some(day));
        assert_eq!(parse_day("2025-01-15T10:00:00Z"), Some(day));
        assert_eq!(parse_day("yesterday"), None);
    }

    #[test]
    fn test_day_range_is_inclusive() {
        let range = (
            NaiveDate::from_ymd_opt(2025, 1, 15),
            NaiveDate::from_ymd_opt(2025, 1, 16),
        );
        assert!(within_days("2025-01-15T23:00:00Z", range));
        assert!(within_days("2025-01-16T00:00:00Z", range));
        assert!(!within_days("2025-01-17T00:00:00Z", range));
    }

    #[test]
    fn test_invalid_filter_date_is_rejected() {
        let filter = ListFilter {
            date_from: Some("not-a-date".into()),
            ..ListFilter::default()
        };
        assert!(matches!(filter.days(), Err(FixtureError::Invalid(_))));
    }

    #[test]
    fn test_id_sequence_never_repeats() {
        let mut ids = IdSequence::default();
        let now = Utc::now();
        assert_ne!(ids.next("tag", now), ids.next("tag", now));
    }
}
