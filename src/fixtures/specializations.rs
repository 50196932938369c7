//! Specializations, scoped to a domain.

use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;

use super::{matches_needle, timestamp, FixtureError, IdSequence};

const DUPLICATE: &str = "Specialization already exists in this domain.";
const EMPTY_NAME: &str = "Specialization name cannot be empty.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialization {
    pub id: String,
    pub name: String,
    pub domain_id: String,
    pub created_at: String,
    pub updated_at: String,
}

struct Inner {
    entries: Vec<Specialization>,
    ids: IdSequence,
}

pub struct SpecializationStore {
    inner: Mutex<Inner>,
}

impl SpecializationStore {
    pub fn new(entries: Vec<Specialization>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries,
                ids: IdSequence::default(),
            }),
        }
    }

    pub fn seeded() -> Self {
        let seed = [
            ("Software Engineering", "domain-1"),
            ("Artificial Intelligence", "domain-1"),
            ("Data Science", "domain-1"),
            ("Cybersecurity", "domain-1"),
            ("Algebra", "domain-2"),
            ("Calculus", "domain-2"),
            ("Statistics", "domain-2"),
            ("Quantum Physics", "domain-3"),
            ("Thermodynamics", "domain-3"),
            ("Molecular Biology", "domain-4"),
        ];
        Self::new(
            seed.into_iter()
                .enumerate()
                .map(|(i, (name, domain))| {
                    let at = format!("2025-01-{:02}T{:02}:00:00Z", 10 + i, 10 + i);
                    Specialization {
                        id: format!("spec-{}", i + 1),
                        name: name.to_string(),
                        domain_id: domain.to_string(),
                        created_at: at.clone(),
                        updated_at: at,
                    }
                })
                .collect(),
        )
    }

    /// Specializations of one domain, optionally searched by name or id.
    pub fn list(&self, domain_id: &str, search: Option<&str>) -> Vec<Specialization> {
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let inner = self.inner.lock().expect("specialization store mutex poisoned");
        inner
            .entries
            .iter()
            .filter(|s| s.domain_id == domain_id)
            .filter(|s| matches_needle(&needle, &s.id, &s.name))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Specialization> {
        let inner = self.inner.lock().expect("specialization store mutex poisoned");
        inner.entries.iter().find(|s| s.id == id).cloned()
    }

    pub fn create(&self, name: &str, domain_id: &str) -> Result<Specialization, FixtureError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FixtureError::Invalid(EMPTY_NAME.into()));
        }
        if domain_id.trim().is_empty() {
            return Err(FixtureError::Invalid("domainId is required".into()));
        }

        let mut inner = self.inner.lock().expect("specialization store mutex poisoned");
        if inner
            .entries
            .iter()
            .any(|s| s.domain_id == domain_id && s.name.trim().eq_ignore_ascii_case(name))
        {
            return Err(FixtureError::Conflict(DUPLICATE.into()));
        }

        let now = Utc::now();
        let at = timestamp(now);
        let spec = Specialization {
            id: inner.ids.next("spec", now),
            name: name.to_string(),
            domain_id: domain_id.to_string(),
            created_at: at.clone(),
            updated_at: at,
        };
        inner.entries.insert(0, spec.clone());
        Ok(spec)
    }

    /// Rename within the specialization's own domain.
    pub fn update(&self, id: &str, name: Option<&str>) -> Result<Specialization, FixtureError> {
        let mut inner = self.inner.lock().expect("specialization store mutex poisoned");
        let index = inner
            .entries
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found(id))?;

        let Some(name) = name.map(str::trim) else {
            return Ok(inner.entries[index].clone());
        };
        if name.is_empty() {
            return Err(FixtureError::Invalid(EMPTY_NAME.into()));
        }

        let domain = inner.entries[index].domain_id.clone();
        if name != inner.entries[index].name
            && inner.entries.iter().any(|s| {
                s.id != id && s.domain_id == domain && s.name.trim().eq_ignore_ascii_case(name)
            })
        {
            return Err(FixtureError::Conflict(DUPLICATE.into()));
        }

        let spec = &mut inner.entries[index];
        spec.name = name.to_string();
        spec.updated_at = timestamp(Utc::now());
        Ok(spec.clone())
    }

    pub fn delete(&self, id: &str) -> Result<Specialization, FixtureError> {
        let mut inner = self.inner.lock().expect("specialization store mutex poisoned");
        let index = inner
            .entries
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found(id))?;
        Ok(inner.entries.remove(index))
    }
}

fn not_found(id: &str) -> FixtureError {
    FixtureError::NotFound(format!("Specialization with id {id} not found"))
}
