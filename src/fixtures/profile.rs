//! Per-role profile fixtures with local edits.
//!
//! Reads return the requested role's fixture with the accumulated edits laid
//! over it. An unrecognized role falls back to the reader profile.

use std::sync::Mutex;

use serde_json::{json, Map, Value};

use super::FixtureError;

pub const DEFAULT_ROLE: &str = "READER";

/// Fields that identify the fixture and are never overwritten by edits.
const PINNED: [&str; 2] = ["id", "role"];

pub struct ProfileStore {
    roles: Vec<(&'static str, Map<String, Value>)>,
    edits: Mutex<Map<String, Value>>,
}

impl ProfileStore {
    pub fn seeded() -> Self {
        let roles = [
            (
                "READER",
                json!({
                    "id": "11111111-1111-1111-1111-111111111111",
                    "role": "READER",
                    "email": "reader@example.com",
                    "fullName": "Reader One",
                    "username": "reader1",
                    "dateOfBirth": "1999-02-01T00:00:00.000Z",
                    "coinBalance": 120,
                    "status": "ACTIVE",
                    "active": true,
                    "deleted": false
                }),
            ),
            (
                "REVIEWER",
                json!({
                    "id": "22222222-2222-2222-2222-222222222222",
                    "role": "REVIEWER",
                    "email": "reviewer@example.com",
                    "fullName": "Reviewer Jane",
                    "username": "reviewer_jane",
                    "ordid": "RV-2025-0001",
                    "dateOfBirth": "1990-07-15T00:00:00.000Z",
                    "coinBalance": 500,
                    "status": "ACTIVE",
                    "active": true,
                    "deleted": false
                }),
            ),
            (
                "ORGANIZATION",
                json!({
                    "id": "33333333-3333-3333-3333-333333333333",
                    "role": "ORGANIZATION",
                    "email": "org-admin@example.com",
                    "fullName": "John OrgAdmin",
                    "username": "org_admin",
                    "organizationName": "Acme Org",
                    "organizationEmail": "contact@acme.org",
                    "organizationHotline": "+1 555-0100",
                    "organizationLogo": "/images/logo/main.svg",
                    "organizationAddress": "123 Market St, Springfield",
                    "status": "ACTIVE",
                    "active": true,
                    "deleted": false
                }),
            ),
            (
                "BUSINESS_ADMIN",
                json!({
                    "id": "44444444-4444-4444-4444-444444444444",
                    "role": "BUSINESS_ADMIN",
                    "email": "biz-admin@example.com",
                    "fullName": "Biz Admin",
                    "username": "biz_admin",
                    "status": "ACTIVE",
                    "active": true,
                    "deleted": false
                }),
            ),
            (
                "SYSTEM_ADMIN",
                json!({
                    "id": "55555555-5555-5555-5555-555555555555",
                    "role": "SYSTEM_ADMIN",
                    "email": "sys-admin@example.com",
                    "fullName": "System Admin",
                    "username": "sys_admin",
                    "status": "ACTIVE",
                    "active": true,
                    "deleted": false
                }),
            ),
        ];

        Self {
            roles: roles
                .into_iter()
                .filter_map(|(role, value)| match value {
                    Value::Object(map) => Some((role, map)),
                    _ => None,
                })
                .collect(),
            edits: Mutex::new(Map::new()),
        }
    }

    fn fixture(&self, role: &str) -> Map<String, Value> {
        let wanted = role.trim().to_ascii_uppercase();
        self.roles
            .iter()
            .find(|(name, _)| *name == wanted)
            .or_else(|| self.roles.iter().find(|(name, _)| *name == DEFAULT_ROLE))
            .map(|(_, map)| map.clone())
            .unwrap_or_default()
    }

    /// Profile for `role` (reader when absent or unknown).
    pub fn get(&self, role: Option<&str>) -> Value {
        let mut profile = self.fixture(role.unwrap_or(DEFAULT_ROLE));
        let edits = self.edits.lock().expect("profile store mutex poisoned");
        for (key, value) in edits.iter() {
            profile.insert(key.clone(), value.clone());
        }
        Value::Object(profile)
    }

    /// Merge `patch` into the local edits and return the resulting profile.
    pub fn update(&self, role: Option<&str>, patch: Value) -> Result<Value, FixtureError> {
        let Value::Object(patch) = patch else {
            return Err(FixtureError::Invalid("Profile update must be a JSON object".into()));
        };
        {
            let mut edits = self.edits.lock().expect("profile store mutex poisoned");
            for (key, value) in patch {
                if !PINNED.contains(&key.as_str()) {
                    edits.insert(key, value);
                }
            }
        }
        Ok(self.get(role))
    }
}
