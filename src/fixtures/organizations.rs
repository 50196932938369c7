//! Organizations the reader belongs to.

use std::sync::Mutex;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub email: String,
    pub hotline: String,
    pub logo: Option<String>,
    pub address: String,
    pub join_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub join_date: String,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationList {
    pub items: Vec<OrganizationSummary>,
    pub total: usize,
}

pub struct OrganizationStore {
    entries: Mutex<Vec<Organization>>,
}

impl OrganizationStore {
    pub fn new(entries: Vec<Organization>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn seeded() -> Self {
        Self::new(vec![
            Organization {
                id: "org-1".into(),
                name: "Tech Innovation Hub".into(),
                kind: "NON-PROFIT".into(),
                email: "info@innovation.example.org".into(),
                hotline: "+1 (555) 010-2000".into(),
                logo: None,
                address: "100 Innovation Way, Metropolis".into(),
                join_date: "2024-01-15T00:00:00Z".into(),
            },
            Organization {
                id: "org-2".into(),
                name: "Digital Solutions Inc".into(),
                kind: "COMPANY".into(),
                email: "contact@digital.example.com".into(),
                hotline: "+1 (555) 010-2000".into(),
                logo: None,
                address: "200 Market St, Springfield".into(),
                join_date: "2024-03-20T00:00:00Z".into(),
            },
        ])
    }

    pub fn list(&self) -> OrganizationList {
        let entries = self.entries.lock().expect("organization store mutex poisoned");
        let items: Vec<OrganizationSummary> = entries
            .iter()
            .map(|o| OrganizationSummary {
                id: o.id.clone(),
                name: o.name.clone(),
                kind: o.kind.clone(),
                join_date: o.join_date.clone(),
                logo: o.logo.clone(),
            })
            .collect();
        OrganizationList {
            total: items.len(),
            items,
        }
    }

    pub fn get(&self, id: &str) -> Option<Organization> {
        let entries = self.entries.lock().expect("organization store mutex poisoned");
        entries.iter().find(|o| o.id == id).cloned()
    }

    /// Drop the membership; `false` when the reader was not a member.
    pub fn leave(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().expect("organization store mutex poisoned");
        let before = entries.len();
        entries.retain(|o| o.id != id);
        entries.len() != before
    }
}
