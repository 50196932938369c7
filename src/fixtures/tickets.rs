//! Contact-admin ticket fixture.
//!
//! Tickets are keyed by id in a `DashMap`; creation never touches an existing
//! entry, so no store-wide lock is needed.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FixtureError;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketCategory {
    Payment,
    Access,
    Content,
    Technical,
    Account,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketStatus {
    Open,
    Pending,
    Resolved,
    Closed,
}

/// What the contact form submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub category: TicketCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_category: Option<String>,
    pub urgency: Urgency,
    pub subject: String,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), FixtureError> {
        for (field, value) in [
            ("name", &self.name),
            ("subject", &self.subject),
            ("message", &self.message),
        ] {
            if value.trim().is_empty() {
                return Err(FixtureError::Invalid(format!("{field} is required")));
            }
        }
        if !is_email(&self.email) {
            return Err(FixtureError::Invalid("Invalid email address".into()));
        }
        if self.category == TicketCategory::Other
            && self.other_category.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(FixtureError::Invalid(
                "otherCategory is required when category is OTHER".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Creator {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub ticket_id: String,
    pub ticket_code: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub created_by: Creator,
    pub payload: ContactRequest,
}

struct Entry {
    seq: u64,
    ticket: Ticket,
}

#[derive(Default)]
pub struct TicketStore {
    tickets: DashMap<String, Entry>,
    seq: AtomicU64,
}

impl TicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and file a new ticket with status `OPEN`.
    pub fn create(&self, payload: ContactRequest) -> Result<Ticket, FixtureError> {
        payload.validate()?;

        let now = Utc::now();
        let ticket = Ticket {
            ticket_id: Uuid::new_v4().to_string(),
            ticket_code: ticket_code(now),
            status: TicketStatus::Open,
            created_at: now,
            created_by: Creator {
                name: payload.name.trim().to_string(),
                email: payload.email.trim().to_string(),
            },
            payload,
        };

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.tickets.insert(
            ticket.ticket_id.clone(),
            Entry {
                seq,
                ticket: ticket.clone(),
            },
        );
        tracing::debug!(ticket_code = %ticket.ticket_code, "Ticket filed");
        Ok(ticket)
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Ticket> {
        let mut entries: Vec<(u64, Ticket)> = self
            .tickets
            .iter()
            .map(|e| (e.seq, e.ticket.clone()))
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        entries.into_iter().map(|(_, t)| t).collect()
    }

    pub fn get_by_id(&self, id: &str) -> Option<Ticket> {
        self.tickets.get(id).map(|e| e.ticket.clone())
    }

    pub fn get_by_code(&self, code: &str) -> Option<Ticket> {
        self.tickets
            .iter()
            .find(|e| e.ticket.ticket_code.eq_ignore_ascii_case(code))
            .map(|e| e.ticket.clone())
    }

    /// By id first, then by code.
    pub fn find(&self, id_or_code: &str) -> Option<Ticket> {
        self.get_by_id(id_or_code)
            .or_else(|| self.get_by_code(id_or_code))
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

/// `TCK-YYYYMMDD-XXXXX`
fn ticket_code(now: DateTime<Utc>) -> String {
    let suffix: String = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[fastrand::usize(..CODE_ALPHABET.len())] as char)
        .collect();
    format!("TCK-{}-{}", now.format("%Y%m%d"), suffix)
}

fn is_email(raw: &str) -> bool {
    let email = raw.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}
