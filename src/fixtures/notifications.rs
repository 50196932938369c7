//! Notification inbox fixture.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    DocumentApproval,
    Comment,
    TagApproval,
    Purchase,
    SystemUpdate,
    ReviewRequest,
    ReviewAssigned,
    ReviewCompleted,
    OrganizationInvitation,
    OrganizationMemberAdded,
    OrganizationDocumentSubmitted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
}

/// Inbox snapshot taken under a single lock.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbox {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

pub struct NotificationStore {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationStore {
    pub fn new(entries: Vec<Notification>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Twelve notifications, seven unread, aged relative to `now`.
    pub fn seeded(now: DateTime<Utc>) -> Self {
        use NotificationKind::*;

        let seed: [(NotificationKind, &str, &str, i64, bool); 12] = [
            (DocumentApproval, "Document Approval Required", "Your document 'Project Proposal.pdf' is pending approval from John Doe.", 5, false),
            (Comment, "New Comment on Your Post", "Jane Smith commented on your article 'Getting Started with React'.", 30, false),
            (TagApproval, "Tag Approval Request", "Review tag approval for 'Machine Learning' in the Tech category.", 60, true),
            (Purchase, "Purchase Successful", "Your purchase of 'Premium Membership' ($29.99) has been completed.", 1440, true),
            (SystemUpdate, "System Maintenance Scheduled", "Scheduled maintenance on Dec 15, 2024 from 2:00 AM to 4:00 AM.", 2880, false),
            (DocumentApproval, "Document Approved", "Your document 'Quarterly Report Q4' has been approved by the review team.", 4320, true),
            (ReviewRequest, "Review Request Received", "New review request for 'Machine Learning Basics' from Tech Publications.", 10, false),
            (ReviewAssigned, "Review Assigned to You", "You have been assigned to review 'Advanced React Patterns' document.", 15, false),
            (ReviewCompleted, "Review Completed", "Your review of 'Node.js Best Practices' has been completed and published.", 120, true),
            (OrganizationInvitation, "Organization Invitation", "You have been invited to join 'Tech Innovation Hub' organization.", 180, false),
            (OrganizationMemberAdded, "New Member Added", "Alice Johnson has been added to your organization 'Digital Solutions Inc'.", 240, true),
            (OrganizationDocumentSubmitted, "Document Submitted for Review", "New document 'Annual Financial Report 2024' submitted by Finance Team.", 300, false),
        ];

        let entries = seed
            .into_iter()
            .enumerate()
            .map(|(i, (kind, title, summary, minutes_ago, is_read))| Notification {
                id: (i + 1).to_string(),
                kind,
                title: title.to_string(),
                summary: summary.to_string(),
                timestamp: now - Duration::minutes(minutes_ago),
                is_read,
            })
            .collect();
        Self::new(entries)
    }

    /// Most recently inserted first.
    pub fn list(&self) -> Vec<Notification> {
        let entries = self.entries.lock().expect("notification store mutex poisoned");
        entries.iter().rev().cloned().collect()
    }

    pub fn unread_count(&self) -> usize {
        let entries = self.entries.lock().expect("notification store mutex poisoned");
        entries.iter().filter(|n| !n.is_read).count()
    }

    /// List and unread count from the same state.
    pub fn inbox(&self) -> Inbox {
        let entries = self.entries.lock().expect("notification store mutex poisoned");
        Inbox {
            notifications: entries.iter().rev().cloned().collect(),
            unread_count: entries.iter().filter(|n| !n.is_read).count(),
        }
    }

    /// `false` when no notification has this id. Marking twice is harmless.
    pub fn mark_as_read(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().expect("notification store mutex poisoned");
        match entries.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.is_read = true;
                true
            }
            None => false,
        }
    }

    /// Number of notifications that changed state.
    pub fn mark_all_as_read(&self) -> usize {
        let mut entries = self.entries.lock().expect("notification store mutex poisoned");
        entries
            .iter_mut()
            .filter(|n| !n.is_read)
            .map(|n| n.is_read = true)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> NotificationStore {
        NotificationStore::seeded(Utc::now())
    }

    #[test]
    fn test_seed_has_seven_unread() {
        let store = store();
        assert_eq!(store.list().len(), 12);
        assert_eq!(store.unread_count(), 7);
    }

    #[test]
    fn test_list_is_most_recent_first() {
        let ids: Vec<String> = store().list().into_iter().map(|n| n.id).collect();
        assert_eq!(ids.first().map(String::as_str), Some("12"));
        assert_eq!(ids.last().map(String::as_str), Some("1"));
    }

    #[test]
    fn test_mark_as_read_is_idempotent() {
        let store = store();
        assert!(store.mark_as_read("1"));
        assert_eq!(store.unread_count(), 6);
        assert!(store.mark_as_read("1"));
        assert_eq!(store.unread_count(), 6);
    }

    #[test]
    fn test_mark_missing_is_false() {
        let store = store();
        assert!(!store.mark_as_read("999"));
        assert_eq!(store.unread_count(), 7);
    }

    #[test]
    fn test_mark_all_reports_changed() {
        let store = store();
        store.mark_as_read("2");
        assert_eq!(store.mark_all_as_read(), 6);
        assert_eq!(store.mark_all_as_read(), 0);
        assert_eq!(store.inbox().unread_count, 0);
    }

    #[test]
    fn test_serializes_in_camel_case() {
        let json = serde_json::to_value(&store().list()[0]).unwrap();
        assert_eq!(json["type"], "ORGANIZATION_DOCUMENT_SUBMITTED");
        assert_eq!(json["isRead"], false);
    }
}
