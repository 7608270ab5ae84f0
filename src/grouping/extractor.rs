//! Final assignment to persistable group records

use super::assignment::Assignment;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator used when a member list is stored as a single column
pub const MEMBER_SEPARATOR: &str = ",";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: String,
    pub group_name: String,
    /// Emails in batch encounter order
    pub members: Vec<String>,
}

impl GroupRecord {
    pub fn new(group_name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            group_name: group_name.into(),
            members,
        }
    }

    /// Display name for a zero-based cluster label
    pub fn name_for(label: usize) -> String {
        format!("Group {}", label + 1)
    }

    /// Members joined for storage
    pub fn email_list(&self) -> String {
        self.members.join(MEMBER_SEPARATOR)
    }

    /// Inverse of [`email_list`](Self::email_list)
    pub fn parse_email_list(raw: &str) -> Vec<String> {
        raw.split(MEMBER_SEPARATOR)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One record per label present; labels left without members do not appear
pub fn extract(assignment: &Assignment) -> Vec<GroupRecord> {
    assignment
        .labels()
        .into_iter()
        .map(|label| {
            let members = assignment
                .members()
                .iter()
                .filter(|m| m.label == label)
                .map(|m| m.email.clone())
                .collect();
            GroupRecord::new(GroupRecord::name_for(label), members)
        })
        .collect()
}
