//! Database models

use crate::grouping::{GroupRecord, RespondentRecord};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Questionnaire submission record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Questionnaire {
    pub email: String,
    pub hobbies: Option<String>,
    pub topics: Option<String>,
    pub gender: Option<String>,
    pub year: Option<String>,
    pub purpose: Option<String>,
    #[serde(default = "now")]
    pub submitted_at: String,
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

impl Questionnaire {
    pub fn new(
        email: impl Into<String>,
        hobbies: impl Into<String>,
        topics: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            hobbies: Some(hobbies.into()),
            topics: Some(topics.into()),
            gender: None,
            year: None,
            purpose: None,
            submitted_at: now(),
        }
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

impl From<Questionnaire> for RespondentRecord {
    fn from(row: Questionnaire) -> Self {
        Self {
            email: row.email,
            hobbies: row.hobbies,
            topics: row.topics,
            gender: row.gender,
            year: row.year,
            purpose: row.purpose,
        }
    }
}

/// Group roster record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DbGroup {
    pub id: String,
    pub group_name: String,
    /// Comma-joined member emails
    pub email: String,
    pub created_at: String,
}

impl DbGroup {
    pub fn members(&self) -> Vec<String> {
        GroupRecord::parse_email_list(&self.email)
    }
}

impl From<&GroupRecord> for DbGroup {
    fn from(group: &GroupRecord) -> Self {
        Self {
            id: group.id.clone(),
            group_name: group.group_name.clone(),
            email: group.email_list(),
            created_at: now(),
        }
    }
}

/// Chat message record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DbMessage {
    pub id: String,
    pub group_name: String,
    pub email: String,
    pub message: String,
    pub timestamp: String,
}

impl DbMessage {
    pub fn new(
        group_name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            group_name: group_name.into(),
            email: email.into(),
            message: message.into(),
            timestamp: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questionnaire_into_record() {
        let row = Questionnaire::new("a@x", "chess", "ai")
            .with_gender("f")
            .with_year("2")
            .with_purpose("meet people");
        let record: RespondentRecord = row.into();
        assert_eq!(record.email, "a@x");
        assert_eq!(record.hobbies.as_deref(), Some("chess"));
        assert_eq!(record.purpose.as_deref(), Some("meet people"));
    }

    #[test]
    fn test_group_round_trips_member_list() {
        let group = GroupRecord::new("Group 1", vec!["a@x".to_string(), "b@x".to_string()]);
        let row = DbGroup::from(&group);
        assert_eq!(row.email, "a@x,b@x");
        assert_eq!(row.members(), group.members);
    }

    #[test]
    fn test_message_ids_unique() {
        let a = DbMessage::new("Group 1", "a@x", "hi");
        let b = DbMessage::new("Group 1", "a@x", "hi");
        assert_ne!(a.id, b.id);
    }
}
