//! Error kinds surfaced by the grouping pipeline

use crate::db::DatabaseError;
use thiserror::Error;

/// Pipeline stage, used to tag unexpected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Cluster,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cluster => write!(f, "cluster"),
        }
    }
}

#[derive(Error, Debug)]
pub enum GroupingError {
    /// Malformed or missing respondent field. Aborts the run.
    #[error("Invalid respondent '{email}': {reason}")]
    Validation { email: String, reason: String },

    /// Not enough respondents to cluster. Reported as a skipped run.
    #[error("Not enough data for clustering: {respondents} respondents, {required} required")]
    InsufficientData { respondents: usize, required: usize },

    #[error("Invalid group size bounds: {0}")]
    InvalidBounds(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: Stage, message: String },
}

impl GroupingError {
    pub fn validation(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            email: email.into(),
            reason: reason.into(),
        }
    }

    pub fn stage(stage: Stage, message: impl Into<String>) -> Self {
        Self::Stage {
            stage,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GroupingError>;
