//! Grouping engine
//!
//! Turns a batch of questionnaire answers into discussion groups:
//!
//! ```text
//! RespondentRecord → encoder → similarity → assigner → rebalancer → extractor → GroupRecord
//! ```
//!
//! [`pipeline::GroupingEngine`] is the pure, synchronous part. [`runner::GroupingRunner`]
//! wraps it with the read/write boundary.

pub mod assigner;
pub mod assignment;
pub mod encoder;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod rebalancer;
pub mod runner;
pub mod similarity;

pub use assigner::ClusterAssigner;
pub use assignment::{Assignment, Membership};
pub use encoder::{encode, EncodedBatch, EncodedRow, FeatureColumn, FeatureKind, FeatureSchema};
pub use error::{GroupingError, Stage};
pub use extractor::{extract, GroupRecord};
pub use pipeline::{GroupingEngine, GroupingRun, RunOutcome, RunOverrides};
pub use rebalancer::{rebalance, RebalanceReport, SizeBounds, Transfer};
pub use runner::{GroupingRunner, RespondentSource, RosterSink, RosterWriteMode};
pub use similarity::SimilarityScore;

use serde::{Deserialize, Serialize};

/// One questionnaire submission as read from the store.
///
/// `hobbies` and `topics` are comma-delimited; `None` means the field was
/// absent, which fails validation. An empty string is a valid empty list.
/// `email` is used verbatim as the member id: surrounding whitespace or a
/// `,` fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondentRecord {
    pub email: String,
    pub hobbies: Option<String>,
    pub topics: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
}

impl RespondentRecord {
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
