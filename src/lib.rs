//! FindAFriend - questionnaire-driven discussion groups
//!
//! Respondents describe their hobbies, topics of interest and a few
//! demographics. Once a day the grouping engine clusters everyone who answered
//! into groups of roughly five, and each group gets its own chat channel.
//!
//! # Modules
//!
//! - [`grouping`] - Feature encoding, Ward clustering and group size repair
//! - [`scheduler`] - Periodic, serialized grouping runs
//! - [`chat`] - Per-group message fan-out
//! - [`db`] - SQLite persistence for answers, groups and messages
//! - [`config`] - JSON configuration with environment overrides
//!
//! # Example
//!
//! ```rust
//! use findafriend::grouping::{GroupingEngine, RespondentRecord};
//! use rand::SeedableRng;
//!
//! # fn example() -> anyhow::Result<()> {
//! let records: Vec<RespondentRecord> = (0..10)
//!     .map(|i| RespondentRecord::new(format!("user{i}@example.com"), "chess, hiking", "ai"))
//!     .collect();
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//! let outcome = GroupingEngine::default().group(&records, &mut rng)?;
//! assert_eq!(outcome.groups().len(), 2);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod chat;
pub mod config;
pub mod db;
pub mod grouping;
pub mod logging;
pub mod scheduler;

pub use chat::ChatHub;
pub use config::AppConfig;
pub use db::Database;
pub use grouping::{GroupRecord, GroupingEngine, GroupingRunner, RespondentRecord, RunOutcome};
pub use scheduler::GroupingScheduler;
