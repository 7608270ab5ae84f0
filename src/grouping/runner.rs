//! Read/write boundary around the grouping engine

use super::error::Result;
use super::extractor::GroupRecord;
use super::pipeline::{GroupingEngine, RunOutcome, RunOverrides};
use super::RespondentRecord;
use crate::config::GroupingConfig;
use crate::db::DatabaseError;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a run's groups land in the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RosterWriteMode {
    /// Previous groups are removed in the same transaction
    #[default]
    Replace,
    /// Previous groups are kept
    Append,
}

impl std::fmt::Display for RosterWriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Append => write!(f, "append"),
        }
    }
}

/// Complete snapshot of questionnaire answers
#[async_trait]
pub trait RespondentSource: Send + Sync {
    async fn load_respondents(&self) -> std::result::Result<Vec<RespondentRecord>, DatabaseError>;
}

/// Writes a run's groups as one atomic unit
#[async_trait]
pub trait RosterSink: Send + Sync {
    async fn write_roster(
        &self,
        groups: &[GroupRecord],
        mode: RosterWriteMode,
    ) -> std::result::Result<(), DatabaseError>;
}

pub struct GroupingRunner<S> {
    store: Arc<S>,
    config: GroupingConfig,
    mode: RosterWriteMode,
}

impl<S> GroupingRunner<S>
where
    S: RespondentSource + RosterSink,
{
    pub fn new(store: Arc<S>, config: GroupingConfig, mode: RosterWriteMode) -> Self {
        Self {
            store,
            config,
            mode,
        }
    }

    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Load one snapshot, group it, persist the groups.
    ///
    /// Nothing is written for a skipped run. Persistence errors come back
    /// unchanged and leave the previous roster in place.
    pub async fn run(&self, overrides: RunOverrides) -> Result<RunOutcome> {
        let config = overrides.apply(&self.config);
        let engine = GroupingEngine::new(&config)?;

        let records = self.store.load_respondents().await?;
        tracing::info!("Loaded {} questionnaire responses", records.len());

        let outcome = match config.rng_seed {
            Some(seed) => engine.group(&records, &mut StdRng::seed_from_u64(seed))?,
            None => engine.group(&records, &mut StdRng::from_entropy())?,
        };

        if let RunOutcome::Grouped(run) = &outcome {
            self.store.write_roster(&run.groups, self.mode).await?;
            tracing::info!(
                "Saved {} groups ({} respondents, mode: {})",
                run.groups.len(),
                run.respondent_count(),
                self.mode
            );
        }

        Ok(outcome)
    }
}
