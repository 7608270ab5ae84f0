//! The pure grouping pipeline: records in, groups out. No I/O.

use super::assigner::ClusterAssigner;
use super::assignment::Assignment;
use super::encoder::{encode, FeatureSchema};
use super::error::{GroupingError, Result};
use super::extractor::{extract, GroupRecord};
use super::rebalancer::{rebalance, SizeBounds, Transfer};
use super::similarity::{self, SimilarityScore};
use super::RespondentRecord;
use crate::config::GroupingConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-run overrides of the configured bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOverrides {
    pub min_size: Option<usize>,
    pub max_size: Option<usize>,
    pub min_batch: Option<usize>,
}

impl RunOverrides {
    pub fn apply(&self, base: &GroupingConfig) -> GroupingConfig {
        GroupingConfig {
            min_size: self.min_size.unwrap_or(base.min_size),
            max_size: self.max_size.unwrap_or(base.max_size),
            min_batch: self.min_batch.unwrap_or(base.min_batch),
            ..base.clone()
        }
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct GroupingRun {
    pub groups: Vec<GroupRecord>,
    pub schema: FeatureSchema,
    pub similarity: Vec<SimilarityScore>,
    /// Cluster sizes straight out of the assigner, keyed by label
    pub raw_sizes: BTreeMap<usize, usize>,
    pub transfers: Vec<Transfer>,
    /// Clusters left above `max_size`
    pub oversized: Vec<usize>,
}

impl GroupingRun {
    pub fn raw_cluster_count(&self) -> usize {
        self.raw_sizes.len()
    }

    pub fn respondent_count(&self) -> usize {
        self.groups.iter().map(|g| g.members.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    Grouped(GroupingRun),
    /// Too few respondents; nothing was clustered
    Skipped { respondents: usize, required: usize },
}

impl RunOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    /// Produced groups; empty when skipped
    pub fn groups(&self) -> &[GroupRecord] {
        match self {
            Self::Grouped(run) => &run.groups,
            Self::Skipped { .. } => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct GroupingEngine {
    bounds: SizeBounds,
    assigner: ClusterAssigner,
}

impl Default for GroupingEngine {
    fn default() -> Self {
        Self {
            bounds: SizeBounds::default(),
            assigner: ClusterAssigner::default(),
        }
    }
}

impl GroupingEngine {
    pub fn new(config: &GroupingConfig) -> Result<Self> {
        if config.min_batch == 0 || config.respondents_per_group == 0 {
            return Err(GroupingError::InvalidBounds(
                "min_batch and respondents_per_group must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            bounds: SizeBounds::new(config.min_size, config.max_size)?,
            assigner: ClusterAssigner::new(config.min_batch, config.respondents_per_group),
        })
    }

    pub fn bounds(&self) -> SizeBounds {
        self.bounds
    }

    /// Run the whole pipeline on one snapshot.
    ///
    /// Validation happens before the batch-size gate, so a malformed record
    /// fails even in a batch too small to cluster.
    pub fn group<R: Rng + ?Sized>(
        &self,
        records: &[RespondentRecord],
        rng: &mut R,
    ) -> Result<RunOutcome> {
        let batch = encode(records)?;

        match self.assigner.check_batch(batch.len()) {
            Ok(()) => {}
            Err(GroupingError::InsufficientData {
                respondents,
                required,
            }) => {
                tracing::warn!(
                    "Clustering skipped: {} respondents, at least {} required",
                    respondents,
                    required
                );
                return Ok(RunOutcome::Skipped {
                    respondents,
                    required,
                });
            }
            Err(e) => return Err(e),
        }

        let similarity = similarity::estimate(&batch);

        let labels = self.assigner.assign(&batch.matrix())?;
        let assignment = Assignment::new(batch.rows.iter().map(|r| r.email.clone()), labels);
        let raw_sizes = assignment.cluster_sizes();
        tracing::info!("Raw cluster sizes: {:?}", raw_sizes);

        let (assignment, report) = rebalance(assignment, self.bounds, rng);
        tracing::info!(
            "Rebalanced clusters with {} transfers: {:?}",
            report.transfers.len(),
            assignment.cluster_sizes()
        );

        let groups = extract(&assignment);

        Ok(RunOutcome::Grouped(GroupingRun {
            groups,
            schema: batch.schema,
            similarity,
            raw_sizes,
            transfers: report.transfers,
            oversized: report.oversized,
        }))
    }
}
