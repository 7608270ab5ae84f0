//! Cluster size repair.
//!
//! Ward clustering has no notion of group size, so oversized clusters
//! (donors) hand random members to undersized clusters (receivers) until each
//! donor is back at `max_size`.
//!
//! Known limitation: the receiver list is taken once, before any transfer.
//! A receiver that reaches `min_size` stays eligible, so repeated donations
//! can push it past `max_size`. Donors are only bounded when at least one
//! receiver exists.

use super::assignment::Assignment;
use super::error::{GroupingError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_SIZE: usize = 4;
pub const DEFAULT_MAX_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub min_size: usize,
    pub max_size: usize,
}

impl Default for SizeBounds {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl SizeBounds {
    pub fn new(min_size: usize, max_size: usize) -> Result<Self> {
        let bounds = Self { min_size, max_size };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_size == 0 || self.max_size == 0 {
            return Err(GroupingError::InvalidBounds(
                "sizes must be greater than 0".to_string(),
            ));
        }
        if self.min_size > self.max_size {
            return Err(GroupingError::InvalidBounds(format!(
                "min_size {} exceeds max_size {}",
                self.min_size, self.max_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub email: String,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RebalanceReport {
    pub transfers: Vec<Transfer>,
    /// Donors still above `max_size` because no receiver was available
    pub oversized: Vec<usize>,
}

/// Move members out of oversized clusters. Takes the assignment by value and
/// hands it back once every donor is processed.
pub fn rebalance<R: Rng + ?Sized>(
    mut assignment: Assignment,
    bounds: SizeBounds,
    rng: &mut R,
) -> (Assignment, RebalanceReport) {
    let mut sizes = assignment.cluster_sizes();
    let receivers: Vec<usize> = sizes
        .iter()
        .filter(|&(_, &size)| size < bounds.min_size)
        .map(|(&label, _)| label)
        .collect();
    let donors: Vec<usize> = sizes
        .iter()
        .filter(|&(_, &size)| size > bounds.max_size)
        .map(|(&label, _)| label)
        .collect();

    let mut report = RebalanceReport::default();

    for donor in donors {
        while sizes[&donor] > bounds.max_size {
            let Some(&index) = assignment.indices_with(donor).choose(rng) else {
                break;
            };
            let Some(&receiver) = receivers.choose(rng) else {
                report.oversized.push(donor);
                break;
            };

            assignment.relabel(index, receiver);
            if let Some(size) = sizes.get_mut(&donor) {
                *size -= 1;
            }
            *sizes.entry(receiver).or_insert(0) += 1;

            let email = assignment.members()[index].email.clone();
            tracing::debug!("Moved {} from cluster {} to cluster {}", email, donor, receiver);
            report.transfers.push(Transfer {
                email,
                from: donor,
                to: receiver,
            });
        }
    }

    if !report.oversized.is_empty() {
        tracing::warn!(
            "No undersized clusters to receive members; clusters {:?} remain above {}",
            report.oversized,
            bounds.max_size
        );
    }

    (assignment, report)
}
