//! Agglomerative clustering of encoded respondents.
//!
//! Ward linkage on Euclidean distances: each step merges the pair of clusters
//! whose union least increases the within-cluster variance,
//!
//! ```text
//! Δ(A,B) = (nₐ × nᵦ)/(nₐ + nᵦ) × ||μₐ - μᵦ||²
//! ```
//!
//! The dendrogram comes from `kodama`; cutting it to `k` clusters replays the
//! first `n - k` merges. Ward merges are applied in order of non-decreasing
//! dissimilarity, so this is the same cut as a height threshold, minus the
//! ambiguity when several merges share a height.

use super::error::{GroupingError, Result, Stage};
use super::similarity::euclidean_distance;
use kodama::{linkage, Method};
use std::collections::HashMap;

/// Batch size below which clustering is skipped
pub const DEFAULT_MIN_BATCH: usize = 5;
/// One cluster per this many respondents
pub const DEFAULT_RESPONDENTS_PER_CLUSTER: usize = 5;

#[derive(Debug, Clone)]
pub struct ClusterAssigner {
    min_batch: usize,
    respondents_per_cluster: usize,
}

impl Default for ClusterAssigner {
    fn default() -> Self {
        Self {
            min_batch: DEFAULT_MIN_BATCH,
            respondents_per_cluster: DEFAULT_RESPONDENTS_PER_CLUSTER,
        }
    }
}

impl ClusterAssigner {
    pub fn new(min_batch: usize, respondents_per_cluster: usize) -> Self {
        Self {
            min_batch: min_batch.max(1),
            respondents_per_cluster: respondents_per_cluster.max(1),
        }
    }

    pub fn min_batch(&self) -> usize {
        self.min_batch
    }

    /// `max(1, n / respondents_per_cluster)`
    pub fn target_clusters(&self, n: usize) -> usize {
        (n / self.respondents_per_cluster).max(1)
    }

    /// Fails with `InsufficientData` below the minimum batch size
    pub fn check_batch(&self, n: usize) -> Result<()> {
        if n < self.min_batch {
            return Err(GroupingError::InsufficientData {
                respondents: n,
                required: self.min_batch,
            });
        }
        Ok(())
    }

    /// One label per row, dense in `0..k`, numbered by first appearance
    pub fn assign(&self, data: &[Vec<f64>]) -> Result<Vec<usize>> {
        let n = data.len();
        self.check_batch(n)?;

        let dim = data[0].len();
        if let Some(row) = data.iter().find(|row| row.len() != dim) {
            return Err(GroupingError::stage(
                Stage::Cluster,
                format!("dimension mismatch: expected {}, found {}", dim, row.len()),
            ));
        }

        let k = self.target_clusters(n).min(n);
        if n == 1 {
            return Ok(vec![0]);
        }

        // condensed upper triangle, row-major, length n choose 2
        let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
        for row in 0..(n - 1) {
            for col in (row + 1)..n {
                condensed.push(euclidean_distance(&data[row], &data[col]));
            }
        }

        let dendrogram = linkage(&mut condensed, n, Method::Ward);

        // kodama ids: leaves are 0..n, merge step i creates n + i
        let mut parent: Vec<usize> = (0..(2 * n - 1)).collect();
        for (i, step) in dendrogram.steps().iter().take(n - k).enumerate() {
            let merged = n + i;
            parent[step.cluster1] = merged;
            parent[step.cluster2] = merged;
        }

        let mut labels = Vec::with_capacity(n);
        let mut dense: HashMap<usize, usize> = HashMap::new();
        for leaf in 0..n {
            let root = find_root(&parent, leaf);
            let next = dense.len();
            labels.push(*dense.entry(root).or_insert(next));
        }

        tracing::info!(
            "Clustered {} respondents into {} clusters (Ward linkage)",
            n,
            dense.len()
        );

        Ok(labels)
    }
}

fn find_root(parent: &[usize], mut node: usize) -> usize {
    while parent[node] != node {
        node = parent[node];
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distinct_labels(labels: &[usize]) -> usize {
        labels.iter().collect::<std::collections::HashSet<_>>().len()
    }

    #[test]
    fn test_target_clusters() {
        let assigner = ClusterAssigner::default();
        assert_eq!(assigner.target_clusters(5), 1);
        assert_eq!(assigner.target_clusters(9), 1);
        assert_eq!(assigner.target_clusters(12), 2);
        assert_eq!(assigner.target_clusters(30), 6);
    }

    #[test]
    fn test_small_batch_is_insufficient() {
        let assigner = ClusterAssigner::default();
        for n in 0..5 {
            let data = vec![vec![0.0, 1.0]; n];
            let err = assigner.assign(&data).unwrap_err();
            assert!(matches!(
                err,
                GroupingError::InsufficientData { respondents, required: 5 } if respondents == n
            ));
        }
    }

    #[test]
    fn test_separates_obvious_clusters() {
        let mut data = Vec::new();
        for i in 0..5 {
            data.push(vec![0.0 + i as f64 * 0.01, 0.0]);
        }
        for i in 0..5 {
            data.push(vec![10.0 + i as f64 * 0.01, 10.0]);
        }

        let labels = ClusterAssigner::default().assign(&data).unwrap();
        assert_eq!(distinct_labels(&labels), 2);
        assert!(labels[..5].iter().all(|&l| l == 0));
        assert!(labels[5..].iter().all(|&l| l == 1));
    }

    #[test]
    fn test_cluster_count_matches_target() {
        let assigner = ClusterAssigner::default();
        for n in 5..40 {
            let data: Vec<Vec<f64>> = (0..n)
                .map(|i| vec![(i % 7) as f64, (i % 3) as f64, (i / 4) as f64])
                .collect();
            let labels = assigner.assign(&data).unwrap();
            assert_eq!(labels.len(), n);
            assert_eq!(distinct_labels(&labels), n / 5, "n = {n}");
        }
    }

    #[test]
    fn test_ragged_matrix_is_cluster_stage_error() {
        let mut data = vec![vec![0.0, 1.0]; 6];
        data[3] = vec![0.0];
        let err = ClusterAssigner::default().assign(&data).unwrap_err();
        assert!(matches!(
            err,
            GroupingError::Stage {
                stage: Stage::Cluster,
                ..
            }
        ));
        assert!(err.to_string().starts_with("Stage 'cluster' failed"));
    }

    #[test]
    fn test_identical_points_still_yield_target_count() {
        let data = vec![vec![1.0, 0.0]; 12];
        let labels = ClusterAssigner::default().assign(&data).unwrap();
        assert_eq!(distinct_labels(&labels), 2);
    }

    #[test]
    fn test_labels_numbered_by_first_appearance() {
        let data = vec![
            vec![10.0],
            vec![0.0],
            vec![10.1],
            vec![0.1],
            vec![10.2],
            vec![0.2],
            vec![10.3],
            vec![0.3],
            vec![10.4],
            vec![0.4],
        ];
        let labels = ClusterAssigner::default().assign(&data).unwrap();
        assert_eq!(labels, vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1]);
    }
}
