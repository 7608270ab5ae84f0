//! Per-respondent similarity scores in hobby and topic space.
//!
//! These scores are diagnostics attached to a run; clustering works on the
//! raw feature columns, not on these values.

use super::encoder::{EncodedBatch, FeatureKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    pub email: String,
    pub hobby_similarity: f64,
    pub topic_similarity: f64,
    pub combined_similarity: f64,
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Full pairwise Euclidean distance matrix
pub fn distance_matrix(points: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean_distance(&points[i], &points[j]);
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }
    matrix
}

/// `1 / (1 + mean distance)` per row. The mean includes the zero self-distance.
pub fn inverse_mean_distance(points: &[Vec<f64>]) -> Vec<f64> {
    let n = points.len();
    distance_matrix(points)
        .iter()
        .map(|row| {
            let mean = row.iter().sum::<f64>() / n as f64;
            1.0 / (1.0 + mean)
        })
        .collect()
}

/// Similarity scores for every respondent, in batch order
pub fn estimate(batch: &EncodedBatch) -> Vec<SimilarityScore> {
    let hobby = inverse_mean_distance(&batch.subspace(FeatureKind::Hobby));
    let topic = inverse_mean_distance(&batch.subspace(FeatureKind::Topic));

    batch
        .rows
        .iter()
        .zip(hobby.into_iter().zip(topic))
        .map(|(row, (h, t))| SimilarityScore {
            email: row.email.clone(),
            hobby_similarity: h,
            topic_similarity: t,
            combined_similarity: (h + t) / 2.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::encoder::encode;
    use crate::grouping::RespondentRecord;

    #[test]
    fn test_self_distance_included_in_mean() {
        // two points at distance 1: mean over both columns is 0.5
        let scores = inverse_mean_distance(&[vec![0.0], vec![1.0]]);
        assert!((scores[0] - 1.0 / 1.5).abs() < 1e-12);
        assert!((scores[1] - 1.0 / 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_identical_points_score_one() {
        let scores = inverse_mean_distance(&[vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]]);
        assert!(scores.iter().all(|s| (*s - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_estimate_ranges_and_combined_mean() {
        let batch = encode(&[
            RespondentRecord::new("a@x", "chess, go", "ai"),
            RespondentRecord::new("b@x", "chess", "ai"),
            RespondentRecord::new("c@x", "surfing", "history"),
        ])
        .unwrap();
        let scores = estimate(&batch);

        assert_eq!(scores.len(), 3);
        for s in &scores {
            assert!(s.hobby_similarity > 0.0 && s.hobby_similarity <= 1.0);
            assert!(s.topic_similarity > 0.0 && s.topic_similarity <= 1.0);
            assert!((s.combined_similarity - (s.hobby_similarity + s.topic_similarity) / 2.0).abs() < 1e-12);
        }
        // the outlier is the least similar to the rest
        assert!(scores[2].combined_similarity < scores[1].combined_similarity);
    }
}
