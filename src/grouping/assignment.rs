//! Respondent to cluster-label mapping

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub email: String,
    pub label: usize,
}

/// Cluster labels in batch order. Only the rebalancer mutates labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    members: Vec<Membership>,
}

impl Assignment {
    pub fn new(emails: impl IntoIterator<Item = String>, labels: impl IntoIterator<Item = usize>) -> Self {
        let members = emails
            .into_iter()
            .zip(labels)
            .map(|(email, label)| Membership { email, label })
            .collect();
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Membership] {
        &self.members
    }

    pub fn label_of(&self, email: &str) -> Option<usize> {
        self.members
            .iter()
            .find(|m| m.email == email)
            .map(|m| m.label)
    }

    pub(crate) fn relabel(&mut self, index: usize, label: usize) {
        self.members[index].label = label;
    }

    /// Positions of the members currently carrying `label`
    pub fn indices_with(&self, label: usize) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.label == label)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn cluster_sizes(&self) -> BTreeMap<usize, usize> {
        let mut sizes = BTreeMap::new();
        for m in &self.members {
            *sizes.entry(m.label).or_insert(0) += 1;
        }
        sizes
    }

    /// Distinct labels in order of first appearance
    pub fn labels(&self) -> Vec<usize> {
        let mut seen = Vec::new();
        for m in &self.members {
            if !seen.contains(&m.label) {
                seen.push(m.label);
            }
        }
        seen
    }
}
