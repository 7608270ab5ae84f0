//! Feature encoding: questionnaire rows to a multi-hot/one-hot matrix.
//!
//! The column set depends on the values observed in the batch, so every run
//! builds a fresh [`FeatureSchema`] and every consumer reads columns through it.
//! Columns are laid out as:
//!
//! ```text
//! hobby:<v>...  topic:<v>...  gender:<v>...  year:<v>...
//! ```
//!
//! Hobby and topic values each get one column per distinct value (sorted).
//! Gender and year are one-hot encoded with the lexicographically first
//! category dropped as the reference, so k categories yield k-1 columns.

use super::error::{GroupingError, Result};
use super::extractor::MEMBER_SEPARATOR;
use super::RespondentRecord;
use std::collections::{BTreeSet, HashSet};

/// Which questionnaire attribute a column was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureKind {
    Hobby,
    Topic,
    Gender,
    Year,
}

impl FeatureKind {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Hobby => "hobby",
            Self::Topic => "topic",
            Self::Gender => "gender",
            Self::Year => "year",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureColumn {
    pub kind: FeatureKind,
    pub value: String,
}

impl FeatureColumn {
    pub fn name(&self) -> String {
        format!("{}:{}", self.kind.prefix(), self.value)
    }
}

/// Ordered column layout for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(FeatureColumn::name).collect()
    }

    /// Column indices belonging to one attribute, in schema order
    pub fn indices_of(&self, kind: FeatureKind) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == kind)
            .map(|(i, _)| i)
            .collect()
    }
}

/// One respondent's feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRow {
    pub email: String,
    pub values: Vec<f64>,
}

impl EncodedRow {
    /// Values restricted to the given columns
    pub fn project(&self, indices: &[usize]) -> Vec<f64> {
        indices.iter().map(|&i| self.values[i]).collect()
    }
}

#[derive(Debug, Clone)]
pub struct EncodedBatch {
    pub schema: FeatureSchema,
    pub rows: Vec<EncodedRow>,
}

impl EncodedBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Full feature matrix, one row per respondent in batch order
    pub fn matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.values.clone()).collect()
    }

    /// Matrix restricted to one attribute's columns
    pub fn subspace(&self, kind: FeatureKind) -> Vec<Vec<f64>> {
        let indices = self.schema.indices_of(kind);
        self.rows.iter().map(|r| r.project(&indices)).collect()
    }
}

struct ParsedRecord<'a> {
    email: &'a str,
    hobbies: BTreeSet<String>,
    topics: BTreeSet<String>,
    gender: Option<&'a str>,
    year: Option<&'a str>,
}

/// Split a comma-delimited tag list into trimmed, non-empty values
pub fn split_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn nominal(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_records(records: &[RespondentRecord]) -> Result<Vec<ParsedRecord<'_>>> {
    let mut seen = HashSet::new();
    let mut parsed = Vec::with_capacity(records.len());

    for record in records {
        let email = record.email.as_str();
        if email.trim().is_empty() {
            return Err(GroupingError::validation("", "email is empty"));
        }
        if email.trim() != email {
            return Err(GroupingError::validation(email, "email has surrounding whitespace"));
        }
        // the roster stores members as one separator-joined column
        if email.contains(MEMBER_SEPARATOR) {
            return Err(GroupingError::validation(email, "email contains the member separator"));
        }
        if !seen.insert(email) {
            return Err(GroupingError::validation(email, "duplicate email in batch"));
        }
        let hobbies = record
            .hobbies
            .as_deref()
            .ok_or_else(|| GroupingError::validation(email, "missing field 'hobbies'"))?;
        let topics = record
            .topics
            .as_deref()
            .ok_or_else(|| GroupingError::validation(email, "missing field 'topics'"))?;

        parsed.push(ParsedRecord {
            email,
            hobbies: split_tags(hobbies),
            topics: split_tags(topics),
            gender: nominal(&record.gender),
            year: nominal(&record.year),
        });
    }

    Ok(parsed)
}

/// Non-reference categories: every observed value except the first in sort order
fn dummy_categories<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let categories: BTreeSet<&str> = values.flatten().collect();
    categories.into_iter().skip(1).map(str::to_string).collect()
}

/// Encode a batch. Every record is validated before any column is built.
pub fn encode(records: &[RespondentRecord]) -> Result<EncodedBatch> {
    let parsed = parse_records(records)?;

    let hobbies: BTreeSet<&String> = parsed.iter().flat_map(|p| p.hobbies.iter()).collect();
    let topics: BTreeSet<&String> = parsed.iter().flat_map(|p| p.topics.iter()).collect();
    let genders = dummy_categories(parsed.iter().map(|p| p.gender));
    let years = dummy_categories(parsed.iter().map(|p| p.year));

    let mut columns = Vec::with_capacity(hobbies.len() + topics.len() + genders.len() + years.len());
    let mut push = |kind: FeatureKind, value: &str| {
        columns.push(FeatureColumn {
            kind,
            value: value.to_string(),
        })
    };
    hobbies.iter().for_each(|v| push(FeatureKind::Hobby, v.as_str()));
    topics.iter().for_each(|v| push(FeatureKind::Topic, v.as_str()));
    genders.iter().for_each(|v| push(FeatureKind::Gender, v.as_str()));
    years.iter().for_each(|v| push(FeatureKind::Year, v.as_str()));

    let schema = FeatureSchema { columns };

    let rows = parsed
        .iter()
        .map(|p| {
            let values = schema
                .columns
                .iter()
                .map(|col| {
                    let hit = match col.kind {
                        FeatureKind::Hobby => p.hobbies.contains(&col.value),
                        FeatureKind::Topic => p.topics.contains(&col.value),
                        FeatureKind::Gender => p.gender == Some(col.value.as_str()),
                        FeatureKind::Year => p.year == Some(col.value.as_str()),
                    };
                    if hit {
                        1.0
                    } else {
                        0.0
                    }
                })
                .collect();
            EncodedRow {
                email: p.email.to_string(),
                values,
            }
        })
        .collect();

    tracing::debug!(
        "Encoded {} respondents into {} feature columns",
        parsed.len(),
        schema.len()
    );

    Ok(EncodedBatch { schema, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &str, hobbies: &str, topics: &str, gender: &str, year: &str) -> RespondentRecord {
        RespondentRecord::new(email, hobbies, topics)
            .with_gender(gender)
            .with_year(year)
    }

    #[test]
    fn test_split_tags_trims_and_drops_empty() {
        let tags = split_tags(" chess , hiking,,  ");
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["chess", "hiking"]);
        assert!(split_tags("").is_empty());
    }

    #[test]
    fn test_schema_layout() {
        let batch = encode(&[
            record("a@x", "hiking, chess", "ai", "f", "2"),
            record("b@x", "chess", "music, ai", "m", "1"),
            record("c@x", "", "", "m", "3"),
        ])
        .unwrap();

        assert_eq!(
            batch.schema.names(),
            vec![
                "hobby:chess",
                "hobby:hiking",
                "topic:ai",
                "topic:music",
                "gender:m",
                "year:2",
                "year:3",
            ]
        );
        assert_eq!(batch.rows[0].values, vec![1.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(batch.rows[1].values, vec![1.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0]);
        assert_eq!(batch.rows[2].values, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_same_word_as_hobby_and_topic() {
        let batch = encode(&[record("a@x", "music", "music", "f", "1")]).unwrap();
        assert_eq!(batch.schema.names(), vec!["hobby:music", "topic:music"]);
        assert_eq!(batch.rows[0].values, vec![1.0, 1.0]);
    }

    #[test]
    fn test_single_category_produces_no_dummy() {
        let batch = encode(&[
            record("a@x", "chess", "ai", "f", "1"),
            record("b@x", "go", "ai", "f", "1"),
        ])
        .unwrap();
        assert!(batch.schema.indices_of(FeatureKind::Gender).is_empty());
        assert!(batch.schema.indices_of(FeatureKind::Year).is_empty());
    }

    #[test]
    fn test_missing_nominal_contributes_no_flag() {
        let batch = encode(&[
            record("a@x", "chess", "ai", "f", "1"),
            RespondentRecord::new("b@x", "chess", "ai"),
            record("c@x", "chess", "ai", "m", "1"),
        ])
        .unwrap();
        assert_eq!(batch.subspace(FeatureKind::Gender), vec![vec![0.0], vec![0.0], vec![1.0]]);
    }

    #[test]
    fn test_missing_topics_is_validation_error() {
        let mut bad = RespondentRecord::new("b@x", "chess", "");
        bad.topics = None;
        let err = encode(&[record("a@x", "chess", "ai", "f", "1"), bad]).unwrap_err();
        match err {
            GroupingError::Validation { email, reason } => {
                assert_eq!(email, "b@x");
                assert!(reason.contains("topics"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let err = encode(&[
            record("a@x", "chess", "ai", "f", "1"),
            record("a@x", "go", "ai", "f", "1"),
        ])
        .unwrap_err();
        assert!(matches!(err, GroupingError::Validation { .. }));
    }

    #[test]
    fn test_email_with_member_separator_rejected() {
        let err = encode(&[
            record("a@x", "chess", "ai", "f", "1"),
            record("smith,john@x", "go", "ai", "f", "1"),
        ])
        .unwrap_err();
        match err {
            GroupingError::Validation { email, reason } => {
                assert_eq!(email, "smith,john@x");
                assert!(reason.contains("member separator"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_email_with_surrounding_whitespace_rejected() {
        let err = encode(&[record(" a@x ", "chess", "ai", "f", "1")]).unwrap_err();
        assert!(matches!(
            err,
            GroupingError::Validation { ref email, .. } if email == " a@x "
        ));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let records = vec![
            record("a@x", "z, y, x", "b, a", "f", "1"),
            record("b@x", "y", "c", "m", "2"),
        ];
        let first = encode(&records).unwrap();
        let second = encode(&records).unwrap();
        assert_eq!(first.schema, second.schema);
        assert_eq!(first.rows, second.rows);
    }
}
