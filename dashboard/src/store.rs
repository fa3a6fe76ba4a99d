//! Read-only store over the artifacts produced by the topic-modeling pipeline.
//!
//! Three tables are joined on the model size (number of topics): tweet
//! assignments, per-topic word statistics and human-authored topic names.
//! Everything is validated once at load; afterwards the store never changes.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::models::{TopWord, Topic, TopicModel, TweetRecord};

/// Words kept per topic by the upstream pipeline.
pub const MAX_TOP_WORDS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentRow {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: String,
    pub username: String,
    pub name: String,
    pub dominant_topic: usize,
    pub num_topics: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicWordsRow {
    #[serde(alias = "num_clusters")]
    pub num_topics: usize,
    #[serde(alias = "topic_num")]
    pub topic_index: usize,
    pub top_words: Vec<String>,
    pub word_importance: Vec<f64>,
    pub doc_count: Vec<u64>,
    #[serde(alias = "num_topic_occurence")]
    pub occurrence_count: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicNamesRow {
    pub num_topics: usize,
    pub topic_names: BTreeMap<usize, String>,
}

#[derive(Debug)]
pub struct DatasetStore {
    models: BTreeMap<usize, TopicModel>,
}

impl DatasetStore {
    pub fn load(config: &DashboardConfig) -> Result<Self> {
        let assignments = read_assignments(&config.assignments_path())?;
        let words: Vec<TopicWordsRow> = read_json(&config.topic_words_path())?;
        let names: Vec<TopicNamesRow> = read_json(&config.topic_names_path())?;
        info!(
            tweets = assignments.len(),
            topic_rows = words.len(),
            name_rows = names.len(),
            "read topic-model artifacts from {}",
            config.data_dir.display()
        );
        Self::from_tables(assignments, words, names)
    }

    pub fn from_tables(
        assignments: Vec<AssignmentRow>,
        words: Vec<TopicWordsRow>,
        names: Vec<TopicNamesRow>,
    ) -> Result<Self> {
        let assignment_sizes: BTreeSet<usize> = assignments.iter().map(|r| r.num_topics).collect();
        let word_sizes: BTreeSet<usize> = words.iter().map(|r| r.num_topics).collect();
        let name_sizes: BTreeSet<usize> = names.iter().map(|r| r.num_topics).collect();
        check_same_sizes("topic-assignment", &assignment_sizes, "topic-words", &word_sizes)?;
        check_same_sizes("topic-assignment", &assignment_sizes, "topic-names", &name_sizes)?;

        let mut words_by_model: BTreeMap<usize, BTreeMap<usize, TopicWordsRow>> = BTreeMap::new();
        for row in words {
            let per_model = words_by_model.entry(row.num_topics).or_default();
            if per_model.contains_key(&row.topic_index) {
                return Err(DashboardError::SchemaMismatch(format!(
                    "topic {} of the {}-topic model has more than one word entry",
                    row.topic_index, row.num_topics
                )));
            }
            per_model.insert(row.topic_index, row);
        }

        let mut names_by_model: BTreeMap<usize, BTreeMap<usize, String>> = BTreeMap::new();
        for row in names {
            if names_by_model.insert(row.num_topics, row.topic_names).is_some() {
                return Err(DashboardError::SchemaMismatch(format!(
                    "the {}-topic model has more than one topic-names row",
                    row.num_topics
                )));
            }
        }

        let mut tweets_by_model: BTreeMap<usize, Vec<TweetRecord>> = BTreeMap::new();
        for row in assignments {
            if row.dominant_topic >= row.num_topics {
                return Err(DashboardError::SchemaMismatch(format!(
                    "tweet assigned to topic {} in a {}-topic model",
                    row.dominant_topic, row.num_topics
                )));
            }
            let id = row.id.filter(|id| !id.is_empty());
            tweets_by_model.entry(row.num_topics).or_default().push(TweetRecord::new(
                id,
                &row.date,
                row.username,
                row.name,
                row.dominant_topic,
            ));
        }

        let mut models = BTreeMap::new();
        for (num_topics, tweets) in tweets_by_model {
            let word_rows = words_by_model.remove(&num_topics).unwrap_or_default();
            let labels = names_by_model.remove(&num_topics).unwrap_or_default();
            let topics = build_topics(num_topics, word_rows, labels)?;
            let unparsed = tweets.iter().filter(|t| t.year.is_none()).count();
            if unparsed > 0 {
                debug!(num_topics, unparsed, "tweets without a usable date");
            }
            info!(num_topics, tweets = tweets.len(), "loaded topic model");
            models.insert(num_topics, TopicModel { num_topics, topics, tweets });
        }

        Ok(DatasetStore { models })
    }

    /// Every model is loaded up front, so this is a lookup.
    pub fn load_model(&self, num_topics: usize) -> Result<&TopicModel> {
        self.models
            .get(&num_topics)
            .ok_or(DashboardError::DataNotFound { num_topics })
    }

    pub fn all_model_sizes(&self) -> Vec<usize> {
        self.models.keys().copied().collect()
    }

    /// Display names of every news source; these are the values a source
    /// filter selects on.
    pub fn all_sources(&self) -> BTreeSet<String> {
        self.tweets().map(|t| t.source_display_name.clone()).collect()
    }

    pub fn all_usernames(&self) -> BTreeSet<String> {
        self.tweets().map(|t| t.source_username.clone()).collect()
    }

    pub fn all_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.tweets().filter_map(|t| t.year).collect();
        years.into_iter().collect()
    }

    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        let years = self.all_years();
        Some((*years.first()?, *years.last()?))
    }

    fn tweets(&self) -> impl Iterator<Item = &TweetRecord> {
        self.models.values().flat_map(|m| m.tweets.iter())
    }
}

fn check_same_sizes(
    left_name: &str,
    left: &BTreeSet<usize>,
    right_name: &str,
    right: &BTreeSet<usize>,
) -> Result<()> {
    if let Some(size) = left.symmetric_difference(right).next() {
        let (present, missing) = if left.contains(size) {
            (left_name, right_name)
        } else {
            (right_name, left_name)
        };
        return Err(DashboardError::SchemaMismatch(format!(
            "{size}-topic model is in the {present} table but not in the {missing} table"
        )));
    }
    Ok(())
}

fn build_topics(
    num_topics: usize,
    word_rows: BTreeMap<usize, TopicWordsRow>,
    mut labels: BTreeMap<usize, String>,
) -> Result<Vec<Topic>> {
    let word_indices: Vec<usize> = word_rows.keys().copied().collect();
    let label_indices: Vec<usize> = labels.keys().copied().collect();
    let expected: Vec<usize> = (0..num_topics).collect();
    if word_indices != expected {
        return Err(DashboardError::SchemaMismatch(format!(
            "{num_topics}-topic model has word entries for topics {word_indices:?}"
        )));
    }
    if label_indices != expected {
        return Err(DashboardError::SchemaMismatch(format!(
            "{num_topics}-topic model has names for topics {label_indices:?}"
        )));
    }

    word_rows
        .into_values()
        .map(|row| -> Result<Topic> {
            let label = labels.remove(&row.topic_index).unwrap_or_default();
            let index = row.topic_index;
            let top_words = zip_top_words(row)?;
            Ok(Topic { index, label, top_words })
        })
        .collect()
}

fn zip_top_words(row: TopicWordsRow) -> Result<Vec<TopWord>> {
    let len = row.top_words.len();
    if row.word_importance.len() != len || row.doc_count.len() != len || row.occurrence_count.len() != len {
        return Err(DashboardError::SchemaMismatch(format!(
            "topic {} of the {}-topic model has word lists of different lengths",
            row.topic_index, row.num_topics
        )));
    }
    if len > MAX_TOP_WORDS {
        return Err(DashboardError::SchemaMismatch(format!(
            "topic {} of the {}-topic model lists {len} words, at most {MAX_TOP_WORDS} are allowed",
            row.topic_index, row.num_topics
        )));
    }

    let mut words: Vec<TopWord> = row
        .top_words
        .into_iter()
        .zip(row.word_importance)
        .zip(row.doc_count)
        .zip(row.occurrence_count)
        .map(|(((word, importance), doc_count), occurrence_count)| TopWord {
            word,
            importance,
            doc_count,
            occurrence_count,
        })
        .collect();
    // Stable, so ties keep the pipeline's order.
    words.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    Ok(words)
}

fn open_artifact(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| DashboardError::InvalidArtifact {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn read_assignments(path: &Path) -> Result<Vec<AssignmentRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(open_artifact(path)?);
    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: AssignmentRow = result.map_err(|e| DashboardError::InvalidArtifact {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        rows.push(row);
    }
    Ok(rows)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let reader = BufReader::new(open_artifact(path)?);
    serde_json::from_reader(reader).map_err(|e| DashboardError::InvalidArtifact {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(num_topics: usize, topic: usize, date: &str, username: &str) -> AssignmentRow {
        AssignmentRow {
            id: None,
            date: date.to_string(),
            username: username.to_string(),
            name: username.to_uppercase(),
            dominant_topic: topic,
            num_topics,
        }
    }

    fn words(num_topics: usize, topic_index: usize) -> TopicWordsRow {
        TopicWordsRow {
            num_topics,
            topic_index,
            top_words: vec!["flu".into(), "vaccine".into()],
            word_importance: vec![0.02, 0.05],
            doc_count: vec![10, 30],
            occurrence_count: vec![1, 2],
        }
    }

    fn names(num_topics: usize) -> TopicNamesRow {
        TopicNamesRow {
            num_topics,
            topic_names: (0..num_topics).map(|i| (i, format!("Topic name {i}"))).collect(),
        }
    }

    #[test]
    fn builds_models_and_sorts_words_by_importance() {
        let store = DatasetStore::from_tables(
            vec![assignment(2, 1, "2016-01-02", "cnnhealth"), assignment(2, 0, "junk", "nprhealth")],
            vec![words(2, 0), words(2, 1)],
            vec![names(2)],
        )
        .unwrap();

        let model = store.load_model(2).unwrap();
        assert_eq!(model.topics.len(), 2);
        assert_eq!(model.topics[1].label, "Topic name 1");
        assert_eq!(model.topics[0].top_words[0].word, "vaccine");
        assert_eq!(store.all_years(), vec![2016]);
        assert_eq!(store.all_model_sizes(), vec![2]);
        assert!(store.all_sources().contains("NPRHEALTH"));
    }

    #[test]
    fn missing_model_is_data_not_found() {
        let store = DatasetStore::from_tables(
            vec![assignment(2, 0, "2016-01-02", "cnnhealth")],
            vec![words(2, 0), words(2, 1)],
            vec![names(2)],
        )
        .unwrap();
        assert!(matches!(store.load_model(7), Err(DashboardError::DataNotFound { num_topics: 7 })));
    }

    #[test]
    fn model_missing_from_names_table_is_rejected() {
        let err = DatasetStore::from_tables(
            vec![assignment(2, 0, "2016-01-02", "cnnhealth"), assignment(3, 0, "2016-01-02", "cnnhealth")],
            vec![words(2, 0), words(2, 1), words(3, 0), words(3, 1), words(3, 2)],
            vec![names(2)],
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch(_)));
    }

    #[test]
    fn topic_count_disagreement_is_rejected() {
        let err = DatasetStore::from_tables(
            vec![assignment(3, 0, "2016-01-02", "cnnhealth")],
            vec![words(3, 0), words(3, 1)],
            vec![names(3)],
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch(_)));
    }

    #[test]
    fn out_of_range_assignment_is_rejected() {
        let err = DatasetStore::from_tables(
            vec![assignment(2, 2, "2016-01-02", "cnnhealth")],
            vec![words(2, 0), words(2, 1)],
            vec![names(2)],
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch(_)));
    }

    #[test]
    fn ragged_word_lists_are_rejected() {
        let mut ragged = words(1, 0);
        ragged.doc_count.pop();
        let err = DatasetStore::from_tables(
            vec![assignment(1, 0, "2016-01-02", "cnnhealth")],
            vec![ragged],
            vec![names(1)],
        )
        .unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch(_)));
    }
}
