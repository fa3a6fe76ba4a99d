use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DashboardError, Result};

/// Sizing of the per-topic word bubbles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BubbleConfig {
    pub words_per_topic: usize,
    /// Radius the most frequent word in a request is drawn with.
    pub reference_radius: f64,
    pub min_radius: f64,
}

impl Default for BubbleConfig {
    fn default() -> Self {
        BubbleConfig {
            words_per_topic: 5,
            reference_radius: 40.0,
            min_radius: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    pub data_dir: PathBuf,
    pub assignments_file: String,
    pub topic_words_file: String,
    pub topic_names_file: String,
    pub default_num_topics: usize,
    pub tooltip_words: usize,
    pub bubble: BubbleConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_dir: PathBuf::from("data"),
            assignments_file: "sttm_all_topics.csv".to_string(),
            topic_words_file: "topic_words.json".to_string(),
            topic_names_file: "topic_names.json".to_string(),
            default_num_topics: 10,
            tooltip_words: 5,
            bubble: BubbleConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Reads a JSON config file. Missing keys fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: DashboardConfig =
            serde_json::from_str(&raw).map_err(|e| DashboardError::InvalidArtifact {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!(path = %path.display(), "loaded dashboard config");
        Ok(config)
    }

    pub fn assignments_path(&self) -> PathBuf {
        self.data_dir.join(&self.assignments_file)
    }

    pub fn topic_words_path(&self) -> PathBuf {
        self.data_dir.join(&self.topic_words_file)
    }

    pub fn topic_names_path(&self) -> PathBuf {
        self.data_dir.join(&self.topic_names_file)
    }
}
