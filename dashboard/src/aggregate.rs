//! Filtered aggregates behind the heatmaps and the word bubble chart.
//!
//! `AggregationEngine::compute_view` is pure: it reads the immutable store and
//! returns a payload, so the same request always serializes to the same bytes.

use std::collections::BTreeSet;
use std::fmt::Display;

use counter::Counter;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BubbleConfig;
use crate::error::{DashboardError, Result};
use crate::models::{Topic, TopicModel, TweetRecord};
use crate::store::DatasetStore;
use crate::visibility::TraceVisibility;

pub const INSUFFICIENT_SELECTION_MESSAGE: &str = "No news sources have been selected for the model analysis. \
     Please select at least one option from the dropdown.";

/// Which news sources (by display name) a view covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "sources")]
pub enum SourceFilter {
    All,
    Only(BTreeSet<String>),
}

impl SourceFilter {
    pub fn only<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SourceFilter::Only(sources.into_iter().map(Into::into).collect())
    }

    pub fn admits(&self, display_name: &str) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Only(sources) => sources.contains(display_name),
        }
    }

    pub fn is_empty_selection(&self) -> bool {
        matches!(self, SourceFilter::Only(sources) if sources.is_empty())
    }
}

/// Inclusive range of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    /// A crossed range (`a > b`) is re-ordered rather than treated as empty.
    pub fn new(a: i32, b: i32) -> Self {
        YearRange { min: a.min(b), max: a.max(b) }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

/// A row-by-topic matrix with zero-filled cells and a parallel grid of hover
/// labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable<R, T> {
    pub rows: Vec<R>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<T>>,
    pub hover_text: Vec<Vec<String>>,
}

impl<R, T> PivotTable<R, T> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<R: PartialEq, T> PivotTable<R, T> {
    pub fn row(&self, key: &R) -> Option<&[T]> {
        let position = self.rows.iter().position(|r| r == key)?;
        Some(&self.cells[position])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubblePoint {
    pub word: String,
    pub doc_count: u64,   // x
    pub importance: f64,  // y
    pub occurrence_count: u64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleSeries {
    pub topic_index: usize,
    pub name: String,
    pub label: String,
    pub visibility: TraceVisibility,
    pub size_ref: f64,
    pub points: Vec<BubblePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleChart {
    pub series: Vec<BubbleSeries>,
}

/// Area-proportional bubble sizing for one topic's trace. The scale divisor
/// is `2 * max_occurrence / reference_radius^2`, which puts the topic's most
/// frequent word exactly at `reference_radius`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleScale {
    pub size_ref: f64,
    pub min_radius: f64,
}

impl BubbleScale {
    pub fn new(max_occurrence: u64, config: &BubbleConfig) -> Self {
        BubbleScale {
            size_ref: 2.0 * max_occurrence as f64 / config.reference_radius.powi(2),
            min_radius: config.min_radius,
        }
    }

    pub fn radius(&self, occurrence_count: u64) -> f64 {
        if self.size_ref <= 0.0 {
            return self.min_radius;
        }
        (2.0 * occurrence_count as f64 / self.size_ref).sqrt().max(self.min_radius)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicView {
    pub num_topics: usize,
    pub sources: SourceFilter,
    pub years: YearRange,
    pub tweet_count: usize,
    pub source_by_topic: PivotTable<String, f64>,
    pub year_by_topic: PivotTable<i32, u64>,
    pub bubbles: BubbleChart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ViewPayload {
    Ready(TopicView),
    InsufficientSelection { num_topics: usize, message: String },
}

impl ViewPayload {
    pub fn view(&self) -> Option<&TopicView> {
        match self {
            ViewPayload::Ready(view) => Some(view),
            ViewPayload::InsufficientSelection { .. } => None,
        }
    }

    pub fn is_insufficient_selection(&self) -> bool {
        matches!(self, ViewPayload::InsufficientSelection { .. })
    }
}

pub struct AggregationEngine<'a> {
    store: &'a DatasetStore,
    bubble: BubbleConfig,
}

impl<'a> AggregationEngine<'a> {
    pub fn new(store: &'a DatasetStore, bubble: BubbleConfig) -> Self {
        AggregationEngine { store, bubble }
    }

    pub fn store(&self) -> &'a DatasetStore {
        self.store
    }

    pub fn compute_view(&self, num_topics: usize, sources: &SourceFilter, years: YearRange) -> Result<ViewPayload> {
        let model = self
            .store
            .load_model(num_topics)
            .map_err(|_| DashboardError::UnknownModel { num_topics })?;

        if sources.is_empty_selection() {
            return Ok(ViewPayload::InsufficientSelection {
                num_topics,
                message: INSUFFICIENT_SELECTION_MESSAGE.to_string(),
            });
        }

        let tweets: Vec<&TweetRecord> = model
            .tweets
            .iter()
            .filter(|t| sources.admits(&t.source_display_name))
            .filter(|t| t.year.is_some_and(|y| years.contains(y)))
            .collect();
        debug!(num_topics, matched = tweets.len(), ?years, "filtered tweets for view");

        Ok(ViewPayload::Ready(TopicView {
            num_topics,
            sources: sources.clone(),
            years,
            tweet_count: tweets.len(),
            source_by_topic: source_by_topic(model, &tweets),
            year_by_topic: year_by_topic(model, &tweets),
            bubbles: bubble_chart(model, &self.bubble),
        }))
    }
}

fn topic_columns(num_topics: usize) -> Vec<String> {
    (1..=num_topics).map(|i| format!("Topic {i}")).collect()
}

/// Shares are fractions in [0, 1]; hover text shows a one-decimal percent.
pub(crate) fn format_share(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}

fn hover_grid<R: Display, T>(
    axis: &str,
    rows: &[R],
    labels: &[&str],
    cells: &[Vec<T>],
    fmt: impl Fn(&T) -> String,
) -> Vec<Vec<String>> {
    rows.iter()
        .zip(cells)
        .map(|(row, values)| {
            labels
                .iter()
                .zip(values)
                .map(|(label, value)| {
                    let value = fmt(value);
                    format!("<b>{axis}:</b> {row}<br /><b>Topic:</b> {label}<br /><b>Value:</b> {value}")
                })
                .collect()
        })
        .collect()
}

/// Share of each source's tweets falling in each topic. Rows are usernames.
fn source_by_topic(model: &TopicModel, tweets: &[&TweetRecord]) -> PivotTable<String, f64> {
    let counts: Counter<(&str, usize)> = tweets
        .iter()
        .map(|t| (t.source_username.as_str(), t.dominant_topic))
        .collect();
    let usernames: BTreeSet<&str> = tweets.iter().map(|t| t.source_username.as_str()).collect();

    let mut rows = Vec::with_capacity(usernames.len());
    let mut cells = Vec::with_capacity(usernames.len());
    for username in usernames {
        let topic_counts: Vec<usize> = (0..model.num_topics)
            .map(|topic| counts.get(&(username, topic)).copied().unwrap_or(0))
            .collect();
        let total: usize = topic_counts.iter().sum();
        cells.push(topic_counts.iter().map(|&c| c as f64 / total as f64).collect());
        rows.push(username.to_string());
    }

    let hover_text = hover_grid("Source", &rows, &model.labels(), &cells, |share| format_share(*share));
    PivotTable { rows, columns: topic_columns(model.num_topics), cells, hover_text }
}

/// Raw tweet counts per year and topic.
fn year_by_topic(model: &TopicModel, tweets: &[&TweetRecord]) -> PivotTable<i32, u64> {
    let counts: Counter<(i32, usize)> = tweets
        .iter()
        .filter_map(|t| Some((t.year?, t.dominant_topic)))
        .collect();
    let rows: Vec<i32> = tweets
        .iter()
        .filter_map(|t| t.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let cells: Vec<Vec<u64>> = rows
        .iter()
        .map(|&year| {
            (0..model.num_topics)
                .map(|topic| counts.get(&(year, topic)).copied().unwrap_or(0) as u64)
                .collect()
        })
        .collect();

    let hover_text = hover_grid("Year", &rows, &model.labels(), &cells, |count| count.to_string());
    PivotTable { rows, columns: topic_columns(model.num_topics), cells, hover_text }
}

/// Word statistics are static per model; source and year filters do not
/// apply here. Each trace is scaled against its own largest word.
fn bubble_chart(model: &TopicModel, config: &BubbleConfig) -> BubbleChart {
    let series = model.topics.iter().map(|topic| bubble_series(topic, config)).collect();
    BubbleChart { series }
}

fn bubble_series(topic: &Topic, config: &BubbleConfig) -> BubbleSeries {
    let words = &topic.top_words[..topic.top_words.len().min(config.words_per_topic)];
    let max_occurrence = words.iter().map(|w| w.occurrence_count).max().unwrap_or(0);
    let scale = BubbleScale::new(max_occurrence, config);

    BubbleSeries {
        topic_index: topic.index,
        name: topic.display_number().to_string(),
        label: topic.label.clone(),
        visibility: TraceVisibility::initial_for(topic.index),
        size_ref: scale.size_ref,
        points: words
            .iter()
            .map(|w| BubblePoint {
                word: w.word.clone(),
                doc_count: w.doc_count,
                importance: w.importance,
                occurrence_count: w.occurrence_count,
                radius: scale.radius(w.occurrence_count),
            })
            .collect(),
    }
}
