use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopWord {
    pub word: String,
    pub importance: f64,
    pub doc_count: u64,        // Tweets in the topic containing the word
    pub occurrence_count: u64, // Topics sharing the word in their top ten
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub index: usize,
    pub label: String,
    pub top_words: Vec<TopWord>, // Importance descending, at most ten
}

impl Topic {
    /// 1-based number shown to users.
    pub fn display_number(&self) -> usize {
        self.index + 1
    }

    pub fn top_word_list(&self, num_words: usize) -> String {
        self.top_words
            .iter()
            .take(num_words)
            .map(|w| w.word.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TweetRecord {
    pub id: Option<String>,
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub source_username: String,
    pub source_display_name: String,
    pub dominant_topic: usize,
}

impl TweetRecord {
    pub fn new(
        id: Option<String>,
        raw_date: &str,
        source_username: String,
        source_display_name: String,
        dominant_topic: usize,
    ) -> Self {
        let date = parse_tweet_date(raw_date);
        TweetRecord {
            id,
            date,
            year: date.map(|d| d.year()),
            source_username,
            source_display_name,
            dominant_topic,
        }
    }
}

/// One clustering run over the tweet corpus. Tweets are re-clustered for every
/// model, so each model owns its own assignments.
#[derive(Debug, Clone)]
pub struct TopicModel {
    pub num_topics: usize,
    pub topics: Vec<Topic>,
    pub tweets: Vec<TweetRecord>,
}

impl TopicModel {
    pub fn topic(&self, index: usize) -> Option<&Topic> {
        self.topics.get(index)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.topics.iter().map(|t| t.label.as_str()).collect()
    }
}

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Lenient ISO-8601 parsing. Anything unparsable becomes `None` and the tweet
/// drops out of year-based aggregates.
pub fn parse_tweet_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}
