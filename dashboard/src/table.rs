use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::TopicModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicRow {
    pub topic: usize, // 1-based
    pub description: String,
    pub tooltip: String,
}

/// Topic descriptions for the active model plus the rows to highlight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicTable {
    pub rows: Vec<TopicRow>,
    pub highlighted: Vec<usize>,
}

impl TopicTable {
    pub fn build(model: &TopicModel, visible: &BTreeSet<usize>, tooltip_words: usize) -> Self {
        let rows: Vec<TopicRow> = model
            .topics
            .iter()
            .map(|topic| TopicRow {
                topic: topic.display_number(),
                description: topic.label.clone(),
                tooltip: format!("Top {tooltip_words} words: {}", topic.top_word_list(tooltip_words)),
            })
            .collect();
        let highlighted = rows
            .iter()
            .filter(|row| visible.contains(&(row.topic - 1)))
            .map(|row| row.topic)
            .collect();
        TopicTable { rows, highlighted }
    }

    pub fn is_highlighted(&self, topic: usize) -> bool {
        self.highlighted.contains(&topic)
    }
}
