//! Per-session bookkeeping of which topic traces the bubble chart shows.
//!
//! The state is an explicit value: transitions take the current state and
//! return the next one, so two sessions never share anything. A model change
//! and a legend toggle are separate event variants with separate transitions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DashboardError, Result};

/// Legend state of one trace. Muted traces stay listed in the legend but are
/// not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceVisibility {
    Visible,
    Muted,
}

impl TraceVisibility {
    /// Only the first topic is drawn when a model is (re)loaded.
    pub fn initial_for(topic_index: usize) -> Self {
        if topic_index == 0 {
            TraceVisibility::Visible
        } else {
            TraceVisibility::Muted
        }
    }

    pub fn is_visible(self) -> bool {
        self == TraceVisibility::Visible
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendToggle {
    pub topic_index: usize,
    pub visibility: TraceVisibility,
}

impl LegendToggle {
    pub fn new(topic_index: usize, visibility: TraceVisibility) -> Self {
        LegendToggle { topic_index, visibility }
    }

    /// Decodes a chart restyle event of the form
    /// `[{"visible": [true, "legendonly"]}, [2, 5]]`. A scalar `visible`
    /// applies to every listed trace.
    pub fn batch_from_restyle(event: &Value) -> Result<Vec<LegendToggle>> {
        let invalid = |msg: &str| DashboardError::InvalidEvent(format!("restyle event {event}: {msg}"));

        let parts = event.as_array().ok_or_else(|| invalid("expected a two-element array"))?;
        let [update, indices] = parts.as_slice() else {
            return Err(invalid("expected a two-element array"));
        };
        let visible = update
            .get("visible")
            .ok_or_else(|| invalid("no `visible` update"))?;
        let indices = indices
            .as_array()
            .ok_or_else(|| invalid("trace indices must be an array"))?;

        indices
            .iter()
            .enumerate()
            .map(|(i, index)| {
                let topic_index = index
                    .as_u64()
                    .ok_or_else(|| invalid("trace index is not a non-negative integer"))?
                    as usize;
                let flag = match visible {
                    Value::Array(flags) => flags.get(i).ok_or_else(|| invalid("fewer flags than traces"))?,
                    scalar => scalar,
                };
                // Anything but `true` ("legendonly", false) leaves the trace muted.
                let visibility = if flag.as_bool() == Some(true) {
                    TraceVisibility::Visible
                } else {
                    TraceVisibility::Muted
                };
                Ok(LegendToggle { topic_index, visibility })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisibilityEvent {
    ModelChanged { num_topics: usize },
    LegendToggled(Vec<LegendToggle>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityState {
    num_topics: usize,
    entries: Vec<TraceVisibility>,
}

impl VisibilityState {
    pub fn new(num_topics: usize) -> Self {
        VisibilityState {
            num_topics,
            entries: (0..num_topics).map(TraceVisibility::initial_for).collect(),
        }
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn get(&self, topic_index: usize) -> Option<TraceVisibility> {
        self.entries.get(topic_index).copied()
    }

    pub fn entries(&self) -> &[TraceVisibility] {
        &self.entries
    }

    /// Discards the current state; nothing carries over to the new model.
    pub fn on_model_change(self, num_topics: usize) -> Self {
        VisibilityState::new(num_topics)
    }

    /// Applies a batch of toggles as one step. If any index is out of range
    /// the whole batch is rejected and `self` is left as it was.
    pub fn on_legend_toggle(&self, toggles: &[LegendToggle]) -> Result<Self> {
        if let Some(bad) = toggles.iter().find(|t| t.topic_index >= self.num_topics) {
            return Err(DashboardError::UnknownTopic {
                topic_index: bad.topic_index,
                num_topics: self.num_topics,
            });
        }
        let mut next = self.clone();
        for toggle in toggles {
            next.entries[toggle.topic_index] = toggle.visibility;
        }
        Ok(next)
    }

    pub fn apply(self, event: VisibilityEvent) -> Result<Self> {
        match event {
            VisibilityEvent::ModelChanged { num_topics } => Ok(self.on_model_change(num_topics)),
            VisibilityEvent::LegendToggled(toggles) => self.on_legend_toggle(&toggles),
        }
    }

    /// 0-based indices of the drawn topics; the topic table highlights the
    /// rows numbered `index + 1`.
    pub fn visible_topic_indices(&self) -> BTreeSet<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_visible())
            .map(|(i, _)| i)
            .collect()
    }
}
