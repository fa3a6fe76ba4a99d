//! One user's dashboard session: the selected model and filters, the legend
//! state, and a small line-based command language that drives them.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::aggregate::{AggregationEngine, SourceFilter, ViewPayload, YearRange};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};
use crate::store::DatasetStore;
use crate::table::TopicTable;
use crate::visibility::{LegendToggle, TraceVisibility, VisibilityState};

static COMMAND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([a-z]+)\s*(.*?)\s*$").expect("command pattern"));
static YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})\s*(?:-|\s)\s*(\d{4})$").expect("years pattern"));
static TOGGLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)=(on|off|visible|muted)$").expect("toggle pattern"));

/// Values the selection controls are populated from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Domains {
    pub model_sizes: Vec<usize>,
    pub sources: BTreeSet<String>,
    pub years: Vec<i32>,
}

impl Domains {
    pub fn from_store(store: &DatasetStore) -> Self {
        Domains {
            model_sizes: store.all_model_sizes(),
            sources: store.all_sources(),
            years: store.all_years(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub num_topics: usize,
    pub sources: SourceFilter,
    pub years: YearRange,
    pub visible_topic_indices: BTreeSet<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Model(usize),
    Sources(SourceFilter),
    Years(YearRange),
    /// Legend clicks, topics numbered as in the legend (from 1).
    Toggle(Vec<LegendToggle>),
    /// Raw chart restyle event, traces numbered from 0.
    Restyle(Value),
    View,
    Table,
    State,
    Domains,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let invalid = |msg: String| DashboardError::InvalidEvent(msg);
        let caps = COMMAND_RE
            .captures(line)
            .ok_or_else(|| invalid(format!("unrecognised command: {line:?}")))?;
        let (verb, rest) = (&caps[1], caps.get(2).map_or("", |m| m.as_str()));

        match verb {
            "model" => rest
                .parse()
                .map(SessionCommand::Model)
                .map_err(|_| invalid(format!("model expects a topic count, got {rest:?}"))),
            "sources" => Ok(SessionCommand::Sources(match rest {
                "all" => SourceFilter::All,
                "none" | "" => SourceFilter::Only(BTreeSet::new()),
                names => SourceFilter::only(names.split('|').map(str::trim).filter(|s| !s.is_empty())),
            })),
            "years" => {
                let caps = YEARS_RE
                    .captures(rest)
                    .ok_or_else(|| invalid(format!("years expects two years, got {rest:?}")))?;
                let from: i32 = caps[1].parse().map_err(|_| invalid(format!("bad year {:?}", &caps[1])))?;
                let to: i32 = caps[2].parse().map_err(|_| invalid(format!("bad year {:?}", &caps[2])))?;
                Ok(SessionCommand::Years(YearRange::new(from, to)))
            }
            "toggle" => parse_toggles(rest).map(SessionCommand::Toggle),
            "restyle" => serde_json::from_str(rest)
                .map(SessionCommand::Restyle)
                .map_err(|e| invalid(format!("restyle payload is not JSON: {e}"))),
            "view" => Ok(SessionCommand::View),
            "table" => Ok(SessionCommand::Table),
            "state" => Ok(SessionCommand::State),
            "domains" => Ok(SessionCommand::Domains),
            other => Err(invalid(format!("unknown command {other:?}"))),
        }
    }
}

fn parse_toggles(rest: &str) -> Result<Vec<LegendToggle>> {
    if rest.is_empty() {
        return Err(DashboardError::InvalidEvent("toggle expects at least one N=on|off".to_string()));
    }
    rest.split_whitespace()
        .map(|token| {
            let caps = TOGGLE_RE
                .captures(token)
                .ok_or_else(|| DashboardError::InvalidEvent(format!("bad toggle {token:?}, expected N=on|off")))?;
            let topic: usize = caps[1]
                .parse()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(|| DashboardError::InvalidEvent(format!("topics are numbered from 1, got {token:?}")))?;
            let visibility = match &caps[2] {
                "on" | "visible" => TraceVisibility::Visible,
                _ => TraceVisibility::Muted,
            };
            Ok(LegendToggle::new(topic - 1, visibility))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "response", content = "body", rename_all = "snake_case")]
pub enum SessionResponse {
    State(SessionSnapshot),
    View(ViewPayload),
    Table(TopicTable),
    Domains(Domains),
    Error { message: String },
}

pub struct DashboardSession<'a> {
    engine: AggregationEngine<'a>,
    tooltip_words: usize,
    num_topics: usize,
    sources: SourceFilter,
    years: YearRange,
    visibility: VisibilityState,
}

impl<'a> DashboardSession<'a> {
    /// Opens a session on the configured default model. A missing default
    /// model is fatal for the caller.
    pub fn new(store: &'a DatasetStore, config: &DashboardConfig) -> Result<Self> {
        let num_topics = store.load_model(config.default_num_topics)?.num_topics;
        let years = store
            .year_bounds()
            .map(|(min, max)| YearRange::new(min, max))
            .unwrap_or(YearRange::new(i32::MIN, i32::MAX));
        info!(num_topics, ?years, "opened dashboard session");
        Ok(DashboardSession {
            engine: AggregationEngine::new(store, config.bubble.clone()),
            tooltip_words: config.tooltip_words,
            num_topics,
            sources: SourceFilter::All,
            years,
            visibility: VisibilityState::new(num_topics),
        })
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    /// Switches model and resets the legend. An unknown size leaves the
    /// session untouched.
    pub fn select_model(&mut self, num_topics: usize) -> Result<()> {
        self.engine.store().load_model(num_topics)?;
        self.num_topics = num_topics;
        self.visibility = self.visibility.clone().on_model_change(num_topics);
        debug!(num_topics, "model selected");
        Ok(())
    }

    pub fn set_sources(&mut self, sources: SourceFilter) {
        self.sources = sources;
    }

    pub fn set_years(&mut self, years: YearRange) {
        self.years = years;
    }

    pub fn toggle_legend(&mut self, toggles: &[LegendToggle]) -> Result<()> {
        self.visibility = self.visibility.on_legend_toggle(toggles)?;
        debug!(visible = ?self.visibility.visible_topic_indices(), "legend toggled");
        Ok(())
    }

    pub fn view(&self) -> Result<ViewPayload> {
        self.engine.compute_view(self.num_topics, &self.sources, self.years)
    }

    pub fn topic_table(&self) -> Result<TopicTable> {
        let model = self.engine.store().load_model(self.num_topics)?;
        Ok(TopicTable::build(model, &self.visibility.visible_topic_indices(), self.tooltip_words))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            num_topics: self.num_topics,
            sources: self.sources.clone(),
            years: self.years,
            visible_topic_indices: self.visibility.visible_topic_indices(),
        }
    }

    pub fn handle(&mut self, command: SessionCommand) -> Result<SessionResponse> {
        match command {
            SessionCommand::Model(num_topics) => self.select_model(num_topics)?,
            SessionCommand::Sources(sources) => self.set_sources(sources),
            SessionCommand::Years(years) => self.set_years(years),
            SessionCommand::Toggle(toggles) => self.toggle_legend(&toggles)?,
            SessionCommand::Restyle(event) => self.toggle_legend(&LegendToggle::batch_from_restyle(&event)?)?,
            SessionCommand::View => return self.view().map(SessionResponse::View),
            SessionCommand::Table => return self.topic_table().map(SessionResponse::Table),
            SessionCommand::Domains => return Ok(SessionResponse::Domains(Domains::from_store(self.engine.store()))),
            SessionCommand::State => {}
        }
        Ok(SessionResponse::State(self.snapshot()))
    }
}
