use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dashboard::logging::log_filter;
use dashboard::report;
use dashboard::session::Domains;
use dashboard::table::TopicTable;
use dashboard::{
    AggregationEngine, DashboardConfig, DashboardError, DashboardSession, DatasetStore, LegendToggle,
    SessionCommand, SessionResponse, SourceFilter, TraceVisibility, VisibilityState, YearRange,
};

#[derive(Parser, Debug)]
#[command(version, about = "Explore short-text topic models of health news tweets", long_about = None)]
struct Args {
    #[clap(short, long, global = true, help = "JSON config file; flags below override it")]
    config: Option<PathBuf>,
    #[clap(short, long, global = true, help = "Directory holding the topic-model artifacts")]
    data_dir: Option<PathBuf>,
    #[clap(short, long, global = true, help = "Log at debug level unless RUST_LOG says otherwise")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List model sizes, years and news sources available for filtering
    Domains {
        #[clap(long)]
        json: bool,
    },
    /// Heatmap and bubble-chart aggregates for one filter selection
    View {
        #[clap(short = 'k', long, help = "Number of topics (defaults to the configured model)")]
        topics: Option<usize>,
        #[clap(short, long = "source", help = "News source display name; repeat for several. Default: all")]
        sources: Vec<String>,
        #[clap(long, conflicts_with = "sources", help = "Select no news source at all")]
        no_sources: bool,
        #[clap(long)]
        from: Option<i32>,
        #[clap(long)]
        to: Option<i32>,
        #[clap(long)]
        json: bool,
    },
    /// Topic descriptions with the rows for visible topics highlighted
    Topics {
        #[clap(short = 'k', long)]
        topics: Option<usize>,
        #[clap(long, value_delimiter = ',', help = "Visible topics by legend number (default: 1)")]
        visible: Vec<usize>,
        #[clap(long)]
        json: bool,
    },
    /// Read session commands from stdin and answer each with one JSON line
    Session,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            e.downcast_ref::<DashboardError>()
                .map_or(ExitCode::FAILURE, DashboardError::exit_code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<DashboardConfig> {
    let mut config = match &args.config {
        Some(path) => DashboardConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    let store = DatasetStore::load(&config)?;
    // The default model backs the initial dashboard; without it nothing renders.
    store.load_model(config.default_num_topics)?;

    match args.command {
        Command::Domains { json } => {
            let domains = Domains::from_store(&store);
            if json {
                println!("{}", serde_json::to_string_pretty(&domains)?);
            } else {
                report::print_domains(&domains);
            }
        }
        Command::View { topics, sources, no_sources, from, to, json } => {
            let num_topics = topics.unwrap_or(config.default_num_topics);
            let filter = if no_sources {
                SourceFilter::only(Vec::<String>::new())
            } else if sources.is_empty() {
                SourceFilter::All
            } else {
                SourceFilter::only(sources)
            };
            let (min_year, max_year) = store.year_bounds().unwrap_or((i32::MIN, i32::MAX));
            let years = YearRange::new(from.unwrap_or(min_year), to.unwrap_or(max_year));

            let engine = AggregationEngine::new(&store, config.bubble.clone());
            let payload = engine.compute_view(num_topics, &filter, years)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                report::print_payload(&payload);
            }
        }
        Command::Topics { topics, visible, json } => {
            let num_topics = topics.unwrap_or(config.default_num_topics);
            let model = store.load_model(num_topics)?;
            let state = visibility_from_legend_numbers(num_topics, &visible)?;
            let table = TopicTable::build(model, &state.visible_topic_indices(), config.tooltip_words);
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                report::print_topic_table(&table);
            }
        }
        Command::Session => run_session(&store, &config)?,
    }
    Ok(())
}

fn visibility_from_legend_numbers(num_topics: usize, visible: &[usize]) -> dashboard::Result<VisibilityState> {
    let state = VisibilityState::new(num_topics);
    if visible.is_empty() {
        return Ok(state);
    }
    let mut toggles: Vec<LegendToggle> = (0..num_topics)
        .map(|i| LegendToggle::new(i, TraceVisibility::Muted))
        .collect();
    for &number in visible {
        let index = number
            .checked_sub(1)
            .ok_or_else(|| DashboardError::InvalidEvent("topics are numbered from 1".to_string()))?;
        toggles.push(LegendToggle::new(index, TraceVisibility::Visible));
    }
    state.on_legend_toggle(&toggles)
}

fn run_session(store: &DatasetStore, config: &DashboardConfig) -> anyhow::Result<()> {
    let mut session = DashboardSession::new(store, config)?;
    info!("session ready; reading commands from stdin");

    for line in io::stdin().lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if matches!(trimmed, "quit" | "exit") {
            break;
        }

        let response = SessionCommand::parse(trimmed)
            .and_then(|command| session.handle(command))
            .unwrap_or_else(|e| {
                warn!("{e}");
                SessionResponse::Error { message: e.to_string() }
            });
        println!("{}", serde_json::to_string(&response)?);
    }
    Ok(())
}
