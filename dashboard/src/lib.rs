pub mod aggregate;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod report;
pub mod session;
pub mod store;
pub mod table;
pub mod visibility;

pub use aggregate::{AggregationEngine, SourceFilter, ViewPayload, YearRange};
pub use config::{BubbleConfig, DashboardConfig};
pub use error::{DashboardError, Result};
pub use session::{DashboardSession, SessionCommand, SessionResponse};
pub use store::DatasetStore;
pub use visibility::{LegendToggle, TraceVisibility, VisibilityEvent, VisibilityState};
