use tracing_subscriber::EnvFilter;

/// Builds the stderr log filter. A non-empty `RUST_LOG` replaces the default
/// level outright; `verbose` only picks the default (`debug` over `info`).
/// An unparsable `RUST_LOG` falls back to the default.
pub fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let default_level = if verbose { "debug" } else { "info" };
    rust_log
        .map(str::trim)
        .filter(|directives| !directives.is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default_level))
}
