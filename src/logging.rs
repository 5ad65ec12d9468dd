use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Default filter for the `pm` binary when `RUST_LOG` is unset. HTTP and SQL
/// internals stay at `warn` so crawl progress is readable.
pub const DEFAULT_FILTER: &str = "info,pocket_meta=info,sqlx=warn,reqwest=warn,hyper=warn";

/// Sets up the global tracing subscriber with a fmt formatter and env filter.
///
/// The caller provides a fallback filter string that is used when `RUST_LOG` is
/// not set. Calling it twice returns an error instead of panicking, which keeps
/// integration tests that share a process happy.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
