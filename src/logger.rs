use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init() -> tracing_appender::non_blocking::WorkerGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("linkpulse=info"));

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_line_number(true)
                .with_writer(non_blocking_writer),
        )
        .with(filter)
        .init();

    // The guard must be held for the lifetime of the process so buffered
    // log lines are flushed on exit.
    guard
}
