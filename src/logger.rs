use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Warnings only, on stderr; stdout carries only program output.
pub fn init_logger() {
    tracing_subscriber::registry()
        .with(EnvFilter::new("deferred_demos=warn"))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
