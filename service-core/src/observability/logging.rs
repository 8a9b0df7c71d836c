use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the JSON tracing subscriber.
///
/// `RUST_LOG` wins over `log_level`. Calling this twice (tests, embedding
/// applications) leaves the first subscriber in place.
pub fn init_tracing(service_name: &str, log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .try_init();

    match installed {
        Ok(()) => tracing::info!(service = service_name, "Tracing initialized"),
        Err(e) => eprintln!(
            "Tracing for '{}' already initialized, keeping existing subscriber: {}",
            service_name, e
        ),
    }
}
