use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
///
/// Logs go to stderr; stdout carries the filtered records.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "debounced_search=debug,dsearch=debug"
    } else {
        "debounced_search=info,dsearch=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
