use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a global fmt subscriber. `RUST_LOG` overrides `default_filter`.
///
/// Returns false when a subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}
