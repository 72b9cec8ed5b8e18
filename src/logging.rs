use tracing_subscriber::{fmt, EnvFilter};

use crate::config;

/// Installs the global subscriber. `RUST_LOG` wins over the configured
/// filter; calling this twice is harmless.
pub fn init(cfg: &config::Logging) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if cfg.json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
