use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Console-only logging, used when observability is compiled out or
/// switched off at runtime.
///
/// `LOG_LEVEL` sets the level for this service (default `info`); noisy
/// dependencies stay at `warn`. `RUST_LOG` overrides both.
pub fn init_basic_console_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rejuvenators={level},rejuvenators_core={level},tower_http=warn,hyper=warn,tonic=warn,h2=warn,sqlx=warn",
            level = log_level
        ))
    });

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(env_filter);

    // A global subscriber may already be installed.
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
