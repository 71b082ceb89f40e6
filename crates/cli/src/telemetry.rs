use profilectl_config::LogSettings;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn parse(format: &str) -> Self {
        if format.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Normalizes a configured level, unknown values fall back to `info`.
pub fn normalize_level(level: &str) -> &'static str {
    match level.to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Sets up the global subscriber. Logs go to stderr, stdout stays for results.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(settings: &LogSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(normalize_level(&settings.level)));

    let base = fmt::layer().with_target(true).with_writer(std::io::stderr);
    let fmt_layer = match LogFormat::parse(&settings.format) {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Text => base.boxed(),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
