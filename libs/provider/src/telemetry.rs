use std::env;
use std::sync::OnceLock;

use tracing_subscriber::layer::Layer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: OnceLock<()> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub service_name: String,
    pub json_logs: bool,
    pub default_filter: String,
}

impl LogConfig {
    pub fn from_env(default_service_name: &str) -> Self {
        let service_name = env::var("AWSTEAM_SERVICE_NAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_service_name.to_string());
        let json_logs = env::var("LOG_FORMAT")
            .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
            .unwrap_or(false);
        Self {
            service_name,
            json_logs,
            default_filter: "info".into(),
        }
    }
}

/// Installs the global subscriber. Output goes to stderr; `RUST_LOG`
/// overrides the default filter. Returns `false` when a subscriber was
/// already installed.
pub fn install(cfg: &LogConfig) -> bool {
    if INIT.get().is_some() {
        return false;
    }

    let fmt_layer = if cfg.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.default_filter.as_str()));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();
    INIT.set(()).ok();
    if installed {
        tracing::info!(service = %cfg.service_name, json = cfg.json_logs, "logging initialised");
    }
    installed
}
