use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. Polars and the HTTP client stack are
/// chatty at `info` during Parquet scans and Yahoo fetches.
pub const DEFAULT_FILTER: &str = "info,polars=warn,hyper=warn,reqwest=warn";

/// Where log lines go besides stdout.
#[derive(Debug, Clone, PartialEq)]
pub struct LokiTarget {
    pub url: url::Url,
    pub service_name: String,
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub filter: String,
    pub loki: Option<LokiTarget>,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `LOKI_ENABLED=true` requires a
    /// parsable `LOKI_URL`.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let filter = get("RUST_LOG")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let loki_enabled = get("LOKI_ENABLED")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let loki = if loki_enabled {
            let raw = get("LOKI_URL").ok_or("LOKI_ENABLED is true but LOKI_URL is not set")?;
            let url = url::Url::parse(&raw).map_err(|e| format!("invalid LOKI_URL {}: {}", raw, e))?;
            Some(LokiTarget {
                url,
                service_name: get("SERVICE_NAME").unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string()),
                environment: get("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            })
        } else {
            None
        };

        Ok(Self { filter, loki })
    }
}

/// Installs the global subscriber. Must run inside a Tokio runtime when Loki
/// shipping is enabled.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.filter)?)
        .with(tracing_subscriber::fmt::layer());

    match config.loki {
        #[cfg(feature = "loki")]
        Some(target) => {
            let (loki_layer, task) = tracing_loki::builder()
                .label("service", &target.service_name)?
                .label("environment", &target.environment)?
                .build_url(target.url.clone())?;
            tokio::spawn(task);
            registry.with(loki_layer).init();
            tracing::info!("📊 Logging to console and Loki at {}", target.url);
        }
        #[cfg(not(feature = "loki"))]
        Some(target) => {
            registry.init();
            tracing::warn!(
                "LOKI_ENABLED is set but this build has no `loki` feature, not shipping to {}",
                target.url
            );
        }
        None => {
            registry.init();
            tracing::info!("📊 Logging to console ({})", config.filter);
        }
    }

    Ok(())
}
