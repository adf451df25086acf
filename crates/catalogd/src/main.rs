// # catalogd - Catalog Daemon
//
// The catalogd daemon is a thin integration layer over catalog-core. It is
// responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering sources and stores, then building them from configuration
// 4. Serving the HTTP surface until SIGTERM/SIGINT
//
// Catalog rules (conflict policy, provenance, validation) live in catalog-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### External Source
// - `CATALOG_SOURCE_TYPE`: Type of external source (swapi)
// - `CATALOG_SOURCE_URL`: Feed base URL (default https://swapi.tech/api)
// - `CATALOG_SOURCE_TIMEOUT_SECS`: Per-request timeout, 1-300 (default: none)
//
// ### Record Store
// - `CATALOG_STORE_TYPE`: Type of record store (memory, file)
// - `CATALOG_STORE_PATH`: Path to catalog file (for file store)
//
// ### HTTP
// - `CATALOG_HOST`: Bind address (default 0.0.0.0)
// - `CATALOG_PORT`: Bind port (default 3000)
//
// ### Logging
// - `CATALOG_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export CATALOG_STORE_TYPE=file
// export CATALOG_STORE_PATH=/var/lib/catalog/films.json
// export CATALOG_SOURCE_TIMEOUT_SECS=10
//
// catalogd
// ```

mod access;
mod routes;

use anyhow::Result;
use catalog_core::config::DEFAULT_SWAPI_BASE_URL;
use catalog_core::{
    CatalogConfig, CatalogService, ComponentRegistry, ExternalSource, RecordStore, SourceConfig,
    StoreConfig, SyncConfig, SyncEngine, SyncEvent,
};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<CatalogExitCode> for ExitCode {
    fn from(code: CatalogExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
struct Config {
    source_type: String,
    source_url: String,
    source_timeout_secs: Option<u64>,
    store_type: String,
    store_path: Option<String>,
    host: String,
    port: u16,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, treating blank values as unset
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let source_timeout_secs = match var("CATALOG_SOURCE_TIMEOUT_SECS") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|_| {
                anyhow::anyhow!(
                    "CATALOG_SOURCE_TIMEOUT_SECS must be a whole number of seconds. Got: {}",
                    raw
                )
            })?),
            None => None,
        };

        let port = match var("CATALOG_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("CATALOG_PORT must be a valid port number. Got: {}", raw))?,
            None => 3000,
        };

        Ok(Self {
            source_type: var("CATALOG_SOURCE_TYPE").unwrap_or_else(|| "swapi".to_string()),
            source_url: var("CATALOG_SOURCE_URL")
                .unwrap_or_else(|| DEFAULT_SWAPI_BASE_URL.to_string()),
            source_timeout_secs,
            store_type: var("CATALOG_STORE_TYPE").unwrap_or_else(|| "memory".to_string()),
            store_path: var("CATALOG_STORE_PATH"),
            host: var("CATALOG_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_level: var("CATALOG_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.source_type.as_str() {
            "swapi" => {}
            _ => anyhow::bail!(
                "CATALOG_SOURCE_TYPE '{}' is not supported. Supported types: swapi",
                self.source_type
            ),
        }

        if !self.source_url.starts_with("https://") && !self.source_url.starts_with("http://") {
            anyhow::bail!(
                "CATALOG_SOURCE_URL must use HTTP or HTTPS scheme. Got: {}",
                self.source_url
            );
        }

        if let Some(timeout) = self.source_timeout_secs
            && !(1..=300).contains(&timeout)
        {
            anyhow::bail!(
                "CATALOG_SOURCE_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                timeout
            );
        }

        match self.store_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "CATALOG_STORE_TYPE '{}' is not supported. Supported types: file, memory",
                self.store_type
            ),
        }

        if self.store_type == "file" && self.store_path.is_none() {
            anyhow::bail!(
                "CATALOG_STORE_PATH is required when CATALOG_STORE_TYPE=file. \
                Set it via: export CATALOG_STORE_PATH=/var/lib/catalog/films.json"
            );
        }

        if self.port == 0 {
            anyhow::bail!("CATALOG_PORT must be between 1 and 65535");
        }

        self.log_level()?;
        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        Ok(match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => anyhow::bail!(
                "CATALOG_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        })
    }

    /// Library configuration built from the validated environment
    fn catalog_config(&self) -> CatalogConfig {
        let source = SourceConfig::Swapi {
            base_url: self.source_url.clone(),
            timeout_secs: self.source_timeout_secs,
        };
        let store = match (self.store_type.as_str(), &self.store_path) {
            ("file", Some(path)) => StoreConfig::File { path: path.clone() },
            _ => StoreConfig::Memory,
        };

        CatalogConfig {
            source,
            store,
            sync: SyncConfig::default(),
        }
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return CatalogExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return CatalogExitCode::ConfigError.into();
    }

    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CatalogExitCode::ConfigError.into();
    }

    info!("Starting catalogd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CatalogExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            CatalogExitCode::RuntimeError
        } else {
            CatalogExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let registry = ComponentRegistry::with_builtin_stores();

    #[cfg(feature = "swapi")]
    {
        info!("Registering SWAPI source");
        catalog_source_swapi::register(&registry);
    }
    info!(
        "Registered sources: {:?}, stores: {:?}",
        registry.list_sources(),
        registry.list_stores()
    );

    let catalog_config = config.catalog_config();
    catalog_config.validate()?;

    info!("Source type: {}", catalog_config.source.type_name());
    info!("Store type: {}", catalog_config.store.type_name());

    let source: Arc<dyn ExternalSource> = Arc::from(registry.create_source(&catalog_config.source)?);
    let store: Arc<dyn RecordStore> = Arc::from(registry.create_store(&catalog_config.store).await?);

    let (engine, events) = SyncEngine::new(source.clone(), store.clone(), catalog_config.sync)?;
    tokio::spawn(log_events(events));

    let app = routes::router(routes::AppState {
        engine: Arc::new(engine),
        service: CatalogService::new(store.clone()),
        source,
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.flush().await?;
    info!("Store flushed, daemon stopped");
    Ok(())
}

/// Forward sync events to the log
async fn log_events(mut events: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SyncEvent::Started { total } => info!("sync started: {} films", total),
            SyncEvent::RecordCreated { uid, id } => debug!("sync created {} as {}", uid, id),
            SyncEvent::RecordUpdated { uid, id } => debug!("sync updated {} ({})", uid, id),
            SyncEvent::RecordSkipped { uid, reason } => debug!("sync skipped {}: {}", uid, reason),
            SyncEvent::RecordFailed { uid, error } => warn!("sync failed for {}: {}", uid, error),
            SyncEvent::Finished { success, failed } => {
                info!("sync finished: {} ok, {} failed", success, failed)
            }
            SyncEvent::Aborted { error } => error!("sync aborted: {}", error),
        }
    }
}

async fn shutdown_signal() {
    match wait_for_shutdown().await {
        Ok(signal) => info!("Received shutdown signal: {}", signal),
        Err(e) => {
            error!("Signal handling unavailable ({}), falling back to Ctrl-C", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to wait for Ctrl-C: {}", e);
            }
        }
    }
    info!("Shutting down daemon");
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for SIGINT
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.source_url, "https://swapi.tech/api");
        assert_eq!(config.source_timeout_secs, None);
        assert_eq!(config.port, 3000);
        assert!(matches!(config.catalog_config().store, StoreConfig::Memory));
    }

    #[test]
    fn test_file_store_requires_path() {
        let config = config_from(&[("CATALOG_STORE_TYPE", "file")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[
            ("CATALOG_STORE_TYPE", "file"),
            ("CATALOG_STORE_PATH", "/tmp/films.json"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.catalog_config().store,
            StoreConfig::File { ref path } if path == "/tmp/films.json"
        ));
    }

    #[test]
    fn test_timeout_range() {
        let config = config_from(&[("CATALOG_SOURCE_TIMEOUT_SECS", "0")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("CATALOG_SOURCE_TIMEOUT_SECS", "301")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("CATALOG_SOURCE_TIMEOUT_SECS", "30")]).unwrap();
        assert!(config.validate().is_ok());

        assert!(config_from(&[("CATALOG_SOURCE_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_rejects_unknown_types() {
        let config = config_from(&[("CATALOG_SOURCE_TYPE", "imdb")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("CATALOG_STORE_TYPE", "mongo")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("CATALOG_LOG_LEVEL", "loud")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_port_and_url() {
        assert!(config_from(&[("CATALOG_PORT", "70000")]).is_err());

        let config = config_from(&[("CATALOG_SOURCE_URL", "swapi.tech/api")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CatalogExitCode::CleanShutdown as u8, 0);
        assert_eq!(CatalogExitCode::ConfigError as u8, 1);
        assert_eq!(CatalogExitCode::RuntimeError as u8, 2);
    }
}
