// # pfxd - Prefix State Daemon
//
// A thin integration layer around pfx-core:
// 1. Reads configuration from environment variables
// 2. Initializes logging and the runtime
// 3. Registers event sources and builds the configured one
// 4. Runs the prefix engine until the source is exhausted or SIGINT/SIGTERM
// 5. Prints the management snapshot as JSON on stdout
//
// All prefix state logic lives in pfx-core.
//
// ## Configuration
//
// ### Event Source
// - `PFX_EVENTS_PATH`: JSON-lines file of prefix events (required)
//
// ### Store / Engine
// - `PFX_LOG_ADVERTISEMENTS`: log each advertise/withdraw (true/false)
// - `PFX_EVENT_CHANNEL_CAPACITY`: engine event channel capacity
// - `PFX_WARN_ON_CONFLICT`: warn on conflicting forwarding info (true/false)
//
// ### Snapshot
// - `PFX_DUMP`: `routes` (default), `databases` or `none`
// - `PFX_FILTER_PREFIXES`: comma-separated prefixes to include
// - `PFX_FILTER_NODE`: only routes from this node (set but empty matches
//   only an empty node name; unset matches any)
// - `PFX_FILTER_AREA`: only routes from this area (same rule)
//
// ### Logging
// - `PFX_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export PFX_EVENTS_PATH=/var/lib/pfx/events.jsonl
// export PFX_FILTER_NODE=nodeA
// pfxd > routes.json
// ```

use anyhow::{Context, Result};
use pfx_core::{
    ChangedPrefixes, EngineConfig, EventSourceConfig, PfxConfig, Prefix, PrefixEngine,
    PrefixState, ReceivedRouteFilter, RouteComputation, SharedPrefixState, SourceRegistry,
    StoreConfig,
};
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum PfxExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<PfxExitCode> for ExitCode {
    fn from(code: PfxExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What to print once the engine stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DumpMode {
    Routes,
    Databases,
    None,
}

/// Application configuration
struct Config {
    events_path: String,
    log_advertisements: bool,
    event_channel_capacity: Option<usize>,
    warn_on_conflict: bool,
    dump: String,
    filter_prefixes: Vec<String>,
    filter_node: Option<String>,
    filter_area: Option<String>,
    log_level: String,
}

fn env_flag(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(value) => match value.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => anyhow::bail!("{} must be true or false. Got: {}", name, value),
        },
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            events_path: env::var("PFX_EVENTS_PATH").context(
                "PFX_EVENTS_PATH is required. \
                Set it via: export PFX_EVENTS_PATH=/path/to/events.jsonl",
            )?,
            log_advertisements: env_flag("PFX_LOG_ADVERTISEMENTS", true)?,
            event_channel_capacity: env::var("PFX_EVENT_CHANNEL_CAPACITY")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .context("PFX_EVENT_CHANNEL_CAPACITY must be a positive integer")?,
            warn_on_conflict: env_flag("PFX_WARN_ON_CONFLICT", true)?,
            dump: env::var("PFX_DUMP").unwrap_or_else(|_| "routes".to_string()),
            filter_prefixes: env::var("PFX_FILTER_PREFIXES")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            filter_node: env::var("PFX_FILTER_NODE").ok(),
            filter_area: env::var("PFX_FILTER_AREA").ok(),
            log_level: env::var("PFX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.events_path.is_empty() {
            anyhow::bail!("PFX_EVENTS_PATH cannot be empty");
        }

        if !std::path::Path::new(&self.events_path).exists() {
            anyhow::bail!("PFX_EVENTS_PATH does not exist: {}", self.events_path);
        }

        if let Some(capacity) = self.event_channel_capacity
            && !(1..=1_000_000).contains(&capacity)
        {
            anyhow::bail!(
                "PFX_EVENT_CHANNEL_CAPACITY must be between 1 and 1000000. Got: {}",
                capacity
            );
        }

        self.dump_mode()?;
        self.route_filter()?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "PFX_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn dump_mode(&self) -> Result<DumpMode> {
        match self.dump.to_lowercase().as_str() {
            "routes" => Ok(DumpMode::Routes),
            "databases" => Ok(DumpMode::Databases),
            "none" => Ok(DumpMode::None),
            _ => anyhow::bail!(
                "PFX_DUMP '{}' is not valid. Valid modes: routes, databases, none",
                self.dump
            ),
        }
    }

    fn route_filter(&self) -> Result<ReceivedRouteFilter> {
        let mut filter = ReceivedRouteFilter::new();

        if !self.filter_prefixes.is_empty() {
            let prefixes = self
                .filter_prefixes
                .iter()
                .map(|s| s.parse::<Prefix>())
                .collect::<pfx_core::Result<Vec<_>>>()
                .context("PFX_FILTER_PREFIXES contains an invalid prefix")?;
            filter = filter.with_prefixes(prefixes);
        }
        if let Some(node) = &self.filter_node {
            filter = filter.with_node_name(node.clone());
        }
        if let Some(area) = &self.filter_area {
            filter = filter.with_area_name(area.clone());
        }

        Ok(filter)
    }

    fn pfx_config(&self) -> PfxConfig {
        let mut engine = EngineConfig {
            warn_on_conflict: self.warn_on_conflict,
            ..EngineConfig::default()
        };
        if let Some(capacity) = self.event_channel_capacity {
            engine.event_channel_capacity = capacity;
        }

        PfxConfig {
            event_source: EventSourceConfig::File {
                path: self.events_path.clone(),
            },
            store: StoreConfig {
                log_advertisements: self.log_advertisements,
            },
            engine,
        }
    }
}

/// Route computation stand-in: logs what would be recomputed
struct LoggingRouteComputation;

#[async_trait::async_trait]
impl RouteComputation for LoggingRouteComputation {
    async fn recompute(&self, changed: &ChangedPrefixes) -> pfx_core::Result<()> {
        let mut prefixes: Vec<String> = changed.iter().map(ToString::to_string).collect();
        prefixes.sort();
        info!("Recompute requested for {}", prefixes.join(", "));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "logging"
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return PfxExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return PfxExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only the JSON snapshot
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PfxExitCode::ConfigError.into();
    }

    info!("Starting pfxd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PfxExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            PfxExitCode::RuntimeError
        } else {
            PfxExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let pfx_config = config.pfx_config();
    pfx_config.validate()?;
    let dump_mode = config.dump_mode()?;
    let filter = config.route_filter()?;

    let registry = SourceRegistry::new();

    #[cfg(feature = "file")]
    {
        info!("Registering file event source");
        pfx_source_file::register(&registry);
    }

    let event_source = registry.create_event_source(&pfx_config.event_source)?;
    let state = SharedPrefixState::from_state(PrefixState::from_config(&pfx_config.store));

    let (engine, mut event_rx) = PrefixEngine::new(
        event_source,
        Box::new(LoggingRouteComputation),
        state.clone(),
        pfx_config.engine,
    )?;

    let monitor = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let signals = tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown signal error: {:#}", e),
        }
        let _ = shutdown_tx.send(());
    });

    engine.run_with_shutdown(Some(shutdown_rx)).await?;
    signals.abort();
    drop(engine);
    let _ = monitor.await;

    let (advertisements, sources) = state.read(|s| (s.len(), s.source_count())).await;
    info!(
        "Holding {} advertisement(s) from {} source(s)",
        advertisements, sources
    );

    match dump_mode {
        DumpMode::Routes => {
            let routes = state.received_routes_filtered(&filter).await;
            println!("{}", serde_json::to_string_pretty(&routes)?);
        }
        DumpMode::Databases => {
            let dbs: Vec<_> = state.prefix_databases().await.into_values().collect();
            println!("{}", serde_json::to_string_pretty(&dbs)?);
        }
        DumpMode::None => {}
    }

    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
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
    use pfx_core::SourceId;

    fn config() -> Config {
        Config {
            events_path: "/tmp/events.jsonl".to_string(),
            log_advertisements: true,
            event_channel_capacity: None,
            warn_on_conflict: true,
            dump: "routes".to_string(),
            filter_prefixes: Vec::new(),
            filter_node: None,
            filter_area: None,
            log_level: "info".to_string(),
        }
    }

    #[test]
    fn test_route_filter_from_config() {
        let mut cfg = config();
        cfg.filter_prefixes = vec!["10.0.0.7/24".to_string()];
        cfg.filter_node = Some("nodeA".to_string());

        let filter = cfg.route_filter().unwrap();
        assert_eq!(filter.node_name.as_deref(), Some("nodeA"));
        assert!(filter.area_name.is_none());
        assert!(
            filter
                .prefixes
                .unwrap()
                .contains(&"10.0.0.0/24".parse::<Prefix>().unwrap())
        );
    }

    #[test]
    fn test_empty_filter_values_are_exact_matches() {
        let mut cfg = config();
        cfg.filter_node = Some(String::new());
        cfg.filter_area = Some(String::new());

        let filter = cfg.route_filter().unwrap();
        assert_eq!(filter.node_name.as_deref(), Some(""));
        assert_eq!(filter.area_name.as_deref(), Some(""));
        assert!(!filter.matches_source(&SourceId::new("nodeA", "area1")));
    }

    #[test]
    fn test_invalid_filter_prefix_rejected() {
        let mut cfg = config();
        cfg.filter_prefixes = vec!["nonsense".to_string()];
        assert!(cfg.route_filter().is_err());
    }

    #[test]
    fn test_dump_mode() {
        let mut cfg = config();
        assert_eq!(cfg.dump_mode().unwrap(), DumpMode::Routes);
        cfg.dump = "Databases".to_string();
        assert_eq!(cfg.dump_mode().unwrap(), DumpMode::Databases);
        cfg.dump = "everything".to_string();
        assert!(cfg.dump_mode().is_err());
    }

    #[test]
    fn test_pfx_config_carries_overrides() {
        let mut cfg = config();
        cfg.event_channel_capacity = Some(16);
        cfg.warn_on_conflict = false;
        cfg.log_advertisements = false;

        let pfx = cfg.pfx_config();
        assert!(pfx.validate().is_ok());
        assert_eq!(pfx.engine.event_channel_capacity, 16);
        assert!(!pfx.engine.warn_on_conflict);
        assert!(!pfx.store.log_advertisements);
        assert_eq!(pfx.event_source.type_name(), "file");
    }
}
