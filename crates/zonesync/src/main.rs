// # zonesync - DNS record reconciliation driver
//
// This binary is a THIN integration layer:
// - reads configuration from flags and environment variables
// - registers the provider clients compiled in
// - runs one reconciler operation and persists the tracked-record snapshot
//
// All reconciliation logic lives in zonesync-core. Retry logic lives in the
// provider client.
//
// ## Configuration
//
// ### Provider
// - `LWS_LOGIN`: Account login
// - `LWS_API_KEY`: API key
// - `LWS_BASE_URL`: API base URL (optional)
// - `LWS_TEST_MODE`: Validate without applying (true/false)
//
// ### Client
// - `ZONESYNC_TIMEOUT_SECS`: Per-request timeout
// - `ZONESYNC_MAX_RETRIES`: Retries after the first attempt
// - `ZONESYNC_RETRY_DELAY_SECS`: Delay before the first retry
// - `ZONESYNC_BACKOFF`: Delay multiplier between retries
//
// ### State
// - `ZONESYNC_STATE_PATH`: Tracked-record file (memory only when unset)
// - `ZONESYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export LWS_LOGIN=mylogin
// export LWS_API_KEY=...
// export ZONESYNC_STATE_PATH=/var/lib/zonesync/state.json
//
// zonesync apply --key web --zone example.com --name www --type A --value 192.0.2.10
// zonesync refresh
// zonesync destroy --key web
// ```

mod session;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use zonesync_core::{
    ClientConfig, DesiredRecord, DirectoryRegistry, FileStateStore, MemoryStateStore,
    ProviderConfig, Reconciler, ReconcilerConfig, StateStore, StateStoreConfig, ZonesyncConfig,
};

use session::Session;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZonesyncExitCode {
    /// The operation succeeded
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// The operation failed
    RuntimeError = 2,
}

impl From<ZonesyncExitCode> for ExitCode {
    fn from(code: ZonesyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser)]
#[command(
    name = "zonesync",
    version,
    about = "Reconcile DNS records against the LWS provider API"
)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,

    #[command(flatten)]
    client: ClientArgs,

    /// File holding tracked records between runs; memory only when unset
    #[arg(long, env = "ZONESYNC_STATE_PATH")]
    state_path: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = "ZONESYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Stop tracking a record when its zone cannot be fetched
    #[arg(long)]
    drop_on_unconfirmed_read: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ProviderArgs {
    /// LWS account login
    #[arg(long, env = "LWS_LOGIN")]
    login: Option<String>,

    /// LWS API key
    #[arg(long, env = "LWS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// LWS API base URL
    #[arg(long, env = "LWS_BASE_URL")]
    base_url: Option<String>,

    /// Ask the provider to validate requests without applying them
    #[arg(long, env = "LWS_TEST_MODE")]
    test_mode: bool,
}

#[derive(Args, Debug)]
struct ClientArgs {
    /// Per-request timeout in seconds
    #[arg(long = "timeout", env = "ZONESYNC_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Retries after the first attempt
    #[arg(long, env = "ZONESYNC_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Delay before the first retry in seconds
    #[arg(long = "retry-delay", env = "ZONESYNC_RETRY_DELAY_SECS", default_value_t = 15)]
    retry_delay_secs: u64,

    /// Delay multiplier between retries
    #[arg(long = "backoff", env = "ZONESYNC_BACKOFF", default_value_t = 2)]
    backoff_multiplier: u32,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or converge the record tracked under a key
    Apply(ApplyArgs),
    /// Re-read tracked records, recovering drifted identifiers
    Refresh {
        /// Only this key; every tracked key when omitted
        #[arg(long)]
        key: Option<String>,
    },
    /// Delete the record tracked under a key
    Destroy {
        /// Resource key
        #[arg(long)]
        key: String,
    },
    /// Track an existing remote record under a key
    Import {
        /// Resource key
        #[arg(long)]
        key: String,
        /// Zone holding the record
        #[arg(long)]
        zone: String,
        /// Provider identifier of the record
        #[arg(long)]
        id: String,
    },
    /// List every record of a zone
    Zone {
        /// Zone to list
        #[arg(long)]
        zone: String,
    },
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Resource key the record is tracked under
    #[arg(long)]
    key: String,
    /// Zone holding the record
    #[arg(long)]
    zone: String,
    /// Record name
    #[arg(long)]
    name: String,
    /// Record type (A, AAAA, CNAME, MX, TXT, ...)
    #[arg(long = "type")]
    record_type: String,
    /// Record value
    #[arg(long)]
    value: String,
    /// TTL in seconds; the provider default when omitted
    #[arg(long)]
    ttl: Option<u32>,
}

impl ApplyArgs {
    fn desired(&self) -> DesiredRecord {
        let desired = DesiredRecord::new(&self.zone, &self.name, &self.record_type, &self.value);
        match self.ttl {
            Some(ttl) => desired.with_ttl(ttl),
            None => desired,
        }
    }
}

impl Cli {
    /// Build the validated configuration
    fn config(&self) -> Result<ZonesyncConfig> {
        let Some(login) = self.provider.login.clone().filter(|s| !s.trim().is_empty()) else {
            bail!("LWS_LOGIN is required. Set it via: export LWS_LOGIN=your_login");
        };
        let Some(api_key) = self.provider.api_key.clone().filter(|s| !s.trim().is_empty()) else {
            bail!("LWS_API_KEY is required. Set it via: export LWS_API_KEY=your_key");
        };

        let config = ZonesyncConfig {
            provider: ProviderConfig::Lws {
                login,
                api_key,
                base_url: self.provider.base_url.clone(),
                test_mode: self.provider.test_mode,
            },
            client: ClientConfig {
                timeout_secs: self.client.timeout_secs,
                max_retries: self.client.max_retries,
                retry_delay_secs: self.client.retry_delay_secs,
                backoff_multiplier: self.client.backoff_multiplier,
            },
            reconciler: ReconcilerConfig {
                drop_on_unconfirmed_read: self.drop_on_unconfirmed_read,
            },
            state_store: match &self.state_path {
                Some(path) => StateStoreConfig::File {
                    path: path.display().to_string(),
                },
                None => StateStoreConfig::Memory,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn log_level(&self) -> Result<Level> {
        self.log_level.parse::<Level>().map_err(|_| {
            anyhow::anyhow!(
                "ZONESYNC_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                self.log_level
            )
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    let log_level = match cli.log_level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ZonesyncExitCode::ConfigError.into();
        }
    };

    // Logs go to stderr, stdout carries the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ZonesyncExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ZonesyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(cli.command, config).await {
            Ok(()) => ZonesyncExitCode::Success,
            Err(e) => {
                error!("{:#}", e);
                exit_code_for(&e)
            }
        }
    })
    .into()
}

/// Configuration problems found late (unknown provider, unusable state
/// path) still exit as configuration errors
fn exit_code_for(e: &anyhow::Error) -> ZonesyncExitCode {
    match e.downcast_ref::<zonesync_core::Error>() {
        Some(zonesync_core::Error::Config(_)) => ZonesyncExitCode::ConfigError,
        _ => ZonesyncExitCode::RuntimeError,
    }
}

fn registry() -> DirectoryRegistry {
    let registry = DirectoryRegistry::new();

    #[cfg(feature = "lws")]
    zonesync_provider_lws::register(&registry);

    registry
}

async fn open_store(config: &StateStoreConfig) -> Result<Arc<dyn StateStore>> {
    Ok(match config {
        StateStoreConfig::File { path } => Arc::new(FileStateStore::new(path).await?),
        StateStoreConfig::Memory => {
            warn!("ZONESYNC_STATE_PATH is unset; tracked records are kept in memory only");
            Arc::new(MemoryStateStore::new())
        }
    })
}

async fn run(command: Command, config: ZonesyncConfig) -> Result<()> {
    let directory = registry().create_directory(&config.provider, &config.client)?;
    info!(
        "Using provider {} ({} retries, {}s initial delay)",
        directory.provider_name(),
        config.client.max_retries,
        config.client.retry_delay_secs
    );

    let reconciler = Reconciler::new(Arc::from(directory), config.reconciler.clone());
    let session = Session::new(reconciler, open_store(&config.state_store).await?);

    let output = match command {
        Command::Apply(args) => session.apply(&args.key, &args.desired()).await?.to_json(),
        Command::Refresh { key } => serde_json::Value::Array(
            session
                .refresh(key.as_deref())
                .await?
                .iter()
                .map(|r| r.to_json())
                .collect(),
        ),
        Command::Destroy { key } => session.destroy(&key).await?.to_json(),
        Command::Import { key, zone, id } => session.import(&key, &zone, &id).await?.to_json(),
        Command::Zone { zone } => serde_json::to_value(session.zone(&zone).await?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
