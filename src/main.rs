use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use secrecy::SecretString;

use caption_core::errors::RemoteError;
use caption_core::record::TranscriptRow;
use caption_core::remote::RemoteStore;
use caption_server::{start, AppState, ServerConfig};
use caption_store::database::Database;
use caption_sync::reconciler::ReconcilerConfig;
use caption_sync::remote_http::{HttpRemote, HttpRemoteConfig};
use caption_sync::trigger::Trigger;
use caption_telemetry::{init_telemetry, TelemetryConfig};

/// Offline-first live-caption transcript store and sync daemon.
#[derive(Parser, Debug)]
#[command(name = "captiond", version)]
struct Args {
    /// Port for the HTTP surface.
    #[arg(long, env = "CAPTIOND_PORT", default_value_t = 8787)]
    port: u16,

    /// Path to the transcript database.
    #[arg(long, env = "CAPTIOND_DB")]
    db: Option<PathBuf>,

    /// Base URL of the remote transcript store. Without it sync stays
    /// disabled and captioning is local-only.
    #[arg(long, env = "CAPTIOND_REMOTE_URL")]
    remote_url: Option<String>,

    /// API key for the remote transcript store.
    #[arg(long, env = "CAPTIOND_REMOTE_KEY", hide_env_values = true)]
    remote_key: Option<String>,
}

/// Stand-in remote used when no backend is configured: every attempt
/// fails as a network error, so records simply stay pending locally.
struct DisabledRemote;

#[async_trait::async_trait]
impl RemoteStore for DisabledRemote {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn upsert(&self, _table: &str, _rows: &[TranscriptRow]) -> Result<(), RemoteError> {
        Err(RemoteError::Network("no remote store configured".into()))
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let _telemetry = init_telemetry(TelemetryConfig::default());

    tracing::info!("starting captiond");

    let db_path = args
        .db
        .unwrap_or_else(|| home_dir().join(".captiond/captiond.db"));
    let db = Database::open(&db_path).expect("failed to open transcript store");

    let remote: Arc<dyn RemoteStore> = match (args.remote_url, args.remote_key) {
        (Some(url), Some(key)) => {
            let config = HttpRemoteConfig::new(url, SecretString::from(key));
            Arc::new(HttpRemote::new(config).expect("failed to build remote store client"))
        }
        _ => {
            tracing::warn!("no remote store configured; transcripts stay local until one is");
            Arc::new(DisabledRemote)
        }
    };

    let state = AppState::new(db, remote, ReconcilerConfig::default());
    let triggers = state.triggers.clone();

    let handle = start(ServerConfig { port: args.port }, state)
        .await
        .expect("failed to start server");
    tracing::info!(port = handle.port, "captiond ready");

    // Catch up on anything left pending by a previous run
    triggers.fire(Trigger::AppStart);

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    tracing::info!("shutting down");
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
