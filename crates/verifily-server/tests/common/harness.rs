//! Test server harness.

use axum::{Json, Router, routing::post};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use verifily::ensemble::{EnsembleCombiner, EnsembleConfig};
use verifily::signal::{ClassifierConfig, standard_producers};
use verifily::verification::NvmeStore;
use verifily_server::gateway::{HandlerState, create_router_with_state};

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, Default)]
pub struct TestServerConfig {
    /// Record directory; a fresh temp dir when unset.
    pub storage_path: Option<PathBuf>,
    /// Starts a stub model server answering with this probability.
    pub classifier_score: Option<f64>,
}

/// A gateway bound to an ephemeral local port. Dropping it stops the server.
pub struct TestServer {
    pub addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    _tasks: Vec<JoinHandle<()>>,
    _records: Option<TempDir>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stops the server and waits until its port refuses connections.
    pub async fn shutdown(mut self) {
        self.stop();
        let deadline = Instant::now() + Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS);
        while Instant::now() < deadline && TcpStream::connect(self.addr).await.is_ok() {
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }

    fn stop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("server did not accept connections within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("server setup failed: {0}")]
    Setup(String),
}

fn setup_error(err: impl std::fmt::Display) -> ServerStartupError {
    ServerStartupError::Setup(err.to_string())
}

async fn wait_until_accepting(addr: SocketAddr) -> Result<(), ServerStartupError> {
    let timeout = Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS);
    let deadline = Instant::now() + timeout;
    while TcpStream::connect(addr).await.is_err() {
        if Instant::now() > deadline {
            return Err(ServerStartupError::Timeout(timeout));
        }
        tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
    Ok(())
}

/// Serves `POST /detect` with a fixed `ai_probability`.
async fn spawn_model_server(score: f64) -> Result<(String, JoinHandle<()>), ServerStartupError> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new().route(
        "/detect",
        post(move || async move { Json(serde_json::json!({ "ai_probability": score })) }),
    );

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), handle))
}

/// Spawns a server backed by an on-disk store and the shipped heuristic producers.
///
/// The classifier chain is empty unless `classifier_score` is set, in which case it
/// holds a single self-hosted model server stub.
pub async fn spawn_test_server(config: TestServerConfig) -> Result<TestServer, ServerStartupError> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let mut tasks = Vec::new();

    let (storage_path, records) = match config.storage_path {
        Some(path) => (path, None),
        None => {
            let dir = TempDir::new()?;
            (dir.path().to_path_buf(), Some(dir))
        }
    };

    let model_server_url = match config.classifier_score {
        Some(score) => {
            let (url, handle) = spawn_model_server(score).await?;
            tasks.push(handle);
            Some(url)
        }
        None => None,
    };

    let chain = ClassifierConfig {
        model_server_url,
        link_timeout: Duration::from_secs(2),
        ..ClassifierConfig::default()
    }
    .build_chain();
    let sources = chain.sources();

    let producers = standard_producers(chain).map_err(setup_error)?;
    let combiner =
        EnsembleCombiner::new(EnsembleConfig::default(), producers).map_err(setup_error)?;
    let store = NvmeStore::open(storage_path).map_err(setup_error)?;

    let app = create_router_with_state(HandlerState::new(combiner, store, sources));
    let (stop, stopped) = oneshot::channel::<()>();

    tasks.push(tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stopped.await;
            })
            .await;
    }));

    wait_until_accepting(addr).await?;

    Ok(TestServer {
        addr,
        stop: Some(stop),
        _tasks: tasks,
        _records: records,
    })
}
