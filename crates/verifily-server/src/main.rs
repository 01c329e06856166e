//! Verifily HTTP server entrypoint.

use std::net::SocketAddr;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use verifily::config::Config;
use verifily::ensemble::EnsembleCombiner;
use verifily::signal::standard_producers;
use verifily::verification::{MemoryStore, NvmeStore, VerificationStore};
use verifily_server::gateway::{HandlerState, create_router_with_state};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "Verifily starting"
    );

    let chain = config.classifier_config().build_chain();
    let classifier_sources = chain.sources();
    if classifier_sources.is_empty() {
        tracing::warn!("No classifier backends configured, scoring with heuristics only");
    }

    let combiner = EnsembleCombiner::new(config.ensemble_config(), standard_producers(chain)?)?;

    match &config.storage_path {
        Some(path) => {
            let store = tokio::task::spawn_blocking({
                let path = path.clone();
                move || NvmeStore::open(path)
            })
            .await??;
            tracing::info!(
                path = %path.display(),
                records = store.len(),
                "Verification store opened"
            );
            serve(addr, HandlerState::new(combiner, store, classifier_sources)).await
        }
        None => {
            tracing::warn!("No VERIFILY_STORAGE_PATH configured, verifications are kept in memory");
            serve(
                addr,
                HandlerState::new(combiner, MemoryStore::new(), classifier_sources),
            )
            .await
        }
    }
}

async fn serve<S>(addr: SocketAddr, state: HandlerState<S>) -> anyhow::Result<()>
where
    S: VerificationStore + 'static,
{
    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Verifily shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("VERIFILY_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
