use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use composer_lite::api::{self, ComposeApiState};
use composer_lite::config::ServiceConfig;
use composer_lite::distro::DistroRegistry;
use composer_lite::queue::{sweeper, JobQueue};
use composer_lite::shutdown::install_shutdown_handler;
use composer_lite::worker::api::{router as worker_router, WorkerApiState};
use composer_lite::worker::WorkerServer;

#[derive(Parser, Debug)]
#[command(name = "composer-lite")]
#[command(about = "A compose orchestration service for building OS disk images")]
struct Args {
    /// Address to listen on for both the compose and the worker API
    #[arg(long, default_value = "127.0.0.1:8700")]
    listen: SocketAddr,

    /// Object-store bucket uploaded images land in
    #[arg(long, default_value = "composer-images")]
    bucket: String,

    /// Directory to persist jobs into (in-memory queue if omitted)
    #[arg(long)]
    jobs_dir: Option<PathBuf>,

    /// Consider a worker dead after this many milliseconds without a heartbeat
    #[arg(long, default_value = "120000")]
    heartbeat_timeout_ms: u64,

    /// How often to sweep for dead workers, in milliseconds
    #[arg(long, default_value = "30000")]
    sweeper_interval_ms: u64,

    /// How long a worker poll may block, in milliseconds
    #[arg(long, default_value = "30000")]
    worker_poll_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServiceConfig {
        listen_addr: args.listen,
        bucket: args.bucket,
        heartbeat_timeout_ms: args.heartbeat_timeout_ms,
        sweeper_interval_ms: args.sweeper_interval_ms,
        worker_poll_timeout_ms: args.worker_poll_timeout_ms,
        jobs_dir: args.jobs_dir,
        ..Default::default()
    };

    let queue = match &config.jobs_dir {
        Some(dir) => Arc::new(JobQueue::with_persistence(dir.clone()).await?),
        None => Arc::new(JobQueue::new()),
    };
    let workers = WorkerServer::new(queue.clone());
    let distros = Arc::new(DistroRegistry::with_defaults());

    let shutdown = install_shutdown_handler();

    tokio::spawn(sweeper::run_sweeper(
        queue.clone(),
        config.sweeper_interval(),
        config.heartbeat_timeout(),
        shutdown.clone(),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest(
            api::BASE_PATH,
            api::router(ComposeApiState {
                workers: workers.clone(),
                distros,
                bucket: config.bucket.clone(),
                manifest_deadline: config.manifest_deadline(),
            }),
        )
        .nest(
            "/api/worker/v1",
            worker_router(WorkerApiState {
                workers,
                poll_timeout: config.worker_poll_timeout(),
                shutdown: shutdown.clone(),
            }),
        )
        .layer(cors);

    tracing::info!(addr = %config.listen_addr, "Starting composer");
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("Composer stopped");
    Ok(())
}
