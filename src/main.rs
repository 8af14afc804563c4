use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use study_buddy::storage::{
    HierarchyStore, LocalDrive, LocalIndexStore, LocalObjectStore, StaticIdentity, Uploader,
};
use study_buddy::{
    create_router, AppState, CaptureConfig, Config, FileCaptureDevice, SessionController,
    SystemClock, UploadOrchestrator,
};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "study-buddy", about = "Lecture recording and upload service")]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/study-buddy")]
    config: String,

    /// Override the HTTP port from the config
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Study Buddy v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);
    info!("Recordings directory: {}", cfg.audio.recordings_path);
    info!("Storage root: {}", cfg.storage.root);

    let device = Arc::new(FileCaptureDevice::new(
        &cfg.audio.source_file,
        &cfg.audio.recordings_path,
    ));

    let drive: Option<Arc<dyn HierarchyStore>> = if cfg.identity.hierarchy_enabled {
        Some(Arc::new(LocalDrive::new(&cfg.storage.root)))
    } else {
        None
    };
    let uploader = cfg.identity.uid.clone().map(|uid| Uploader {
        uid,
        display_name: cfg.identity.display_name.clone(),
    });
    if uploader.is_none() {
        warn!("No identity configured; uploads will be rejected");
    }

    let orchestrator = Arc::new(UploadOrchestrator::new(
        Arc::new(LocalObjectStore::new(&cfg.storage.root)),
        Arc::new(LocalIndexStore::new(&cfg.storage.root)),
        Arc::new(StaticIdentity::new(uploader, drive)),
        cfg.upload.to_orchestrator_config(),
    ));

    let controller = Arc::new(SessionController::new(
        device,
        Arc::new(SystemClock::new()),
        CaptureConfig::default(),
        orchestrator,
    ));

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, create_router(AppState::new(controller)))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
