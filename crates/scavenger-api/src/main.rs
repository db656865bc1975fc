//! Scavenger API server entry point.

use std::sync::Arc;

use scavenger_api::config::{LogFormat, Settings};
use scavenger_api::error::AppError;
use scavenger_api::state::AppState;
use scavenger_core::clock::SystemClock;
use scavenger_core::repository::EventRepository;
use scavenger_event_store::memory_event_repository::InMemoryEventRepository;
use scavenger_event_store::pg_event_repository::PgEventRepository;
use scavenger_hunts::application::catalog::InMemoryHuntCatalog;
use scavenger_hunts::application::loader::load_hunts_from_dir;
use scavenger_progress::application::locks::ProgressLocks;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt().with_env_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn event_repository(settings: &Settings) -> Result<Arc<dyn EventRepository>, AppError> {
    let Some(database_url) = &settings.database_url else {
        warn!("DATABASE_URL not set; progress is kept in memory and lost on restart");
        return Ok(Arc::new(InMemoryEventRepository::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    let repository = PgEventRepository::new(pool);
    repository.migrate().await?;
    info!("connected to PostgreSQL event store");
    Ok(Arc::new(repository))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let settings = Settings::from_env()?;
    init_tracing(settings.log_format);

    info!("Starting Scavenger API server");

    let hunts = load_hunts_from_dir(&settings.hunts_dir)?;
    if hunts.is_empty() {
        warn!(dir = %settings.hunts_dir.display(), "no hunt documents found");
    }
    let catalog = InMemoryHuntCatalog::with_hunts(hunts)?;
    info!(hunts = catalog.len(), "hunt catalog ready");

    let app_state = AppState::new(
        Arc::new(catalog),
        event_repository(&settings).await?,
        Arc::new(SystemClock),
        ProgressLocks::new(settings.lock_wait),
        settings.progress_policy(),
    );
    let app = scavenger_api::app(app_state);

    let addr = settings.bind_addr()?;
    info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
