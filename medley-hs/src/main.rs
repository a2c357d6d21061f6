//! medley-hs - History Sync service
//!
//! Imports transfer, download, and plugin history from a legacy NAStool
//! database into the Medley stores, remapping paths, downloader ids, and
//! site names along the way. The import runs as a background task behind a
//! fire-and-forget HTTP trigger.

use anyhow::Result;
use medley_common::events::EventBus;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use medley_hs::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting medley-hs (History Sync) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve and bootstrap the root folder
    let cli_root = std::env::args().nth(1);
    let root_folder = medley_common::config::resolve_root_folder(cli_root.as_deref())?;
    medley_common::config::ensure_root_folder(&root_folder)?;

    // Open or create the destination database
    let db_path = medley_common::config::database_path(&root_folder);
    info!("Database: {}", db_path.display());
    let db_pool = medley_common::db::init_db_pool(&db_path).await?;
    info!("Database connection established");

    // Event bus for sync progress broadcasting
    let event_bus = EventBus::new(100);

    let state = AppState::new(db_pool, event_bus);
    let app = medley_hs::build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:5790").await?;
    info!("Listening on http://127.0.0.1:5790");
    info!("Health check: http://127.0.0.1:5790/health");

    axum::serve(listener, app).await?;

    Ok(())
}
