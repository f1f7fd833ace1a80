use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tracing::{Level, info};

use common::storage::{ObjectStore, S3ObjectStore};
use server::classifier::{AnthropicClassifier, BoatClassifier};
use server::config::AppConfig;
use server::state::AppState;
use server::store::ResultStore;
use server::{build_router, database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;
    seed::ensure_indexes(&db).await?;
    seed::seed_admin_account(&db, &config.auth).await?;

    let objects: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::new(&config.storage)?);
    let classifier: Arc<dyn BoatClassifier> =
        Arc::new(AnthropicClassifier::new(&config.classifier));

    let addr = SocketAddr::new(config.server.host.parse::<IpAddr>()?, config.server.port);

    let state = AppState {
        store: ResultStore::new(db.clone(), objects),
        db,
        classifier,
        config: Arc::new(config),
    };

    let app = build_router(state);

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
