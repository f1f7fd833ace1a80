use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::classifier::BoatClassifier;
use crate::config::AppConfig;
use crate::store::ResultStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub store: ResultStore,
    pub classifier: Arc<dyn BoatClassifier>,
}
