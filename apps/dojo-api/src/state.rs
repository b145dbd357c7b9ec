use std::sync::Arc;

use dojo_service::DojoService;
use dojo_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DojoService>,
}
impl AppState {
	pub async fn new(config: dojo_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = DojoService::new(config, Arc::new(db))?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: DojoService) -> Self {
		Self { service: Arc::new(service) }
	}
}
