use std::sync::Arc;

use time::OffsetDateTime;

use dojo_config::Config;
use dojo_domain::{place::PlaceDetail, throttle::BillingAccount};
use dojo_storage::{db::Db, queries};

use crate::{
	BillingLedger, BoxFuture, CacheStore, PlaceStore, Result,
	cache::{MemoryCache, PgCache},
};

#[derive(Clone)]
pub struct Stores {
	pub cache: Arc<dyn CacheStore>,
	pub billing: Arc<dyn BillingLedger>,
	pub places: Arc<dyn PlaceStore>,
}
impl Stores {
	pub fn new(
		cache: Arc<dyn CacheStore>,
		billing: Arc<dyn BillingLedger>,
		places: Arc<dyn PlaceStore>,
	) -> Self {
		Self { cache, billing, places }
	}

	/// Postgres-backed stores. The cache backend follows `cache.backend`.
	pub fn from_config(cfg: &Config, db: Arc<Db>) -> Self {
		let cache: Arc<dyn CacheStore> = match cfg.cache.backend.as_str() {
			"memory" => Arc::new(MemoryCache::new()),
			_ => Arc::new(PgCache::new(db.clone())),
		};
		let pg = Arc::new(PgStores { db });

		Self { cache, billing: pg.clone(), places: pg }
	}
}

struct PgStores {
	db: Arc<Db>,
}
impl BillingLedger for PgStores {
	fn billing_account<'a>(
		&'a self,
		caller_id: &'a str,
	) -> BoxFuture<'a, Result<Option<BillingAccount>>> {
		Box::pin(async move { Ok(queries::find_billing_account(&self.db, caller_id).await?) })
	}
}
impl PlaceStore for PgStores {
	fn upsert_place<'a>(
		&'a self,
		detail: &'a PlaceDetail,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			queries::upsert_dojo(&self.db, detail, now).await?;

			Ok(())
		})
	}
}
