pub mod aggregate;
pub mod cache;
pub mod enrich;
pub mod fanout;
pub mod search;
pub mod stores;
pub mod throttle;

mod error;

pub use enrich::EnrichReport;
pub use error::{Error, Result};
pub use fanout::FanOutReport;
pub use search::{Caller, NearbyQuery, SearchOutcome, ThrottleNotice};
pub use stores::Stores;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;
use time::OffsetDateTime;

use dojo_config::Config;
use dojo_domain::{
	place::{PlaceDetail, PlaceId, SearchArea},
	throttle::BillingAccount,
};
use dojo_providers::places::{PageToken, PlacesClient, SearchPage};
use dojo_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Upstream place search and detail lookups.
pub trait PlacesProvider
where
	Self: Send + Sync,
{
	/// False when no credential is configured. Callers must not issue requests in that case.
	fn has_credentials(&self) -> bool;

	fn search_page<'a>(
		&'a self,
		keyword: &'a str,
		area: &'a SearchArea,
		page_token: Option<&'a PageToken>,
	) -> BoxFuture<'a, dojo_providers::Result<SearchPage>>;

	fn place_details<'a>(
		&'a self,
		place_id: &'a PlaceId,
	) -> BoxFuture<'a, dojo_providers::Result<PlaceDetail>>;
}

/// Key-value storage with optional expiry. Each call is atomic for its key.
pub trait CacheStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, key: &'a str, now: OffsetDateTime) -> BoxFuture<'a, Result<Option<Value>>>;

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: Value,
		now: OffsetDateTime,
		expires_at: Option<OffsetDateTime>,
	) -> BoxFuture<'a, Result<()>>;
}

/// Read side of the billing state kept in sync by the billing provider's webhooks.
pub trait BillingLedger
where
	Self: Send + Sync,
{
	fn billing_account<'a>(
		&'a self,
		caller_id: &'a str,
	) -> BoxFuture<'a, Result<Option<BillingAccount>>>;
}

pub trait PlaceStore
where
	Self: Send + Sync,
{
	fn upsert_place<'a>(
		&'a self,
		detail: &'a PlaceDetail,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub places: Arc<dyn PlacesProvider>,
}
impl Providers {
	pub fn new(places: Arc<dyn PlacesProvider>) -> Self {
		Self { places }
	}

	pub fn from_config(cfg: &Config) -> Result<Self> {
		let client = PlacesClient::new(&cfg.providers.places)?;

		Ok(Self { places: Arc::new(client) })
	}
}

impl PlacesProvider for PlacesClient {
	fn has_credentials(&self) -> bool {
		self.has_api_key()
	}

	fn search_page<'a>(
		&'a self,
		keyword: &'a str,
		area: &'a SearchArea,
		page_token: Option<&'a PageToken>,
	) -> BoxFuture<'a, dojo_providers::Result<SearchPage>> {
		Box::pin(PlacesClient::search_page(self, keyword, area, page_token))
	}

	fn place_details<'a>(
		&'a self,
		place_id: &'a PlaceId,
	) -> BoxFuture<'a, dojo_providers::Result<PlaceDetail>> {
		Box::pin(PlacesClient::place_details(self, place_id))
	}
}

pub struct DojoService {
	pub cfg: Config,
	pub providers: Providers,
	pub stores: Stores,
}
impl DojoService {
	pub fn new(cfg: Config, db: Arc<Db>) -> Result<Self> {
		let providers = Providers::from_config(&cfg)?;
		let stores = Stores::from_config(&cfg, db);

		Ok(Self { cfg, providers, stores })
	}

	pub fn with_providers(cfg: Config, providers: Providers, stores: Stores) -> Self {
		Self { cfg, providers, stores }
	}

	pub(crate) fn detail_ttl(&self) -> time::Duration {
		time::Duration::hours(self.cfg.search.detail_ttl_hours)
	}
}
