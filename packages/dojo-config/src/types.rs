use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	#[serde(default)]
	pub throttle: Throttle,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub worker: Worker,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub places: PlacesProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PlacesProviderConfig {
	pub api_base: String,
	/// Blank keys are normalized to `None`; searches then fail fast with a configuration error.
	#[serde(default)]
	pub api_key: Option<String>,
	/// Minimum spacing between two outbound requests.
	#[serde(default = "default_rate_limit_ms")]
	pub rate_limit_ms: u64,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Search {
	pub keywords: Vec<String>,
	/// Curated names that are always searched so known dojos show up.
	#[serde(default)]
	pub force_keywords: Vec<String>,
	#[serde(default = "default_query_max_pages")]
	pub query_max_pages: u32,
	#[serde(default = "default_nearby_max_pages")]
	pub nearby_max_pages: u32,
	#[serde(default = "default_detail_ttl_hours")]
	pub detail_ttl_hours: i64,
	#[serde(default)]
	pub nearby: SearchNearby,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SearchNearby {
	pub default_latitude: f64,
	pub default_longitude: f64,
	pub default_radius_m: u32,
}
impl Default for SearchNearby {
	fn default() -> Self {
		Self { default_latitude: 49.2827, default_longitude: -123.1207, default_radius_m: 30_000 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Throttle {
	pub free_interval_days: i64,
}
impl Default for Throttle {
	fn default() -> Self {
		Self { free_interval_days: 3 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Cache {
	/// One of `postgres` or `memory`.
	pub backend: String,
}
impl Default for Cache {
	fn default() -> Self {
		Self { backend: "postgres".to_string() }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Worker {
	pub poll_interval_ms: u64,
	pub hours_refresh_after_days: i64,
	pub refresh_batch_size: u32,
}
impl Default for Worker {
	fn default() -> Self {
		Self { poll_interval_ms: 60_000, hours_refresh_after_days: 7, refresh_batch_size: 50 }
	}
}

fn default_rate_limit_ms() -> u64 {
	400
}

fn default_timeout_ms() -> u64 {
	15_000
}

fn default_query_max_pages() -> u32 {
	5
}

fn default_nearby_max_pages() -> u32 {
	3
}

fn default_detail_ttl_hours() -> i64 {
	24
}
