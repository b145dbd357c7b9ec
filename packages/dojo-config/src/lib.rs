mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Config, PlacesProviderConfig, Postgres, Providers, Search, SearchNearby, Service,
	Storage, Throttle, Worker,
};

use std::{fs, path::Path};

pub const MAX_PAGES_LIMIT: u32 = 10;
/// One year.
pub const MAX_DETAIL_TTL_HOURS: i64 = 24 * 365;
pub const MAX_INTERVAL_DAYS: i64 = 365;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.places.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.places.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.providers.places.rate_limit_ms == 0 {
		return Err(Error::Validation {
			message: "providers.places.rate_limit_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.places.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.places.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (key, value) in &cfg.providers.places.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("providers.places.default_headers.{key} must be a string."),
			});
		}
	}

	if cfg.search.keywords.is_empty() {
		return Err(Error::Validation {
			message: "search.keywords must be non-empty.".to_string(),
		});
	}

	for (label, keywords) in [
		("search.keywords", &cfg.search.keywords),
		("search.force_keywords", &cfg.search.force_keywords),
	] {
		if keywords.iter().any(|keyword| keyword.trim().is_empty()) {
			return Err(Error::Validation {
				message: format!("{label} must not contain blank entries."),
			});
		}
	}

	for (label, pages) in [
		("search.query_max_pages", cfg.search.query_max_pages),
		("search.nearby_max_pages", cfg.search.nearby_max_pages),
	] {
		if pages == 0 || pages > MAX_PAGES_LIMIT {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 1-{MAX_PAGES_LIMIT}."),
			});
		}
	}

	if cfg.search.detail_ttl_hours <= 0 {
		return Err(Error::Validation {
			message: "search.detail_ttl_hours must be greater than zero.".to_string(),
		});
	}
	if cfg.search.detail_ttl_hours > MAX_DETAIL_TTL_HOURS {
		return Err(Error::Validation {
			message: format!("search.detail_ttl_hours must be at most {MAX_DETAIL_TTL_HOURS}."),
		});
	}
	if cfg.search.nearby.default_radius_m == 0 {
		return Err(Error::Validation {
			message: "search.nearby.default_radius_m must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.nearby.default_latitude.is_finite()
		|| !cfg.search.nearby.default_longitude.is_finite()
	{
		return Err(Error::Validation {
			message: "search.nearby default coordinates must be finite numbers.".to_string(),
		});
	}
	if cfg.throttle.free_interval_days <= 0 {
		return Err(Error::Validation {
			message: "throttle.free_interval_days must be greater than zero.".to_string(),
		});
	}
	if cfg.throttle.free_interval_days > MAX_INTERVAL_DAYS {
		return Err(Error::Validation {
			message: format!("throttle.free_interval_days must be at most {MAX_INTERVAL_DAYS}."),
		});
	}
	if !matches!(cfg.cache.backend.as_str(), "postgres" | "memory") {
		return Err(Error::Validation {
			message: "cache.backend must be one of postgres or memory.".to_string(),
		});
	}
	if cfg.worker.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "worker.poll_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.hours_refresh_after_days <= 0 {
		return Err(Error::Validation {
			message: "worker.hours_refresh_after_days must be greater than zero.".to_string(),
		});
	}
	if cfg.worker.hours_refresh_after_days > MAX_INTERVAL_DAYS {
		return Err(Error::Validation {
			message: format!("worker.hours_refresh_after_days must be at most {MAX_INTERVAL_DAYS}."),
		});
	}
	if cfg.worker.refresh_batch_size == 0 {
		return Err(Error::Validation {
			message: "worker.refresh_batch_size must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.providers.places.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.providers.places.api_key = None;
	}

	cfg.service.log_level = cfg.service.log_level.trim().to_string();

	if cfg.service.log_level.is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	cfg.cache.backend = cfg.cache.backend.trim().to_ascii_lowercase();
}
