//! Aggregation runs: credential check, keyword fan-out, then detail enrichment.

use time::OffsetDateTime;

use dojo_domain::place::{PlaceDetail, PlaceId, SearchArea};
use dojo_providers::Error as ProviderError;

use crate::{
	DojoService, Error, Result, cache,
	enrich::{self, EnrichReport},
	fanout,
};

impl DojoService {
	/// Dojos around a free-text location such as `"Vancouver"`.
	pub async fn find_by_query(&self, query: &str) -> Result<Vec<PlaceDetail>> {
		self.find_by_query_at(query, OffsetDateTime::now_utc()).await
	}

	pub async fn find_nearby(
		&self,
		latitude: f64,
		longitude: f64,
		radius_m: i64,
	) -> Result<Vec<PlaceDetail>> {
		self.find_nearby_at(latitude, longitude, radius_m, OffsetDateTime::now_utc()).await
	}

	/// One place, served from the detail cache when possible.
	pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetail> {
		self.place_details_at(place_id, OffsetDateTime::now_utc()).await
	}

	pub(crate) async fn find_by_query_at(
		&self,
		query: &str,
		now: OffsetDateTime,
	) -> Result<Vec<PlaceDetail>> {
		self.ensure_credentials()?;

		let location = query.trim();

		if location.is_empty() {
			return Err(Error::InvalidRequest { message: "query must be non-empty.".to_string() });
		}

		let area = SearchArea::Text { location: location.to_string() };

		Ok(self.aggregate(&area, now).await.details)
	}

	pub(crate) async fn find_nearby_at(
		&self,
		latitude: f64,
		longitude: f64,
		radius_m: i64,
		now: OffsetDateTime,
	) -> Result<Vec<PlaceDetail>> {
		self.ensure_credentials()?;

		if !latitude.is_finite() || !longitude.is_finite() {
			return Err(Error::InvalidRequest {
				message: "lat and lng must be finite numbers.".to_string(),
			});
		}

		let radius_m = u32::try_from(radius_m).ok().filter(|radius| *radius > 0).ok_or_else(|| {
			Error::InvalidRequest {
				message: format!("radius must be a positive number of meters, got {radius_m}."),
			}
		})?;
		let area = SearchArea::Radius { latitude, longitude, radius_m };

		Ok(self.aggregate(&area, now).await.details)
	}

	pub(crate) async fn place_details_at(
		&self,
		place_id: &str,
		now: OffsetDateTime,
	) -> Result<PlaceDetail> {
		self.ensure_credentials()?;

		let place_id = place_id.trim();

		if place_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "place_id must be non-empty.".to_string(),
			});
		}

		let place_id = PlaceId::from(place_id);
		let cache_store = self.stores.cache.as_ref();
		let key = cache::details_key(&place_id);

		if let Some(detail) = cache::read_json::<PlaceDetail>(cache_store, &key, now).await {
			return Ok(detail);
		}

		match self.providers.places.place_details(&place_id).await {
			Ok(detail) => {
				cache::write_json(cache_store, &key, &detail, now, Some(now + self.detail_ttl()))
					.await;

				Ok(detail)
			},
			Err(ProviderError::ExternalApi { status, .. })
				if matches!(status.as_str(), "NOT_FOUND" | "INVALID_REQUEST" | "ZERO_RESULTS") =>
				Err(Error::NotFound { message: format!("place {place_id}") }),
			Err(ProviderError::InvalidResponse { message }) => {
				tracing::warn!(place_id = %place_id, %message, "Place detail is unusable.");

				Err(Error::NotFound { message: format!("place {place_id}") })
			},
			Err(err) => Err(err.into()),
		}
	}

	async fn aggregate(&self, area: &SearchArea, now: OffsetDateTime) -> EnrichReport {
		let places = self.providers.places.as_ref();
		let keywords = fanout::search_keywords(&self.cfg.search);
		let max_pages = fanout::max_pages(&self.cfg.search, area);
		let fan_out = fanout::fan_out(places, &keywords, area, max_pages).await;

		if fan_out.place_ids.is_empty() {
			return EnrichReport::default();
		}

		enrich::enrich(places, self.stores.cache.as_ref(), &fan_out.place_ids, now, self.detail_ttl())
			.await
	}

	fn ensure_credentials(&self) -> Result<()> {
		if self.providers.places.has_credentials() {
			return Ok(());
		}

		Err(Error::Configuration { message: "providers.places.api_key is not configured.".to_string() })
	}
}
