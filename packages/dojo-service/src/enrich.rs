//! Detail enrichment against the freshness window.
//!
//! Identifiers already in the window's fetched set are served from the detail cache and never
//! refetched. Everything else is looked up in the detail cache first and fetched concurrently on a
//! miss; fetched details are cached, and every resolved identifier is added to the fetched set.

use std::collections::{HashMap, HashSet};

use futures::future;
use time::{Duration, OffsetDateTime};

use dojo_domain::place::{PlaceDetail, PlaceId};

use crate::{
	CacheStore, PlacesProvider,
	cache::{self, FetchedSet},
};

#[derive(Debug, Default)]
pub struct EnrichReport {
	/// Details in the order their identifiers were given.
	pub details: Vec<PlaceDetail>,
	pub from_cache: usize,
	pub fetched: usize,
	pub failed: usize,
	/// Covered by the fetched set but absent from the detail cache.
	pub missing: usize,
}

enum Resolved {
	Cached(PlaceDetail),
	Fetched(PlaceDetail),
	Failed,
}

/// Resolves `place_ids` to details, fetching each identifier at most once per detail TTL.
///
/// The fetched set is rewritten without locking. Concurrent runs may drop each other's additions;
/// the affected identifiers are then served from the detail cache on the next run.
pub async fn enrich(
	places: &dyn PlacesProvider,
	cache: &dyn CacheStore,
	place_ids: &[PlaceId],
	now: OffsetDateTime,
	ttl: Duration,
) -> EnrichReport {
	let fetched_key = cache::fetched_set_key(now, ttl);
	let mut fetched_set: FetchedSet =
		cache::read_json(cache, &fetched_key, now).await.unwrap_or_default();
	let mut unique = HashSet::new();
	let ordered: Vec<&PlaceId> = place_ids.iter().filter(|id| unique.insert(*id)).collect();
	let (covered, uncovered): (Vec<&PlaceId>, Vec<&PlaceId>) =
		ordered.iter().copied().partition(|id| fetched_set.place_ids.contains(*id));
	let expires_at = now + ttl;
	let cached = future::join_all(covered.iter().map(|id| load_cached(cache, id, now))).await;
	let resolved = future::join_all(
		uncovered.iter().map(|id| resolve_uncovered(places, cache, id, now, expires_at)),
	)
	.await;
	let mut report = EnrichReport::default();
	let mut by_id = HashMap::new();

	for (place_id, detail) in covered.iter().zip(cached) {
		match detail {
			Some(detail) => {
				report.from_cache += 1;

				by_id.insert(*place_id, detail);
			},
			None => {
				tracing::debug!(
					place_id = %place_id,
					"Identifier is in the fetched set but its detail is not cached. Skipping."
				);

				report.missing += 1;
			},
		}
	}

	let mut succeeded = Vec::new();

	for (place_id, resolved) in uncovered.iter().zip(resolved) {
		let detail = match resolved {
			Resolved::Cached(detail) => {
				report.from_cache += 1;

				detail
			},
			Resolved::Fetched(detail) => {
				report.fetched += 1;

				detail
			},
			Resolved::Failed => {
				report.failed += 1;

				continue;
			},
		};

		succeeded.push((*place_id).clone());
		by_id.insert(*place_id, detail);
	}

	if !succeeded.is_empty() {
		fetched_set.place_ids.extend(succeeded);

		cache::write_json(cache, &fetched_key, &fetched_set, now, Some(expires_at)).await;
	}

	report.details = ordered.iter().filter_map(|id| by_id.remove(*id)).collect();

	tracing::info!(
		requested = ordered.len(),
		from_cache = report.from_cache,
		fetched = report.fetched,
		failed = report.failed,
		missing = report.missing,
		"Detail enrichment finished."
	);

	report
}

async fn load_cached(
	cache: &dyn CacheStore,
	place_id: &PlaceId,
	now: OffsetDateTime,
) -> Option<PlaceDetail> {
	cache::read_json(cache, &cache::details_key(place_id), now).await
}

async fn resolve_uncovered(
	places: &dyn PlacesProvider,
	cache: &dyn CacheStore,
	place_id: &PlaceId,
	now: OffsetDateTime,
	expires_at: OffsetDateTime,
) -> Resolved {
	let key = cache::details_key(place_id);

	if let Some(detail) = cache::read_json(cache, &key, now).await {
		return Resolved::Cached(detail);
	}

	match places.place_details(place_id).await {
		Ok(detail) => {
			cache::write_json(cache, &key, &detail, now, Some(expires_at)).await;

			Resolved::Fetched(detail)
		},
		Err(err) => {
			tracing::warn!(place_id = %place_id, error = %err, "Place detail fetch failed.");

			Resolved::Failed
		},
	}
}
