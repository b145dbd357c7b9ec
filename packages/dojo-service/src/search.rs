//! Throttled search entry points used by the HTTP surface.

use futures::future;
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use dojo_domain::{
	place::PlaceDetail,
	throttle::{self, Language, ThrottleDecision},
};

use crate::{DojoService, Result};

#[derive(Clone, Debug)]
pub struct Caller {
	/// `None` for anonymous callers.
	pub caller_id: Option<String>,
	pub language: Language,
}
impl Caller {
	pub fn anonymous() -> Self {
		Self { caller_id: None, language: Language::English }
	}

	pub fn new(caller_id: Option<String>, language: Language) -> Self {
		let caller_id = caller_id.map(|id| id.trim().to_string()).filter(|id| !id.is_empty());

		Self { caller_id, language }
	}
}

/// Nearby search input. Missing fields fall back to `search.nearby`.
#[derive(Clone, Debug, Default)]
pub struct NearbyQuery {
	pub latitude: Option<f64>,
	pub longitude: Option<f64>,
	pub radius_m: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ThrottleNotice {
	pub interval_days: i64,
	pub retry_after_seconds: i64,
	pub message: String,
}
impl ThrottleNotice {
	fn new(interval: Duration, retry_after: Duration, language: Language) -> Self {
		let interval_days = interval.whole_days();
		// Rounded up to whole seconds.
		let retry_after_seconds = (retry_after.whole_milliseconds() as i64 + 999) / 1_000;

		Self {
			interval_days,
			retry_after_seconds,
			message: throttle::throttle_message(interval_days, language),
		}
	}
}

#[derive(Debug)]
pub enum SearchOutcome {
	Results(Vec<PlaceDetail>),
	Throttled(ThrottleNotice),
}

impl DojoService {
	pub async fn search_by_query(&self, caller: &Caller, query: &str) -> Result<SearchOutcome> {
		let now = OffsetDateTime::now_utc();
		let caller_id = caller.caller_id.as_deref();
		let check = self.check_throttle(caller_id, now).await?;

		if let ThrottleDecision::Throttled { interval, retry_after } = check.decision {
			return Ok(SearchOutcome::Throttled(ThrottleNotice::new(
				interval,
				retry_after,
				caller.language,
			)));
		}

		let dojos = self.find_by_query_at(query, now).await?;

		self.record_search(caller_id, &check, now).await;
		self.persist(&dojos, now).await;

		Ok(SearchOutcome::Results(dojos))
	}

	pub async fn search_nearby(&self, caller: &Caller, query: &NearbyQuery) -> Result<SearchOutcome> {
		let now = OffsetDateTime::now_utc();
		let caller_id = caller.caller_id.as_deref();
		let check = self.check_throttle(caller_id, now).await?;

		if let ThrottleDecision::Throttled { interval, retry_after } = check.decision {
			return Ok(SearchOutcome::Throttled(ThrottleNotice::new(
				interval,
				retry_after,
				caller.language,
			)));
		}

		let defaults = &self.cfg.search.nearby;
		let dojos = self
			.find_nearby_at(
				query.latitude.unwrap_or(defaults.default_latitude),
				query.longitude.unwrap_or(defaults.default_longitude),
				query.radius_m.unwrap_or(i64::from(defaults.default_radius_m)),
				now,
			)
			.await?;

		self.record_search(caller_id, &check, now).await;
		self.persist(&dojos, now).await;

		Ok(SearchOutcome::Results(dojos))
	}

	async fn persist(&self, dojos: &[PlaceDetail], now: OffsetDateTime) {
		let places = self.stores.places.as_ref();
		let results =
			future::join_all(dojos.iter().map(|detail| places.upsert_place(detail, now))).await;

		for (detail, result) in dojos.iter().zip(results) {
			if let Err(err) = result {
				tracing::warn!(place_id = %detail.place_id, error = %err, "Failed to persist dojo.");
			}
		}
	}
}
