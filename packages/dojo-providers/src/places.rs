//! Client for the Places web service.
//!
//! Every request passes through one [`RateLimiter`]. Responses are classified by their `status`
//! field: `OK` is data, `ZERO_RESULTS` is an empty result, anything else is a hard
//! [`Error::ExternalApi`]. Nothing is retried here.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::time::{self, Instant};

use dojo_config::PlacesProviderConfig;
use dojo_domain::place::{
	PlaceDetail, PlaceId, ReviewSnippet, SearchArea, UNKNOWN_PLACE_NAME, WeeklyHours,
};

use crate::{Error, Result, rate_limit::RateLimiter};

/// Continuation tokens are rejected upstream until this long after they are issued.
pub const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(2);

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";
const DETAIL_FIELDS: &str = "name,formatted_address,geometry/location,opening_hours,website,rating,user_ratings_total,reviews";

#[derive(Clone, Debug)]
pub struct PageToken {
	value: String,
	ready_at: Instant,
}
impl PageToken {
	pub fn new(value: impl Into<String>, issued_at: Instant) -> Self {
		Self { value: value.into(), ready_at: issued_at + PAGE_TOKEN_DELAY }
	}

	pub fn value(&self) -> &str {
		&self.value
	}

	pub fn ready_at(&self) -> Instant {
		self.ready_at
	}
}

#[derive(Debug, Default)]
pub struct SearchPage {
	pub place_ids: Vec<PlaceId>,
	pub next_page_token: Option<PageToken>,
}

pub struct PlacesClient {
	http: Client,
	api_base: String,
	api_key: Option<String>,
	limiter: RateLimiter,
}
impl PlacesClient {
	pub fn new(cfg: &PlacesProviderConfig) -> Result<Self> {
		let http = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::default_headers(&cfg.default_headers)?)
			.build()?;

		Ok(Self {
			http,
			api_base: cfg.api_base.trim_end_matches('/').to_string(),
			api_key: cfg.api_key.clone().filter(|key| !key.trim().is_empty()),
			limiter: RateLimiter::new(Duration::from_millis(cfg.rate_limit_ms)),
		})
	}

	pub fn has_api_key(&self) -> bool {
		self.api_key.is_some()
	}

	/// Issues one rate-limited GET and classifies the response status.
	///
	/// Returns `Ok(None)` for `ZERO_RESULTS`.
	pub async fn fetch(
		&self,
		endpoint: &str,
		params: &[(&str, String)],
		context: &str,
	) -> Result<Option<Value>> {
		let api_key = self.api_key.as_deref().ok_or(Error::MissingApiKey)?;
		let url = format!("{}/{endpoint}/json", self.api_base);

		self.limiter.acquire().await;

		let res = self.http.get(url).query(params).query(&[("key", api_key)]).send().await?;
		let json: Value = res.error_for_status()?.json().await?;
		let status = response_status(&json).to_string();

		match status.as_str() {
			STATUS_OK => Ok(Some(json)),
			STATUS_ZERO_RESULTS => Ok(None),
			_ => {
				tracing::debug!(%status, context, "Places API returned a hard status.");

				Err(Error::ExternalApi { status, context: context.to_string() })
			},
		}
	}

	/// Fetches one page of search results.
	///
	/// A continuation token is only sent once its readiness delay has elapsed.
	pub async fn search_page(
		&self,
		keyword: &str,
		area: &SearchArea,
		page_token: Option<&PageToken>,
	) -> Result<SearchPage> {
		let endpoint = match area {
			SearchArea::Text { .. } => "textsearch",
			SearchArea::Radius { .. } => "nearbysearch",
		};
		let params = match page_token {
			Some(token) => {
				time::sleep_until(token.ready_at()).await;

				vec![("pagetoken", token.value().to_string())]
			},
			None => search_params(keyword, area),
		};
		let context = format!("{endpoint} keyword={keyword:?}");
		let Some(json) = self.fetch(endpoint, &params, &context).await? else {
			return Ok(SearchPage::default());
		};

		Ok(parse_search_page(&json, Instant::now()))
	}

	pub async fn place_details(&self, place_id: &PlaceId) -> Result<PlaceDetail> {
		let params =
			[("place_id", place_id.as_str().to_string()), ("fields", DETAIL_FIELDS.to_string())];
		let context = format!("details place_id={place_id}");

		match self.fetch("details", &params, &context).await? {
			Some(json) => parse_place_detail(place_id, &json),
			None => Err(Error::ExternalApi { status: STATUS_ZERO_RESULTS.to_string(), context }),
		}
	}
}

fn search_params(keyword: &str, area: &SearchArea) -> Vec<(&'static str, String)> {
	match area {
		SearchArea::Text { location } => vec![("query", format!("{keyword} in {location}"))],
		SearchArea::Radius { latitude, longitude, radius_m } => vec![
			("location", format!("{latitude},{longitude}")),
			("radius", radius_m.to_string()),
			("keyword", keyword.to_string()),
		],
	}
}

fn response_status(json: &Value) -> &str {
	json.get("status").and_then(Value::as_str).unwrap_or("MISSING_STATUS")
}

fn parse_search_page(json: &Value, received_at: Instant) -> SearchPage {
	let place_ids = json
		.get("results")
		.and_then(Value::as_array)
		.map(|results| {
			results
				.iter()
				.filter_map(|item| item.get("place_id").and_then(Value::as_str))
				.filter(|id| !id.is_empty())
				.map(PlaceId::from)
				.collect()
		})
		.unwrap_or_default();
	let next_page_token = json
		.get("next_page_token")
		.and_then(Value::as_str)
		.filter(|token| !token.is_empty())
		.map(|token| PageToken::new(token, received_at));

	SearchPage { place_ids, next_page_token }
}

fn parse_place_detail(place_id: &PlaceId, json: &Value) -> Result<PlaceDetail> {
	let result = json.get("result").ok_or_else(|| Error::InvalidResponse {
		message: format!("Place details for {place_id} are missing the result object."),
	})?;
	let location = result.get("geometry").and_then(|geometry| geometry.get("location"));
	let coordinate = |axis: &str| {
		location.and_then(|loc| loc.get(axis)).and_then(Value::as_f64).ok_or_else(|| {
			Error::InvalidResponse {
				message: format!("Place details for {place_id} are missing {axis}."),
			}
		})
	};
	let latitude = coordinate("lat")?;
	let longitude = coordinate("lng")?;
	let hours = result
		.get("opening_hours")
		.and_then(|hours| hours.get("weekday_text"))
		.and_then(Value::as_array)
		.map(|lines| lines.iter().filter_map(Value::as_str).map(str::to_string).collect());
	let reviews = result
		.get("reviews")
		.and_then(Value::as_array)
		.map(|items| {
			items
				.iter()
				.filter_map(|item| serde_json::from_value::<ReviewSnippet>(item.clone()).ok())
				.collect()
		})
		.unwrap_or_default();

	Ok(PlaceDetail {
		place_id: place_id.clone(),
		name: string_field(result, "name").unwrap_or_else(|| UNKNOWN_PLACE_NAME.to_string()),
		address: string_field(result, "formatted_address").unwrap_or_default(),
		latitude,
		longitude,
		website: string_field(result, "website"),
		hours: WeeklyHours::from_upstream(hours),
		rating: result.get("rating").and_then(Value::as_f64),
		rating_count: result.get("user_ratings_total").and_then(Value::as_i64),
		reviews,
	})
}

fn string_field(value: &Value, key: &str) -> Option<String> {
	value.get(key).and_then(Value::as_str).filter(|raw| !raw.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_search_page_ids_and_token() {
		let json = serde_json::json!({
			"status": "OK",
			"results": [
				{ "place_id": "a", "name": "Alpha BJJ" },
				{ "name": "No id" },
				{ "place_id": "b" }
			],
			"next_page_token": "tok-1"
		});
		let received_at = Instant::now();
		let page = parse_search_page(&json, received_at);

		assert_eq!(page.place_ids, vec![PlaceId::from("a"), PlaceId::from("b")]);

		let token = page.next_page_token.expect("token missing");

		assert_eq!(token.value(), "tok-1");
		assert_eq!(token.ready_at(), received_at + PAGE_TOKEN_DELAY);
	}

	#[test]
	fn last_page_has_no_token() {
		let json = serde_json::json!({ "status": "OK", "results": [], "next_page_token": "" });
		let page = parse_search_page(&json, Instant::now());

		assert!(page.place_ids.is_empty());
		assert!(page.next_page_token.is_none());
	}

	#[test]
	fn parses_place_detail_fields() {
		let json = serde_json::json!({
			"status": "OK",
			"result": {
				"name": "Spartacus Gym",
				"formatted_address": "1 Main St, Vancouver",
				"geometry": { "location": { "lat": 49.28, "lng": -123.12 } },
				"opening_hours": { "weekday_text": ["Monday: 6:00 – 21:00"] },
				"website": "https://spartacus.example",
				"rating": 4.7,
				"user_ratings_total": 88,
				"reviews": [
					{ "author_name": "Ken", "rating": 5, "text": "Great mats." },
					"not an object"
				]
			}
		});
		let detail = parse_place_detail(&PlaceId::from("sp"), &json).expect("parse failed");

		assert_eq!(detail.name, "Spartacus Gym");
		assert_eq!(detail.latitude, 49.28);
		assert_eq!(detail.longitude, -123.12);
		assert_eq!(detail.hours, WeeklyHours::Listed(vec!["Monday: 6:00 – 21:00".to_string()]));
		assert_eq!(detail.rating_count, Some(88));
		assert_eq!(detail.reviews.len(), 1);
		assert_eq!(detail.reviews[0].author_name.as_deref(), Some("Ken"));
	}

	#[test]
	fn detail_without_hours_uses_sentinel_and_defaults() {
		let json = serde_json::json!({
			"status": "OK",
			"result": { "geometry": { "location": { "lat": 1.5, "lng": 2.5 } } }
		});
		let detail = parse_place_detail(&PlaceId::from("x"), &json).expect("parse failed");

		assert_eq!(detail.hours, WeeklyHours::Unavailable);
		assert_eq!(detail.name, UNKNOWN_PLACE_NAME);
		assert_eq!(detail.address, "");
		assert!(detail.website.is_none());
		assert!(detail.reviews.is_empty());
	}

	#[test]
	fn detail_without_coordinates_is_invalid() {
		let json = serde_json::json!({ "status": "OK", "result": { "name": "Nowhere" } });
		let err = parse_place_detail(&PlaceId::from("x"), &json).expect_err("expected error");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}

	#[test]
	fn radius_search_params_carry_location_and_keyword() {
		let area = SearchArea::Radius { latitude: 49.2827, longitude: -123.1207, radius_m: 30_000 };
		let params = search_params("bjj", &area);

		assert_eq!(params, vec![
			("location", "49.2827,-123.1207".to_string()),
			("radius", "30000".to_string()),
			("keyword", "bjj".to_string()),
		]);

		let area = SearchArea::Text { location: "Vancouver".to_string() };

		assert_eq!(search_params("grappling", &area), vec![(
			"query",
			"grappling in Vancouver".to_string()
		)]);
	}
}
