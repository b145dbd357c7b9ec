mod support;

use time::{Duration, OffsetDateTime, macros::datetime};

use dojo_domain::place::{PlaceDetail, PlaceId, SearchArea};
use dojo_service::{
	CacheStore, Error,
	cache::{self, FetchedSet, MemoryCache},
	enrich, fanout,
};

use support::{
	BrokenCache, FakeBilling, FakePlaces, ScriptedPage, SpyPlaceStore, config, harness,
	harness_with_config,
};

const VANCOUVER_KEYWORDS: [&str; 3] = ["bjj", "grappling", "jiujitsu"];

fn vancouver_places() -> FakePlaces {
	FakePlaces::new()
		.with_ids("bjj", &["A", "B"])
		.with_ids("grappling", &["B", "C"])
		.with_ids("jiujitsu", &["A", "C"])
}

fn ids(details: &[PlaceDetail]) -> Vec<&str> {
	details.iter().map(|detail| detail.place_id.as_str()).collect()
}

#[tokio::test]
async fn vancouver_search_fetches_each_unique_place_once() {
	let h = harness(&VANCOUVER_KEYWORDS, vancouver_places(), FakeBilling::default());
	let dojos = h.service.find_by_query("Vancouver").await.expect("Search failed.");

	assert_eq!(ids(&dojos), vec!["A", "B", "C"]);
	assert_eq!(h.places.detail_calls(), 3);
	assert_eq!(h.places.search_calls(), 3);
	assert_eq!(
		h.places.areas()[0],
		SearchArea::Text { location: "Vancouver".to_string() }
	);
}

#[tokio::test]
async fn force_keyword_contributes_a_place_the_keywords_missed() {
	let mut cfg = config(&["bjj", "jiujitsu"]);

	cfg.search.force_keywords = vec!["Spartacus Gym".to_string()];

	let places = FakePlaces::new()
		.with_ids("bjj", &["A", "B"])
		.with_ids("jiujitsu", &["B", "C"])
		.with_ids("Spartacus Gym", &["S"]);
	let keywords = fanout::search_keywords(&cfg.search);
	let h = harness_with_config(cfg, places, FakeBilling::default(), SpyPlaceStore::default());

	assert_eq!(keywords, vec!["bjj", "jiujitsu", "Spartacus Gym"]);

	let dojos = h.service.find_by_query("Vancouver").await.expect("Search failed.");

	assert_eq!(ids(&dojos), vec!["A", "B", "C", "S"]);
	assert_eq!(h.places.search_calls(), 3);
	assert_eq!(h.places.detail_calls(), 4);
}

#[tokio::test]
async fn one_failing_detail_is_omitted_without_error() {
	let places = vancouver_places().failing_detail("B");
	let h = harness(&VANCOUVER_KEYWORDS, places, FakeBilling::default());
	let dojos = h.service.find_by_query("Vancouver").await.expect("Search failed.");

	assert_eq!(ids(&dojos), vec!["A", "C"]);
	assert_eq!(h.places.detail_calls(), 3);
}

#[tokio::test]
async fn repeated_search_in_the_same_window_is_served_from_cache() {
	let h = harness(&VANCOUVER_KEYWORDS, vancouver_places(), FakeBilling::default());
	let first = h.service.find_by_query("Vancouver").await.expect("First search failed.");
	let second = h.service.find_by_query("Vancouver").await.expect("Second search failed.");

	assert_eq!(first, second);
	assert_eq!(h.places.detail_calls(), 3);
}

#[tokio::test]
async fn failed_details_are_retried_on_the_next_run() {
	let places = vancouver_places().failing_detail("B");
	let h = harness(&VANCOUVER_KEYWORDS, places, FakeBilling::default());

	h.service.find_by_query("Vancouver").await.expect("First search failed.");
	h.service.find_by_query("Vancouver").await.expect("Second search failed.");

	assert_eq!(h.places.detail_calls(), 4);
}

#[tokio::test]
async fn missing_credential_fails_before_any_request() {
	let places = vancouver_places().without_credentials();
	let h = harness(&VANCOUVER_KEYWORDS, places, FakeBilling::default());
	let err = h.service.find_by_query("Vancouver").await.expect_err("Expected configuration error.");

	assert!(matches!(err, Error::Configuration { .. }));

	let err = h.service.find_nearby(49.0, -123.0, 1_000).await.expect_err("Expected error.");

	assert!(matches!(err, Error::Configuration { .. }));
	assert_eq!(h.places.search_calls(), 0);
	assert_eq!(h.places.detail_calls(), 0);
}

#[tokio::test]
async fn invalid_inputs_are_rejected() {
	let h = harness(&VANCOUVER_KEYWORDS, vancouver_places(), FakeBilling::default());

	for query in ["", "   "] {
		let err = h.service.find_by_query(query).await.expect_err("Expected invalid request.");

		assert!(matches!(err, Error::InvalidRequest { .. }));
	}
	for radius in [0, -5] {
		let err =
			h.service.find_nearby(49.0, -123.0, radius).await.expect_err("Expected invalid radius.");

		assert!(matches!(err, Error::InvalidRequest { .. }));
	}

	assert_eq!(h.places.search_calls(), 0);
}

#[tokio::test]
async fn no_identifiers_means_no_detail_requests() {
	let h = harness(&VANCOUVER_KEYWORDS, FakePlaces::new(), FakeBilling::default());
	let dojos = h.service.find_by_query("Nowhere").await.expect("Search failed.");

	assert!(dojos.is_empty());
	assert_eq!(h.places.detail_calls(), 0);
	assert!(h.cache.is_empty());
}

#[tokio::test]
async fn failing_keyword_keeps_pages_collected_before_the_failure() {
	let places = FakePlaces::new()
		.with_pages("bjj", vec![
			ScriptedPage::Ids(vec!["A"]),
			ScriptedPage::Status("OVER_QUERY_LIMIT"),
		])
		.with_pages("grappling", vec![ScriptedPage::Status("REQUEST_DENIED")])
		.with_ids("jiujitsu", &["B"]);
	let keywords: Vec<String> = VANCOUVER_KEYWORDS.iter().map(|k| k.to_string()).collect();
	let area = SearchArea::Text { location: "Vancouver".to_string() };
	let report = fanout::fan_out(&places, &keywords, &area, 5).await;

	assert_eq!(report.place_ids, vec![PlaceId::from("A"), PlaceId::from("B")]);
	assert_eq!(report.failed_keywords, vec!["bjj".to_string(), "grappling".to_string()]);
	assert_eq!(report.pages, 2);
}

#[tokio::test]
async fn pagination_stops_at_the_page_cap_and_dedupes() {
	let pages = vec![
		ScriptedPage::Ids(vec!["A", "B"]),
		ScriptedPage::Ids(vec!["B", "C"]),
		ScriptedPage::Ids(vec!["D"]),
		ScriptedPage::Ids(vec!["E"]),
	];
	let places = FakePlaces::new().with_pages("bjj", pages);
	let keywords = vec!["bjj".to_string()];
	let area = SearchArea::Radius { latitude: 49.0, longitude: -123.0, radius_m: 1_000 };
	let report = fanout::fan_out(&places, &keywords, &area, 3).await;
	let found: Vec<&str> = report.place_ids.iter().map(PlaceId::as_str).collect();

	assert_eq!(found, vec!["A", "B", "C", "D"]);
	assert_eq!(places.search_calls(), 3);
}

#[tokio::test]
async fn nearby_search_uses_the_nearby_page_cap() {
	let pages = (0..5).map(|_| ScriptedPage::Ids(vec!["A"])).collect();
	let places = FakePlaces::new().with_pages("bjj", pages);
	let h = harness(&["bjj"], places, FakeBilling::default());

	h.service.find_nearby(49.0, -123.0, 5_000).await.expect("Nearby search failed.");

	assert_eq!(h.places.search_calls(), 3);
}

#[tokio::test]
async fn fully_covered_identifiers_make_no_detail_requests() {
	let places = FakePlaces::new();
	let cache = MemoryCache::new();
	let now = OffsetDateTime::now_utc();
	let ttl = Duration::hours(24);
	let place_ids = vec![PlaceId::from("A"), PlaceId::from("B")];
	let first = enrich::enrich(&places, &cache, &place_ids, now, ttl).await;
	let second = enrich::enrich(&places, &cache, &place_ids, now, ttl).await;

	assert_eq!(first.fetched, 2);
	assert_eq!(second.fetched, 0);
	assert_eq!(second.from_cache, 2);
	assert_eq!(second.details, first.details);
	assert_eq!(places.detail_calls(), 2);
}

#[tokio::test]
async fn covered_identifier_without_cached_detail_is_skipped() {
	let places = FakePlaces::new();
	let cache = MemoryCache::new();
	let now = OffsetDateTime::now_utc();
	let ttl = Duration::hours(24);
	let covered = FetchedSet { place_ids: [PlaceId::from("A")].into_iter().collect() };

	cache
		.set(
			&cache::fetched_set_key(now, ttl),
			serde_json::to_value(&covered).expect("Failed to encode fetched set."),
			now,
			Some(now + ttl),
		)
		.await
		.expect("Failed to seed fetched set.");

	let report =
		enrich::enrich(&places, &cache, &[PlaceId::from("A"), PlaceId::from("B")], now, ttl).await;

	assert_eq!(ids(&report.details), vec!["B"]);
	assert_eq!(report.missing, 1);
	assert_eq!(places.detail_calls(), 1);
}

#[tokio::test]
async fn cached_detail_is_reused_across_a_window_boundary() {
	let places = FakePlaces::new();
	let cache = MemoryCache::new();
	let before_midnight = datetime!(2025-05-28 23:59:59 UTC);
	let ttl = Duration::hours(24);
	let place_ids = vec![PlaceId::from("A")];
	let first = enrich::enrich(&places, &cache, &place_ids, before_midnight, ttl).await;
	let after_midnight = before_midnight + Duration::seconds(2);

	assert_ne!(
		cache::fetched_set_key(before_midnight, ttl),
		cache::fetched_set_key(after_midnight, ttl)
	);

	let second = enrich::enrich(&places, &cache, &place_ids, after_midnight, ttl).await;

	assert_eq!(places.detail_calls(), 1);
	assert_eq!(second.from_cache, 1);
	assert_eq!(second.fetched, 0);
	assert_eq!(second.details, first.details);

	let third = enrich::enrich(&places, &cache, &place_ids, after_midnight, ttl).await;

	assert_eq!(third.from_cache, 1);
	assert_eq!(third.missing, 0);
	assert_eq!(places.detail_calls(), 1);
}

#[tokio::test]
async fn expired_details_are_refetched() {
	let places = FakePlaces::new();
	let cache = MemoryCache::new();
	let now = OffsetDateTime::now_utc();
	let ttl = Duration::hours(24);
	let place_ids = vec![PlaceId::from("A")];

	enrich::enrich(&places, &cache, &place_ids, now, ttl).await;
	enrich::enrich(&places, &cache, &place_ids, now + ttl, ttl).await;

	assert_eq!(places.detail_calls(), 2);
}

#[tokio::test]
async fn cache_failures_do_not_fail_enrichment() {
	let places = FakePlaces::new();
	let now = OffsetDateTime::now_utc();
	let report = enrich::enrich(
		&places,
		&BrokenCache,
		&[PlaceId::from("A"), PlaceId::from("B")],
		now,
		Duration::hours(24),
	)
	.await;

	assert_eq!(ids(&report.details), vec!["A", "B"]);
	assert_eq!(report.fetched, 2);
}

#[tokio::test]
async fn single_place_details_reuse_the_detail_cache() {
	let h = harness(&VANCOUVER_KEYWORDS, vancouver_places(), FakeBilling::default());

	h.service.find_by_query("Vancouver").await.expect("Search failed.");

	let detail = h.service.place_details("A").await.expect("Detail lookup failed.");

	assert_eq!(detail.place_id.as_str(), "A");
	assert_eq!(h.places.detail_calls(), 3);

	let fresh = h.service.place_details("Z").await.expect("Detail lookup failed.");

	assert_eq!(fresh.name, "Dojo Z");
	assert_eq!(h.places.detail_calls(), 4);
}

#[tokio::test]
async fn unknown_place_is_not_found() {
	let places = FakePlaces::new().failing_detail("gone");
	let h = harness(&VANCOUVER_KEYWORDS, places, FakeBilling::default());
	let err = h.service.place_details("gone").await.expect_err("Expected not found.");

	assert!(matches!(err, Error::NotFound { .. }));
}
