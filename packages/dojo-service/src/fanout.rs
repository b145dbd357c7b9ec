//! Keyword fan-out: one paginated search per keyword, all keywords concurrently.

use std::collections::HashSet;

use futures::future;

use dojo_config::Search;
use dojo_domain::place::{PlaceId, SearchArea};
use dojo_providers::places::PageToken;

use crate::PlacesProvider;

#[derive(Debug, Default)]
pub struct FanOutReport {
	/// Unique identifiers in first-seen order.
	pub place_ids: Vec<PlaceId>,
	pub keywords: usize,
	pub pages: usize,
	pub failed_keywords: Vec<String>,
}

/// Configured keywords followed by the force-include keywords, trimmed, blanks and repeats dropped.
pub fn search_keywords(cfg: &Search) -> Vec<String> {
	let mut seen = HashSet::new();

	cfg.keywords
		.iter()
		.chain(cfg.force_keywords.iter())
		.map(|keyword| keyword.trim())
		.filter(|keyword| !keyword.is_empty())
		.filter(|keyword| seen.insert(keyword.to_lowercase()))
		.map(str::to_string)
		.collect()
}

pub fn max_pages(cfg: &Search, area: &SearchArea) -> u32 {
	match area {
		SearchArea::Text { .. } => cfg.query_max_pages,
		SearchArea::Radius { .. } => cfg.nearby_max_pages,
	}
}

/// Runs every keyword against `area`. A failing keyword keeps what it found before the failure.
pub async fn fan_out(
	places: &dyn PlacesProvider,
	keywords: &[String],
	area: &SearchArea,
	max_pages: u32,
) -> FanOutReport {
	let branches = keywords.iter().map(|keyword| search_keyword(places, keyword, area, max_pages));
	let outcomes = future::join_all(branches).await;
	let mut seen = HashSet::new();
	let mut report = FanOutReport { keywords: keywords.len(), ..Default::default() };

	for outcome in outcomes {
		report.pages += outcome.pages;

		if outcome.failed {
			report.failed_keywords.push(outcome.keyword.to_string());
		}

		for place_id in outcome.place_ids {
			if seen.insert(place_id.clone()) {
				report.place_ids.push(place_id);
			}
		}
	}

	tracing::info!(
		area = area.kind(),
		keywords = report.keywords,
		pages = report.pages,
		failed = report.failed_keywords.len(),
		unique = report.place_ids.len(),
		"Keyword fan-out finished."
	);

	report
}

struct KeywordOutcome<'a> {
	keyword: &'a str,
	place_ids: Vec<PlaceId>,
	pages: usize,
	failed: bool,
}

async fn search_keyword<'a>(
	places: &dyn PlacesProvider,
	keyword: &'a str,
	area: &SearchArea,
	max_pages: u32,
) -> KeywordOutcome<'a> {
	let mut outcome = KeywordOutcome { keyword, place_ids: Vec::new(), pages: 0, failed: false };
	let mut token: Option<PageToken> = None;

	while outcome.pages < max_pages as usize {
		let page = match places.search_page(keyword, area, token.as_ref()).await {
			Ok(page) => page,
			Err(err) => {
				tracing::warn!(
					keyword,
					page = outcome.pages + 1,
					error = %err,
					"Keyword search failed. Keeping identifiers collected so far."
				);

				outcome.failed = true;

				break;
			},
		};

		outcome.pages += 1;
		outcome.place_ids.extend(page.place_ids);

		match page.next_page_token {
			Some(next) => token = Some(next),
			None => break,
		}
	}

	outcome
}
