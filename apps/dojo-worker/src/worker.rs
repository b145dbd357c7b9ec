//! Background maintenance: weekly-hours refresh for stored dojos and cache expiry.

use std::{sync::Arc, time::Duration as StdDuration};

use time::{Duration, OffsetDateTime};
use tokio::time as tokio_time;

use dojo_domain::place::PlaceId;
use dojo_providers::Error as ProviderError;
use dojo_service::PlacesProvider;
use dojo_storage::{cache, db::Db, queries};

use crate::Result;

pub struct WorkerState {
	pub db: Arc<Db>,
	pub places: Arc<dyn PlacesProvider>,
	pub cfg: dojo_config::Worker,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RefreshReport {
	pub checked: usize,
	pub updated: usize,
	pub skipped: usize,
	pub failed: usize,
}

pub async fn run_worker(state: WorkerState) -> color_eyre::Result<()> {
	let poll_interval = StdDuration::from_millis(state.cfg.poll_interval_ms);

	if !state.places.has_credentials() {
		tracing::warn!("providers.places.api_key is not set. Hours refresh is disabled.");
	}

	loop {
		let now = OffsetDateTime::now_utc();

		match refresh_stale_hours_once(&state, now).await {
			Ok(report) if report.checked > 0 => tracing::info!(
				checked = report.checked,
				updated = report.updated,
				skipped = report.skipped,
				failed = report.failed,
				"Hours refresh pass finished."
			),
			Ok(_) => {},
			Err(err) => tracing::error!(error = %err, "Hours refresh pass failed."),
		}

		match cache::purge_expired_cache(&state.db, now).await {
			Ok(0) => {},
			Ok(purged) => tracing::info!(purged, "Purged expired cache rows."),
			Err(err) => tracing::error!(error = %err, "Cache purge failed."),
		}

		tokio_time::sleep(poll_interval).await;
	}
}

/// Refreshes one batch of dojos whose hours are older than `hours_refresh_after_days`.
///
/// Transport failures leave the row untouched so it is retried next pass. Hard upstream statuses
/// mark the row as checked so a vanished place does not block the batch.
pub async fn refresh_stale_hours_once(
	state: &WorkerState,
	now: OffsetDateTime,
) -> Result<RefreshReport> {
	if !state.places.has_credentials() {
		return Ok(RefreshReport::default());
	}

	let cutoff = now - Duration::days(state.cfg.hours_refresh_after_days);
	let stale = queries::list_stale_dojos(&state.db, cutoff, state.cfg.refresh_batch_size).await?;
	let mut report = RefreshReport { checked: stale.len(), ..Default::default() };

	for dojo in stale {
		let place_id = PlaceId::new(dojo.place_id);

		match state.places.place_details(&place_id).await {
			Ok(detail) => {
				queries::update_dojo_hours(&state.db, place_id.as_str(), &detail.hours, now).await?;

				report.updated += 1;
			},
			Err(err @ (ProviderError::ExternalApi { .. } | ProviderError::InvalidResponse { .. })) => {
				tracing::warn!(place_id = %place_id, error = %err, "Hours refresh skipped.");
				queries::mark_hours_checked(&state.db, place_id.as_str(), now).await?;

				report.skipped += 1;
			},
			Err(err) => {
				tracing::warn!(place_id = %place_id, error = %err, "Hours refresh failed.");

				report.failed += 1;
			},
		}
	}

	Ok(report)
}
