use time::OffsetDateTime;
use uuid::Uuid;

use dojo_domain::{
	place::{PlaceDetail, WeeklyHours},
	throttle::{BillingAccount, SubscriptionRecord, SubscriptionStatus},
};

use crate::{
	Error, Result,
	db::Db,
	models::{DojoRow, StaleDojo, SubscriptionRow},
};

/// Inserts or refreshes a place keyed on `place_id`. `created_at` survives updates.
pub async fn upsert_dojo(db: &Db, detail: &PlaceDetail, now: OffsetDateTime) -> Result<()> {
	let hours = serde_json::to_value(&detail.hours)?;
	let reviews = serde_json::to_value(&detail.reviews)?;

	sqlx::query(
		"\
INSERT INTO dojos (
	dojo_id,
	place_id,
	name,
	address,
	latitude,
	longitude,
	website,
	hours,
	rating,
	rating_count,
	reviews,
	created_at,
	updated_at,
	hours_refreshed_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12, $12)
ON CONFLICT (place_id) DO UPDATE
SET
	name = EXCLUDED.name,
	address = EXCLUDED.address,
	latitude = EXCLUDED.latitude,
	longitude = EXCLUDED.longitude,
	website = EXCLUDED.website,
	hours = EXCLUDED.hours,
	rating = EXCLUDED.rating,
	rating_count = EXCLUDED.rating_count,
	reviews = EXCLUDED.reviews,
	updated_at = EXCLUDED.updated_at,
	hours_refreshed_at = EXCLUDED.hours_refreshed_at",
	)
	.bind(Uuid::new_v4())
	.bind(detail.place_id.as_str())
	.bind(detail.name.as_str())
	.bind(detail.address.as_str())
	.bind(detail.latitude)
	.bind(detail.longitude)
	.bind(detail.website.as_deref())
	.bind(hours)
	.bind(detail.rating)
	.bind(detail.rating_count)
	.bind(reviews)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn get_dojo(db: &Db, place_id: &str) -> Result<Option<DojoRow>> {
	let row = sqlx::query_as::<_, DojoRow>(
		"\
SELECT
	dojo_id,
	place_id,
	name,
	address,
	latitude,
	longitude,
	website,
	hours,
	rating,
	rating_count,
	reviews,
	created_at,
	updated_at,
	hours_refreshed_at
FROM dojos
WHERE place_id = $1",
	)
	.bind(place_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(row)
}

/// Oldest-first places whose hours were last refreshed before `cutoff`.
pub async fn list_stale_dojos(
	db: &Db,
	cutoff: OffsetDateTime,
	limit: u32,
) -> Result<Vec<StaleDojo>> {
	if limit == 0 {
		return Err(Error::InvalidArgument("limit must be greater than zero.".to_string()));
	}

	let rows = sqlx::query_as::<_, StaleDojo>(
		"\
SELECT place_id, hours_refreshed_at
FROM dojos
WHERE hours_refreshed_at < $1
ORDER BY hours_refreshed_at ASC
LIMIT $2",
	)
	.bind(cutoff)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

pub async fn update_dojo_hours(
	db: &Db,
	place_id: &str,
	hours: &WeeklyHours,
	now: OffsetDateTime,
) -> Result<()> {
	let hours = serde_json::to_value(hours)?;
	let result = sqlx::query(
		"\
UPDATE dojos
SET hours = $1, hours_refreshed_at = $2, updated_at = $2
WHERE place_id = $3",
	)
	.bind(hours)
	.bind(now)
	.bind(place_id)
	.execute(&db.pool)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::NotFound(format!("dojo {place_id}")));
	}

	Ok(())
}

/// Billing identity synchronized by the billing webhook. `None` means the caller never registered.
pub async fn find_billing_account(db: &Db, caller_id: &str) -> Result<Option<BillingAccount>> {
	let customer: Option<(String,)> =
		sqlx::query_as("SELECT customer_id FROM billing_customers WHERE caller_id = $1")
			.bind(caller_id)
			.fetch_optional(&db.pool)
			.await?;
	let Some((customer_id,)) = customer else {
		return Ok(None);
	};
	let rows = sqlx::query_as::<_, SubscriptionRow>(
		"\
SELECT subscription_id, status, current_period_end
FROM subscriptions
WHERE customer_id = $1
ORDER BY current_period_end DESC",
	)
	.bind(customer_id.as_str())
	.fetch_all(&db.pool)
	.await?;
	let subscriptions = rows
		.into_iter()
		.map(|row| SubscriptionRecord {
			status: SubscriptionStatus::parse(&row.status),
			current_period_end: row.current_period_end,
		})
		.collect();

	Ok(Some(BillingAccount { customer_id, subscriptions }))
}

/// Marks a place as checked without touching its hours.
pub async fn mark_hours_checked(db: &Db, place_id: &str, now: OffsetDateTime) -> Result<()> {
	sqlx::query("UPDATE dojos SET hours_refreshed_at = $1 WHERE place_id = $2")
		.bind(now)
		.bind(place_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}
