//! Key-value rows backing the service cache. A `NULL` expiry never expires.

use serde_json::Value;
use sqlx::Row;
use time::OffsetDateTime;

use crate::{Result, db::Db};

pub async fn fetch_cache_payload(db: &Db, key: &str, now: OffsetDateTime) -> Result<Option<Value>> {
	let row = sqlx::query(
		"\
SELECT payload
FROM place_cache
WHERE cache_key = $1 AND (expires_at IS NULL OR expires_at > $2)",
	)
	.bind(key)
	.bind(now)
	.fetch_optional(&db.pool)
	.await?;
	let Some(row) = row else {
		return Ok(None);
	};

	Ok(Some(row.try_get("payload")?))
}

pub async fn store_cache_payload(
	db: &Db,
	key: &str,
	payload: &Value,
	now: OffsetDateTime,
	expires_at: Option<OffsetDateTime>,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO place_cache (cache_key, payload, created_at, updated_at, expires_at)
VALUES ($1, $2, $3, $3, $4)
ON CONFLICT (cache_key) DO UPDATE
SET payload = EXCLUDED.payload, updated_at = EXCLUDED.updated_at, expires_at = EXCLUDED.expires_at",
	)
	.bind(key)
	.bind(payload)
	.bind(now)
	.bind(expires_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Returns the number of rows removed.
pub async fn purge_expired_cache(db: &Db, now: OffsetDateTime) -> Result<u64> {
	let result = sqlx::query("DELETE FROM place_cache WHERE expires_at IS NOT NULL AND expires_at <= $1")
		.bind(now)
		.execute(&db.pool)
		.await?;

	Ok(result.rows_affected())
}
