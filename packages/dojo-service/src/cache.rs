//! Cache keys, typed access helpers and the two cache backends.
//!
//! Cache failures never fail a request: reads degrade to misses and writes are logged.

use std::{
	collections::{BTreeSet, HashMap},
	sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use time::{Duration, OffsetDateTime};

use dojo_domain::place::PlaceId;
use dojo_storage::db::Db;

use crate::{BoxFuture, CacheStore, Result};

/// Identifiers whose details were resolved in one freshness window.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FetchedSet {
	pub place_ids: BTreeSet<PlaceId>,
}

pub fn details_key(place_id: &PlaceId) -> String {
	format!("details:{}", blake3::hash(place_id.as_str().as_bytes()).to_hex())
}

/// Key of the fetched set for the window containing `now`. Windows are `ttl` long and aligned to
/// the Unix epoch.
pub fn fetched_set_key(now: OffsetDateTime, ttl: Duration) -> String {
	let window = now.unix_timestamp().div_euclid(ttl.whole_seconds().max(1));

	format!("fetched-set:{window}")
}

pub fn throttle_key(caller_id: &str) -> String {
	format!("throttle:{caller_id}")
}

pub(crate) async fn read_json<T>(cache: &dyn CacheStore, key: &str, now: OffsetDateTime) -> Option<T>
where
	T: DeserializeOwned,
{
	let value = match cache.get(key, now).await {
		Ok(Some(value)) => value,
		Ok(None) => return None,
		Err(err) => {
			tracing::warn!(error = %err, cache_key = key, "Cache read failed. Treating as a miss.");

			return None;
		},
	};

	match serde_json::from_value(value) {
		Ok(decoded) => Some(decoded),
		Err(err) => {
			tracing::warn!(error = %err, cache_key = key, "Cache payload decode failed.");

			None
		},
	}
}

pub(crate) async fn write_json<T>(
	cache: &dyn CacheStore,
	key: &str,
	value: &T,
	now: OffsetDateTime,
	expires_at: Option<OffsetDateTime>,
) where
	T: Serialize,
{
	let result = match serde_json::to_value(value) {
		Ok(payload) => cache.set(key, payload, now, expires_at).await,
		Err(err) => Err(err.into()),
	};

	if let Err(err) = result {
		tracing::warn!(error = %err, cache_key = key, "Cache write failed.");
	}
}

/// In-process cache. Entries live until they expire or the process exits.
#[derive(Debug, Default)]
pub struct MemoryCache {
	entries: Mutex<HashMap<String, MemoryEntry>>,
}
impl MemoryCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Drops expired entries and returns how many were removed.
	pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let before = entries.len();

		entries.retain(|_, entry| entry.is_live(now));

		before - entries.len()
	}
}
impl CacheStore for MemoryCache {
	fn get<'a>(&'a self, key: &'a str, now: OffsetDateTime) -> BoxFuture<'a, Result<Option<Value>>> {
		let value = {
			let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

			entries.get(key).filter(|entry| entry.is_live(now)).map(|entry| entry.value.clone())
		};

		Box::pin(async move { Ok(value) })
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: Value,
		_now: OffsetDateTime,
		expires_at: Option<OffsetDateTime>,
	) -> BoxFuture<'a, Result<()>> {
		self.entries
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.insert(key.to_string(), MemoryEntry { value, expires_at });

		Box::pin(async { Ok(()) })
	}
}

#[derive(Debug)]
struct MemoryEntry {
	value: Value,
	expires_at: Option<OffsetDateTime>,
}
impl MemoryEntry {
	fn is_live(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|expires_at| expires_at > now)
	}
}

/// Cache rows in the `place_cache` table.
pub struct PgCache {
	db: Arc<Db>,
}
impl PgCache {
	pub fn new(db: Arc<Db>) -> Self {
		Self { db }
	}
}
impl CacheStore for PgCache {
	fn get<'a>(&'a self, key: &'a str, now: OffsetDateTime) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move {
			Ok(dojo_storage::cache::fetch_cache_payload(&self.db, key, now).await?)
		})
	}

	fn set<'a>(
		&'a self,
		key: &'a str,
		value: Value,
		now: OffsetDateTime,
		expires_at: Option<OffsetDateTime>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			dojo_storage::cache::store_cache_payload(&self.db, key, &value, now, expires_at).await?;

			Ok(())
		})
	}
}
