use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use dojo_domain::place::{PlaceDetail, PlaceId, ReviewSnippet, WeeklyHours};

use crate::Result;

#[derive(Debug, sqlx::FromRow)]
pub struct DojoRow {
	pub dojo_id: Uuid,
	pub place_id: String,
	pub name: String,
	pub address: String,
	pub latitude: f64,
	pub longitude: f64,
	pub website: Option<String>,
	pub hours: Value,
	pub rating: Option<f64>,
	pub rating_count: Option<i64>,
	pub reviews: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub hours_refreshed_at: OffsetDateTime,
}
impl DojoRow {
	pub fn into_detail(self) -> Result<PlaceDetail> {
		let hours: WeeklyHours = serde_json::from_value(self.hours)?;
		let reviews: Vec<ReviewSnippet> = serde_json::from_value(self.reviews)?;

		Ok(PlaceDetail {
			place_id: PlaceId::new(self.place_id),
			name: self.name,
			address: self.address,
			latitude: self.latitude,
			longitude: self.longitude,
			website: self.website,
			hours,
			rating: self.rating,
			rating_count: self.rating_count,
			reviews,
		})
	}
}

/// A stored place whose weekly hours are due for a refresh.
#[derive(Debug, sqlx::FromRow)]
pub struct StaleDojo {
	pub place_id: String,
	pub hours_refreshed_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SubscriptionRow {
	pub subscription_id: String,
	pub status: String,
	pub current_period_end: OffsetDateTime,
}
