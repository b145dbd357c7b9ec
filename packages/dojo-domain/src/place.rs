use std::fmt;

use serde::{Deserialize, Serialize};

/// Stored and served in place of weekly hours when the upstream record has none.
pub const NO_HOURS_AVAILABLE: &str = "No hours available";

pub const UNKNOWN_PLACE_NAME: &str = "Unknown";

/// Opaque key naming a physical place in the Places API namespace.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlaceId(String);
impl PlaceId {
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl fmt::Display for PlaceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
impl From<&str> for PlaceId {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for PlaceId {
	fn from(value: String) -> Self {
		Self(value)
	}
}

/// Weekly opening hours.
///
/// Serialized as a list of strings in both variants so consumers never see `null`;
/// `Unavailable` becomes `["No hours available"]`.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum WeeklyHours {
	Listed(Vec<String>),
	Unavailable,
}
impl WeeklyHours {
	pub fn from_upstream(lines: Option<Vec<String>>) -> Self {
		lines.map(Self::from).unwrap_or(Self::Unavailable)
	}

	pub fn is_available(&self) -> bool {
		matches!(self, Self::Listed(_))
	}

	pub fn lines(&self) -> Vec<String> {
		self.clone().into()
	}
}
impl From<Vec<String>> for WeeklyHours {
	fn from(lines: Vec<String>) -> Self {
		let lines: Vec<String> =
			lines.into_iter().filter(|line| !line.trim().is_empty()).collect();

		if lines.is_empty() || (lines.len() == 1 && lines[0] == NO_HOURS_AVAILABLE) {
			return Self::Unavailable;
		}

		Self::Listed(lines)
	}
}
impl From<WeeklyHours> for Vec<String> {
	fn from(hours: WeeklyHours) -> Self {
		match hours {
			WeeklyHours::Listed(lines) => lines,
			WeeklyHours::Unavailable => vec![NO_HOURS_AVAILABLE.to_string()],
		}
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ReviewSnippet {
	#[serde(default)]
	pub author_name: Option<String>,
	#[serde(default)]
	pub rating: Option<f64>,
	#[serde(default)]
	pub text: Option<String>,
	#[serde(default)]
	pub relative_time_description: Option<String>,
	#[serde(default)]
	pub time: Option<i64>,
}

/// One enriched place. Coordinates are passed through from upstream unvalidated.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlaceDetail {
	pub place_id: PlaceId,
	pub name: String,
	pub address: String,
	pub latitude: f64,
	pub longitude: f64,
	#[serde(default)]
	pub website: Option<String>,
	pub hours: WeeklyHours,
	#[serde(default)]
	pub rating: Option<f64>,
	#[serde(default)]
	pub rating_count: Option<i64>,
	#[serde(default)]
	pub reviews: Vec<ReviewSnippet>,
}

/// Where a fan-out search looks.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchArea {
	/// Free-text location such as a city name.
	Text { location: String },
	Radius { latitude: f64, longitude: f64, radius_m: u32 },
}
impl SearchArea {
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Text { .. } => "text",
			Self::Radius { .. } => "radius",
		}
	}
}
