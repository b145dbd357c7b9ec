use dojo_domain::place::{NO_HOURS_AVAILABLE, PlaceDetail, PlaceId, WeeklyHours};

fn detail(hours: WeeklyHours) -> PlaceDetail {
	PlaceDetail {
		place_id: PlaceId::new("ChIJ-spartacus"),
		name: "Spartacus Gym".to_string(),
		address: "1 Main St, Vancouver".to_string(),
		latitude: 49.28,
		longitude: -123.12,
		website: None,
		hours,
		rating: Some(4.8),
		rating_count: Some(120),
		reviews: Vec::new(),
	}
}

#[test]
fn missing_upstream_hours_become_the_sentinel() {
	assert_eq!(WeeklyHours::from_upstream(None), WeeklyHours::Unavailable);
	assert_eq!(WeeklyHours::from_upstream(Some(Vec::new())), WeeklyHours::Unavailable);
	assert!(!WeeklyHours::Unavailable.is_available());
}

#[test]
fn unavailable_hours_serialize_as_a_list_not_null() {
	let value = serde_json::to_value(detail(WeeklyHours::Unavailable)).expect("encode failed");

	assert_eq!(value["hours"], serde_json::json!([NO_HOURS_AVAILABLE]));
	assert_eq!(value["place_id"], "ChIJ-spartacus");
}

#[test]
fn stored_sentinel_reads_back_as_unavailable() {
	let hours: WeeklyHours =
		serde_json::from_value(serde_json::json!(["No hours available"])).expect("decode failed");

	assert_eq!(hours, WeeklyHours::Unavailable);
}

#[test]
fn listed_hours_keep_their_order() {
	let lines = vec![
		"Monday: 6:00 – 21:00".to_string(),
		"Tuesday: 6:00 – 21:00".to_string(),
		"Sunday: Closed".to_string(),
	];
	let original = detail(WeeklyHours::from_upstream(Some(lines.clone())));
	let encoded = serde_json::to_string(&original).expect("encode failed");
	let decoded: PlaceDetail = serde_json::from_str(&encoded).expect("decode failed");

	assert_eq!(decoded, original);
	assert_eq!(decoded.hours.lines(), lines);
}
