use axum::{
	Json, Router,
	extract::{Query, State},
	http::{HeaderMap, StatusCode, header},
	response::{IntoResponse, Response},
	routing::get,
};
use serde::{Deserialize, Serialize};

use dojo_domain::{place::PlaceDetail, throttle::Language};
use dojo_service::{Caller, Error as ServiceError, NearbyQuery, SearchOutcome, ThrottleNotice};

use crate::state::AppState;

pub const CALLER_ID_HEADER: &str = "x-caller-id";

#[derive(Debug, Deserialize)]
pub struct SearchParams {
	#[serde(default)]
	pub query: Option<String>,
	#[serde(default)]
	pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
	#[serde(default)]
	pub lat: Option<f64>,
	#[serde(default)]
	pub lng: Option<f64>,
	#[serde(default)]
	pub radius: Option<i64>,
	#[serde(default)]
	pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsParams {
	#[serde(default)]
	pub place_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DojosResponse {
	pub dojos: Vec<PlaceDetail>,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/dojos/search", get(search_dojos))
		.route("/v1/dojos/nearby", get(nearby_dojos))
		.route("/v1/places/details", get(place_details))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search_dojos(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
	let caller = caller(&headers, params.lang.as_deref());
	let query = params.query.unwrap_or_default();
	let outcome = state.service.search_by_query(&caller, &query).await?;

	Ok(outcome_response(outcome))
}

async fn nearby_dojos(
	State(state): State<AppState>,
	headers: HeaderMap,
	Query(params): Query<NearbyParams>,
) -> Result<Response, ApiError> {
	let caller = caller(&headers, params.lang.as_deref());
	let query =
		NearbyQuery { latitude: params.lat, longitude: params.lng, radius_m: params.radius };
	let outcome = state.service.search_nearby(&caller, &query).await?;

	Ok(outcome_response(outcome))
}

async fn place_details(
	State(state): State<AppState>,
	Query(params): Query<DetailsParams>,
) -> Result<Json<PlaceDetail>, ApiError> {
	let place_id = params.place_id.unwrap_or_default();
	let detail = state.service.place_details(&place_id).await?;

	Ok(Json(detail))
}

fn caller(headers: &HeaderMap, lang: Option<&str>) -> Caller {
	let caller_id = headers
		.get(CALLER_ID_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::to_string);

	Caller::new(caller_id, Language::from_tag(lang.unwrap_or_default()))
}

fn outcome_response(outcome: SearchOutcome) -> Response {
	match outcome {
		SearchOutcome::Results(dojos) => Json(DojosResponse { dojos }).into_response(),
		SearchOutcome::Throttled(notice) => throttled_response(notice),
	}
}

fn throttled_response(notice: ThrottleNotice) -> Response {
	let body = ThrottledBody {
		error_code: "throttled",
		message: notice.message,
		retry_after_seconds: notice.retry_after_seconds,
		interval_days: notice.interval_days,
	};

	(
		StatusCode::TOO_MANY_REQUESTS,
		[(header::RETRY_AFTER, notice.retry_after_seconds.to_string())],
		Json(body),
	)
		.into_response()
}

#[derive(Debug, Serialize)]
struct ThrottledBody {
	error_code: &'static str,
	message: String,
	retry_after_seconds: i64,
	interval_days: i64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } =>
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::NotFound { message } =>
				ApiError::new(StatusCode::NOT_FOUND, "not_found", message),
			ServiceError::Configuration { message } => {
				tracing::error!(%message, "Search is misconfigured.");

				ApiError::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"configuration_error",
					"Search is not configured on this server.",
				)
			},
			ServiceError::Provider { message } => {
				tracing::error!(%message, "Places provider request failed.");

				ApiError::new(StatusCode::BAD_GATEWAY, "provider_error", "Upstream request failed.")
			},
			ServiceError::Storage { message } => {
				tracing::error!(%message, "Storage request failed.");

				ApiError::new(
					StatusCode::INTERNAL_SERVER_ERROR,
					"storage_error",
					"Internal storage error.",
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
