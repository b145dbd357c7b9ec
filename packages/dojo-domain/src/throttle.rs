//! Free-tier search throttling.
//!
//! The policy is a pure function of the caller's tier, their recorded throttle state, the
//! configured interval and the current time. Loading and persisting that state is left to the
//! caller.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubscriptionStatus {
	Active,
	Trialing,
	PastDue,
	Canceled,
	Incomplete,
	IncompleteExpired,
	Unpaid,
	Paused,
	Other(String),
}
impl SubscriptionStatus {
	pub fn parse(raw: &str) -> Self {
		match raw.trim().to_ascii_lowercase().as_str() {
			"active" => Self::Active,
			"trialing" => Self::Trialing,
			"past_due" => Self::PastDue,
			"canceled" | "cancelled" => Self::Canceled,
			"incomplete" => Self::Incomplete,
			"incomplete_expired" => Self::IncompleteExpired,
			"unpaid" => Self::Unpaid,
			"paused" => Self::Paused,
			_ => Self::Other(raw.to_string()),
		}
	}

	pub fn as_str(&self) -> &str {
		match self {
			Self::Active => "active",
			Self::Trialing => "trialing",
			Self::PastDue => "past_due",
			Self::Canceled => "canceled",
			Self::Incomplete => "incomplete",
			Self::IncompleteExpired => "incomplete_expired",
			Self::Unpaid => "unpaid",
			Self::Paused => "paused",
			Self::Other(raw) => raw.as_str(),
		}
	}

	pub fn grants_access(&self) -> bool {
		matches!(self, Self::Active | Self::Trialing)
	}
}

#[derive(Clone, Debug)]
pub struct SubscriptionRecord {
	pub status: SubscriptionStatus,
	pub current_period_end: OffsetDateTime,
}

/// Locally synchronized billing identity of a caller.
#[derive(Clone, Debug)]
pub struct BillingAccount {
	pub customer_id: String,
	pub subscriptions: Vec<SubscriptionRecord>,
}
impl BillingAccount {
	pub fn has_active_subscription(&self, now: OffsetDateTime) -> bool {
		self.subscriptions
			.iter()
			.any(|sub| sub.status.grants_access() && sub.current_period_end > now)
	}
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerTier {
	/// No billing identity on file.
	Unregistered,
	Free,
	Subscribed,
}

pub fn resolve_tier(account: Option<&BillingAccount>, now: OffsetDateTime) -> CallerTier {
	match account {
		None => CallerTier::Unregistered,
		Some(account) if account.has_active_subscription(now) => CallerTier::Subscribed,
		Some(_) => CallerTier::Free,
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ThrottleState {
	#[serde(default, with = "crate::time_serde::option")]
	pub last_search_at: Option<OffsetDateTime>,
	#[serde(default)]
	pub subscription_active: bool,
}
impl ThrottleState {
	/// State after a permitted search at `now`.
	pub fn record_search(&self, tier: CallerTier, now: OffsetDateTime) -> Self {
		Self { last_search_at: Some(now), subscription_active: tier == CallerTier::Subscribed }
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ThrottleDecision {
	Allowed { tier: CallerTier },
	Throttled { interval: Duration, retry_after: Duration },
}
impl ThrottleDecision {
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allowed { .. })
	}
}

pub fn evaluate(
	tier: CallerTier,
	state: Option<&ThrottleState>,
	interval: Duration,
	now: OffsetDateTime,
) -> ThrottleDecision {
	if tier != CallerTier::Free {
		return ThrottleDecision::Allowed { tier };
	}

	let Some(last_search_at) = state.and_then(|state| state.last_search_at) else {
		return ThrottleDecision::Allowed { tier };
	};
	let elapsed = now - last_search_at;

	if elapsed >= interval {
		return ThrottleDecision::Allowed { tier };
	}

	ThrottleDecision::Throttled { interval, retry_after: interval - elapsed }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Language {
	English,
	Japanese,
}
impl Language {
	pub fn from_tag(tag: &str) -> Self {
		if tag.trim().to_ascii_lowercase().starts_with("ja") {
			Self::Japanese
		} else {
			Self::English
		}
	}
}

pub fn throttle_message(interval_days: i64, language: Language) -> String {
	match language {
		Language::Japanese => format!("無料プランでは検索は {interval_days} 日に 1 回までです。"),
		Language::English => format!("Free plan: you can search once every {interval_days} day(s)."),
	}
}
