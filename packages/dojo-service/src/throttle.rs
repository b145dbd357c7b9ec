//! Loads and records per-caller throttle state around the pure policy in `dojo_domain::throttle`.

use time::{Duration, OffsetDateTime};

use dojo_domain::throttle::{self, CallerTier, ThrottleDecision, ThrottleState};

use crate::{DojoService, Result, cache};

#[derive(Clone, Debug)]
pub struct ThrottleCheck {
	pub tier: CallerTier,
	pub decision: ThrottleDecision,
	state: Option<ThrottleState>,
}

impl DojoService {
	pub fn free_interval(&self) -> Duration {
		Duration::days(self.cfg.throttle.free_interval_days)
	}

	/// Decides whether `caller_id` may start a search at `now`.
	///
	/// Anonymous callers are always allowed. A billing read failure is an error so the tier is
	/// never guessed.
	pub async fn check_throttle(
		&self,
		caller_id: Option<&str>,
		now: OffsetDateTime,
	) -> Result<ThrottleCheck> {
		let Some(caller_id) = caller_id else {
			let tier = CallerTier::Unregistered;

			return Ok(ThrottleCheck {
				tier,
				decision: ThrottleDecision::Allowed { tier },
				state: None,
			});
		};
		let account = self.stores.billing.billing_account(caller_id).await?;
		let tier = throttle::resolve_tier(account.as_ref(), now);
		let state: Option<ThrottleState> =
			cache::read_json(self.stores.cache.as_ref(), &cache::throttle_key(caller_id), now).await;
		let decision = throttle::evaluate(tier, state.as_ref(), self.free_interval(), now);

		tracing::debug!(caller_id, ?tier, allowed = decision.is_allowed(), "Throttle evaluated.");

		Ok(ThrottleCheck { tier, decision, state })
	}

	/// Stamps a permitted search. Failures are logged and never fail the search.
	pub async fn record_search(
		&self,
		caller_id: Option<&str>,
		check: &ThrottleCheck,
		now: OffsetDateTime,
	) {
		let Some(caller_id) = caller_id else {
			return;
		};
		let next = check.state.clone().unwrap_or_default().record_search(check.tier, now);

		cache::write_json(self.stores.cache.as_ref(), &cache::throttle_key(caller_id), &next, now, None)
			.await;
	}
}
