use std::{sync::Mutex, time::Duration};

use tokio::time::{self, Instant};

/// Spaces outbound requests at least `min_interval` apart.
///
/// Callers reserve the next free slot under the lock and sleep outside of it, so concurrent
/// callers are granted distinct slots in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
	min_interval: Duration,
	next_slot: Mutex<Option<Instant>>,
}
impl RateLimiter {
	pub fn new(min_interval: Duration) -> Self {
		Self { min_interval, next_slot: Mutex::new(None) }
	}

	pub fn min_interval(&self) -> Duration {
		self.min_interval
	}

	pub async fn acquire(&self) {
		let slot = self.reserve(Instant::now());

		time::sleep_until(slot).await;
	}

	fn reserve(&self, now: Instant) -> Instant {
		let mut next = self.next_slot.lock().unwrap_or_else(|err| err.into_inner());
		let slot = match *next {
			Some(next) if next > now => next,
			_ => now,
		};

		*next = Some(slot + self.min_interval);

		slot
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reservations_are_spaced_by_the_interval() {
		let limiter = RateLimiter::new(Duration::from_millis(400));
		let now = Instant::now();

		assert_eq!(limiter.reserve(now), now);
		assert_eq!(limiter.reserve(now), now + Duration::from_millis(400));
		assert_eq!(limiter.reserve(now), now + Duration::from_millis(800));
	}

	#[test]
	fn idle_limiter_grants_immediately() {
		let limiter = RateLimiter::new(Duration::from_millis(400));
		let start = Instant::now();

		limiter.reserve(start);

		let later = start + Duration::from_secs(5);

		assert_eq!(limiter.reserve(later), later);
	}
}
