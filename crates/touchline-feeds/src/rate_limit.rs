use std::time::Duration;

use governor::{
  Quota, RateLimiter,
  clock::DefaultClock,
  state::{InMemoryState, NotKeyed},
};

/// Direct limiter allowing one request per replenish period, no burst.
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// `60 / n` seconds between requests. Zero means unlimited.
pub fn per_minute_interval(n: u32) -> Duration {
  if n == 0 {
    Duration::ZERO
  } else {
    Duration::from_secs_f64(60.0 / f64::from(n))
  }
}

/// A limiter spacing requests `interval` apart; `None` for a zero interval.
pub fn spaced(interval: Duration) -> Option<Limiter> {
  Quota::with_period(interval).map(Limiter::direct)
}

/// Wait for the next request slot, if there is a limit at all.
pub async fn pace(limiter: Option<&Limiter>) {
  if let Some(limiter) = limiter {
    limiter.until_ready().await;
  }
}
