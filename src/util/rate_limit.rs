//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

fn quota(per_second: u32) -> Quota {
    Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN))
}

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    Arc::new(RateLimiter::direct(quota(requests_per_second)))
}

/// Max WebSocket messages per second per connection
pub const SOCKET_RATE_LIMIT: u32 = 20;

/// Per-connection limiter for WebSocket traffic
#[derive(Clone)]
pub struct ConnectionRateLimiter {
    limiter: Arc<Limiter>,
}

impl ConnectionRateLimiter {
    pub fn new() -> Self {
        Self {
            limiter: create_limiter(SOCKET_RATE_LIMIT),
        }
    }

    /// Check if a message is allowed (returns true if allowed)
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for ConnectionRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Vote submissions per voter name, shared by every vote entry point
#[derive(Clone)]
pub struct VoteRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<String>>,
}

impl VoteRateLimiter {
    pub fn new(per_second: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::keyed(quota(per_second))),
        }
    }

    pub fn check(&self, voter: &str) -> bool {
        self.limiter.check_key(&voter.to_string()).is_ok()
    }

    /// Forget voters whose buckets have refilled
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }
}
