//! Process-wide throttle for outbound E-utilities calls.
//!
//! NCBI enforces a per-second request quota: 10 calls/s with an API key,
//! 3 calls/s without. Every outbound call in the pipeline acquires a permit
//! here first; callers that would exceed the quota suspend until a permit
//! frees up. The gate never drops or fails a call, it only delays, so rate
//! pressure is invisible to the rest of the pipeline.
//!
//! The gate is shared state passed explicitly (`Arc<RequestGate>`) from the
//! orchestrator down to every fetch, not an ambient singleton.

use std::num::NonZeroU32;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;

/// Calls per second permitted with an API key
const KEYED_RATE: NonZeroU32 = nonzero!(10u32);

/// Calls per second permitted anonymously
const ANON_RATE: NonZeroU32 = nonzero!(3u32);

/// Rolling one-second request quota shared by all workers
pub struct RequestGate {
    limiter: DefaultDirectRateLimiter,
    rate: NonZeroU32,
}

impl RequestGate {
    /// Gate allowing `rate` calls per rolling second
    pub fn new(rate: NonZeroU32) -> Self {
        Self {
            limiter: RateLimiter::direct(Quota::per_second(rate)),
            rate,
        }
    }

    /// Gate sized for the quota the credential earns
    pub fn for_credential(api_key: Option<&str>) -> Self {
        let rate = if api_key.is_some() { KEYED_RATE } else { ANON_RATE };
        Self::new(rate)
    }

    /// Calls per second this gate permits
    pub fn rate(&self) -> u32 {
        self.rate.get()
    }

    /// Acquire one call permit, suspending until the quota allows it
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGate")
            .field("rate", &self.rate)
            .finish_non_exhaustive()
    }
}
