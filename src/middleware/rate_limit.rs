//! Fixed-window request limit per client address

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use warp::{Filter, Rejection};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug)]
struct LimiterState {
    windows: HashMap<IpAddr, Window>,
    next_sweep: Instant,
}

/// Counts requests per client address
///
/// Each address gets `max` requests per `window`; the count resets once the
/// window has elapsed. Expired entries are swept at most once per window.
#[derive(Debug)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    state: Mutex<LimiterState>,
}

impl RateLimiter {
    pub fn new(max: u32, window: Duration) -> Self {
        Self {
            max,
            window,
            state: Mutex::new(LimiterState {
                windows: HashMap::new(),
                next_sweep: Instant::now() + window,
            }),
        }
    }

    /// Record one request from `client` at `now`; false if over the limit
    pub fn allow(&self, client: IpAddr, now: Instant) -> bool {
        let mut state = self.lock();

        if now >= state.next_sweep {
            let before = state.windows.len();
            state.windows.retain(|_, window| window.reset_at > now);
            state.next_sweep = now + self.window;
            debug!(
                removed = before - state.windows.len(),
                "swept expired rate limit windows"
            );
        }

        let window = state.windows.entry(client).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });
        if now >= window.reset_at {
            *window = Window {
                count: 0,
                reset_at: now + self.window,
            };
        }

        if window.count >= self.max {
            return false;
        }
        window.count += 1;
        true
    }

    /// Number of addresses currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.lock().windows.len()
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Reject with 429 once the remote address exceeds its budget
///
/// Requests without a known remote address share one bucket.
pub fn rate_limit(
    limiter: Arc<RateLimiter>,
) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::addr::remote()
        .and_then(move |remote: Option<SocketAddr>| {
            let limiter = Arc::clone(&limiter);
            async move {
                let client = remote
                    .map(|addr| addr.ip())
                    .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
                if limiter.allow(client, Instant::now()) {
                    Ok(())
                } else {
                    warn!(client = %client, "rate limit exceeded");
                    Err(warp::reject::custom(ApiError::TooManyRequests))
                }
            }
        })
        .untuple_one()
}
