use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, ResponseError,
};
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::CanteenError;

pub const DEFAULT_MAX_REQUESTS: usize = 10;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Tracked clients above which a check first sweeps out idle entries.
pub const PRUNE_THRESHOLD: usize = 1024;

/// Sliding-window request counter per client IP.
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<DashMap<IpAddr, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }

    pub fn with_limit(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.requests.len()
    }

    /// Records a request from `ip` and reports whether it is within the limit.
    pub fn check_rate_limit(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    pub fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        if self.requests.len() > PRUNE_THRESHOLD {
            self.cleanup_at(now);
        }

        let cutoff = now.checked_sub(self.window);
        let mut entry = self.requests.entry(ip).or_default();

        // Remove old entries
        if let Some(cutoff) = cutoff {
            entry.retain(|&timestamp| timestamp > cutoff);
        }

        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }

    pub fn cleanup_old_entries(&self) {
        self.cleanup_at(Instant::now());
    }

    fn cleanup_at(&self, now: Instant) {
        let Some(cutoff) = now.checked_sub(self.window) else {
            return;
        };

        self.requests.retain(|_, timestamps| {
            timestamps.retain(|&timestamp| timestamp > cutoff);
            !timestamps.is_empty()
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Answers 429 once a client exceeds the limiter in app data.
pub async fn rate_limit_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    if let Err(err) = admit(&req) {
        return Ok(req.into_response(err.error_response()).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}

fn admit(req: &ServiceRequest) -> Result<(), CanteenError> {
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .ok_or_else(|| CanteenError::Internal("Unable to determine client IP".to_string()))?;

    let rate_limiter = req
        .app_data::<web::Data<RateLimiter>>()
        .ok_or_else(|| CanteenError::Internal("Rate limiter not available".to_string()))?;

    if !rate_limiter.check_rate_limit(ip) {
        log::warn!("Rate limit exceeded for IP: {}", ip);
        return Err(CanteenError::RateLimitExceeded);
    }
    Ok(())
}
