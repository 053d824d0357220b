// auth-server/src/middleware/rate_limiter.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Instant, Duration};
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header,
    Error, ResponseError,
    HttpResponse
};
use common::RateLimitConfig;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::json;
use std::fmt;

// Rejection returned once an IP exhausts its window
#[derive(Debug)]
struct RateLimitExceeded {
    retry_after: u64,
}

impl fmt::Display for RateLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rate limit exceeded")
    }
}

impl ResponseError for RateLimitExceeded {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::TOO_MANY_REQUESTS
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::TooManyRequests()
            .append_header((header::RETRY_AFTER, self.retry_after.to_string()))
            .json(json!({
                "ok": false,
                "error": "RateLimited",
                "message": "Too many sign-in challenges requested. Please try again later."
            }))
    }
}

/// Sliding-window limiter keyed by client IP, applied to path prefixes.
///
/// Every challenge issuance allocates a nonce-store entry, so issuance is
/// the path this guards.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    paths: Vec<String>,
    max_requests: usize,
    window: Duration,
    store: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new(paths: Vec<String>, config: &RateLimitConfig) -> Self {
        Self {
            paths,
            max_requests: config.max_requests.max(1),
            window: Duration::from_secs(config.window_secs.max(1)),
            store: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn applies_to(&self, path: &str) -> bool {
        self.paths.iter().any(|p| path.starts_with(p))
    }

    fn is_rate_limited(&self, ip: &str, now: Instant) -> bool {
        let mut store = self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // Forget clients that have been quiet for a whole window
        store.retain(|_, hits| {
            hits.last().map_or(false, |last| now.duration_since(*last) < self.window)
        });

        let hits = store.entry(ip.to_string()).or_default();
        hits.retain(|time| now.duration_since(*time) < self.window);

        if hits.len() >= self.max_requests {
            true
        } else {
            hits.push(now);
            false
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RateLimiterMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimiterMiddleware {
            service,
            limiter: self.clone(),
        }))
    }
}

pub struct RateLimiterMiddleware<S> {
    service: S,
    limiter: RateLimiter,
}

impl<S, B> Service<ServiceRequest> for RateLimiterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.limiter.applies_to(req.path()) {
            // Socket peer only; forwarding headers are client-controlled
            let ip = req.peer_addr()
                .map(|addr| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string());

            if self.limiter.is_rate_limited(&ip, Instant::now()) {
                tracing::warn!("Rate limit exceeded for IP: {}", ip);

                let retry_after = self.limiter.window.as_secs();
                return Box::pin(async move {
                    Err(RateLimitExceeded { retry_after }.into())
                });
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            fut.await
        })
    }
}
