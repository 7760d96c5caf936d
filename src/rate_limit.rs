use crate::application::handlers::error::ApiError;
use crate::domain::entities::principal::Principal;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Keys tracked before stale buckets are pruned
const MAX_TRACKED_KEYS: usize = 10_000;

/// Rate limiter configuration
pub struct RateLimiterConfig {
    /// Maximum requests per minute for each principal
    pub requests_per_minute: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 120,
        }
    }
}

/// Rate limiter keyed by principal (uid, or "anonymous")
pub type PrincipalRateLimiter = Arc<DefaultKeyedRateLimiter<String>>;

/// Create a new rate limiter
pub fn create_rate_limiter(config: RateLimiterConfig) -> PrincipalRateLimiter {
    let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or_else(|| {
        tracing::warn!("Rate limit of 0 requests per minute requested, using 1");
        NonZeroU32::MIN
    });
    Arc::new(RateLimiter::keyed(Quota::per_minute(per_minute)))
}

/// Middleware to apply rate limiting
///
/// Runs after principal resolution; a request without a resolved principal
/// is counted as anonymous.
pub async fn rate_limit_middleware(
    State(limiter): State<PrincipalRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = request
        .extensions()
        .get::<Principal>()
        .map(Principal::key)
        .unwrap_or_else(|| Principal::anonymous().key());

    if limiter.len() > MAX_TRACKED_KEYS {
        limiter.retain_recent();
    }

    match limiter.check_key(&key) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!("Rate limit exceeded for {}", key);
            ApiError::resource_exhausted().into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_rate_limiter_is_keyed() {
        let limiter = create_rate_limiter(RateLimiterConfig {
            requests_per_minute: 1,
        });

        assert!(limiter.check_key(&"trader_olof".to_string()).is_ok());
        assert!(limiter.check_key(&"trader_olof".to_string()).is_err());
        // A different principal has its own bucket.
        assert!(limiter.check_key(&"admin_alexa".to_string()).is_ok());
    }

    #[test]
    fn test_default_config() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.requests_per_minute, 120);
    }

    #[tokio::test]
    async fn test_middleware_returns_resource_exhausted() {
        let limiter = create_rate_limiter(RateLimiterConfig {
            requests_per_minute: 2,
        });
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
