//! Identity resolution
//!
//! Maps the `Authorization` header of a request to a [`Principal`]. Session
//! tokens are HS256 JWTs carrying `{ sub, admin, iat, exp }`; the admin flag is
//! trusted verbatim, since only the claims issuer can sign it.
//!
//! A request without the header is anonymous. A header that is present but
//! malformed, badly signed or expired is rejected with 401 rather than
//! downgraded to anonymous. The rejection is only sent after the request has
//! been counted by the rate limiter under the anonymous key, so failed
//! credentials draw from the same budget as anonymous traffic.

use crate::application::handlers::error::ApiError;
use crate::domain::entities::principal::Principal;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedHeader,

    #[error("Session token expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Failed to sign session token: {0}")]
    Signing(String),
}

/// Verifies session tokens and signs new ones.
pub struct IdentityResolver {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl_seconds: i64,
}

impl IdentityResolver {
    pub fn new(secret: &Zeroizing<String>, token_ttl_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 5;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_ttl_seconds: i64::try_from(token_ttl_seconds).unwrap_or(i64::MAX),
        }
    }

    /// Resolve the principal for an optional `Authorization` header value.
    pub fn resolve(&self, authorization: Option<&str>) -> Result<Principal, AuthError> {
        let Some(header) = authorization else {
            return Ok(Principal::anonymous());
        };
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MalformedHeader)?;

        let claims = self.verify(token)?;
        Ok(Principal::from_claims(claims.sub, claims.admin))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }
        Ok(data.claims)
    }

    /// Sign a token for `uid` with the given admin claim.
    ///
    /// Callers outside the claims issuer should not exist; the admin flag must
    /// come from the account registry.
    pub fn sign(&self, uid: &str, admin: bool) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: uid.to_string(),
            admin,
            iat: now,
            exp: now.saturating_add(self.token_ttl_seconds),
        };
        self.sign_claims(&claims)
    }

    fn sign_claims(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

/// Marks a request whose credential was refused during principal resolution.
#[derive(Debug, Clone)]
pub struct RejectedCredential(pub AuthError);

/// Middleware resolving the request principal into the request extensions.
///
/// A refused credential resolves to the anonymous principal plus a
/// [`RejectedCredential`] marker; [`reject_invalid_credentials`] turns the
/// marker into a 401 further in.
pub async fn resolve_principal(
    State(resolver): State<Arc<IdentityResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = request
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| AuthError::MalformedHeader))
        .transpose()
        .and_then(|header| resolver.resolve(header));

    match resolved {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
        }
        Err(e) => {
            tracing::warn!("Rejected session credential: {}", e);
            request.extensions_mut().insert(Principal::anonymous());
            request.extensions_mut().insert(RejectedCredential(e));
        }
    }
    next.run(request).await
}

/// Answer 401 for requests marked by [`resolve_principal`].
pub async fn reject_invalid_credentials(request: Request, next: Next) -> Response {
    if let Some(RejectedCredential(error)) = request.extensions().get::<RejectedCredential>() {
        return ApiError::from(error.clone()).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(
            &Zeroizing::new("q7Lm2xVb9RtK4wNc8ZpH3sJd6FgY1aEu".to_string()),
            3600,
        )
    }

    #[test]
    fn test_missing_header_is_anonymous() {
        let principal = resolver().resolve(None).unwrap();
        assert!(!principal.is_authenticated());
        assert!(!principal.is_admin());
    }

    #[test]
    fn test_signed_token_round_trips_claims() {
        let resolver = resolver();
        let token = resolver.sign("admin_alexa", true).unwrap();
        let principal = resolver.resolve(Some(&format!("Bearer {}", token))).unwrap();
        assert_eq!(principal.uid(), Some("admin_alexa"));
        assert!(principal.is_admin());

        let token = resolver.sign("trader_olof", false).unwrap();
        let principal = resolver.resolve(Some(&format!("Bearer {}", token))).unwrap();
        assert!(!principal.is_admin());
    }

    #[test]
    fn test_malformed_header_is_rejected() {
        let resolver = resolver();
        assert!(matches!(
            resolver.resolve(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedHeader)
        ));
        assert!(matches!(
            resolver.resolve(Some("Bearer ")),
            Err(AuthError::MalformedHeader)
        ));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let other = IdentityResolver::new(
            &Zeroizing::new("Zx8Pq1Wn5Rv3Tb7Yk2Lm9Hc4Jd6Fg0Aa".to_string()),
            3600,
        );
        let token = other.sign("trader_olof", true).unwrap();
        assert!(matches!(
            resolver().resolve(Some(&format!("Bearer {}", token))),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_rejected_credential_is_marked_then_refused() {
        use axum::{body::Body, http::Request as HttpRequest, http::StatusCode, middleware, routing::get, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn(reject_invalid_credentials))
            .layer(middleware::from_fn_with_state(
                Arc::new(resolver()),
                resolve_principal,
            ));

        let response = app
            .clone()
            .oneshot(HttpRequest::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/")
                    .header(AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let resolver = resolver();
        let now = Utc::now().timestamp();
        let token = resolver
            .sign_claims(&TokenClaims {
                sub: "trader_olof".to_string(),
                admin: false,
                iat: now - 7200,
                exp: now - 3600,
            })
            .unwrap();
        assert!(matches!(resolver.verify(&token), Err(AuthError::Expired)));
    }
}
