//! Bearer-token extractor and standalone verifier.
//!
//! The token's `sub` claim is the caller's external identity. Signature,
//! expiry, and (when configured) audience and issuer are checked here;
//! nothing about the caller is looked up.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// How bearer tokens are verified for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  key:        DecodingKey,
  validation: Validation,
}

impl AuthConfig {
  /// Verify HS256 tokens signed with a shared secret.
  pub fn hs256(secret: &[u8]) -> Self {
    Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
  }

  /// Verify RS256 tokens against a PEM-encoded RSA public key.
  pub fn rs256_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
    Ok(Self::with_key(DecodingKey::from_rsa_pem(pem)?, Algorithm::RS256))
  }

  fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
    let mut validation = Validation::new(algorithm);
    validation.validate_aud = false;
    Self { key, validation }
  }

  pub fn audience(mut self, audience: &str) -> Self {
    self.validation.set_audience(&[audience]);
    self.validation.validate_aud = true;
    self
  }

  pub fn issuer(mut self, issuer: &str) -> Self {
    self.validation.set_issuer(&[issuer]);
    self
  }
}

#[derive(Debug, Deserialize)]
struct Claims {
  sub: String,
}

/// The authenticated caller. Present in a handler means the request carried
/// a valid bearer token.
#[derive(Debug, Clone)]
pub struct Caller {
  /// The token subject, e.g. `auth0|abc123`.
  pub identity: String,
  /// The raw token, forwarded to the authorizer.
  pub token:    String,
}

/// Verify the bearer token directly from headers.
pub fn verify_bearer(headers: &HeaderMap, config: &AuthConfig) -> Result<Caller, ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let token = header_val
    .strip_prefix("Bearer ")
    .ok_or(ApiError::Unauthorized)?;

  let data = jsonwebtoken::decode::<Claims>(token, &config.key, &config.validation)
    .map_err(|e| {
      tracing::debug!(error = %e, "rejected bearer token");
      ApiError::Unauthorized
    })?;

  if data.claims.sub.is_empty() {
    return Err(ApiError::Unauthorized);
  }
  Ok(Caller {
    identity: data.claims.sub,
    token:    token.to_owned(),
  })
}

/// Reuses the caller verified by the authorization middleware when present.
impl<S, D, A> FromRequestParts<AppState<S, D, A>> for Caller
where
  S: Send + Sync + 'static,
  D: Send + Sync + 'static,
  A: Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, D, A>,
  ) -> Result<Self, Self::Rejection> {
    if let Some(caller) = parts.extensions.get::<Caller>() {
      return Ok(caller.clone());
    }
    verify_bearer(&parts.headers, &state.auth)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;
  use jsonwebtoken::{EncodingKey, Header};
  use serde_json::json;

  const SECRET: &[u8] = b"test-secret";
  // 2100-01-01T00:00:00Z
  const FAR_FUTURE: u64 = 4_102_444_800;

  fn token(claims: serde_json::Value, secret: &[u8]) -> String {
    jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(secret))
      .unwrap()
  }

  fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
      header::AUTHORIZATION,
      HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
  }

  #[test]
  fn valid_token_yields_subject() {
    let t = token(json!({ "sub": "auth0|abc123", "exp": FAR_FUTURE }), SECRET);
    let caller = verify_bearer(&bearer(&t), &AuthConfig::hs256(SECRET)).unwrap();
    assert_eq!(caller.identity, "auth0|abc123");
    assert_eq!(caller.token, t);
  }

  #[test]
  fn wrong_secret() {
    let t = token(json!({ "sub": "auth0|abc123", "exp": FAR_FUTURE }), b"other");
    assert!(matches!(
      verify_bearer(&bearer(&t), &AuthConfig::hs256(SECRET)),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn expired_token() {
    let t = token(json!({ "sub": "auth0|abc123", "exp": 1_000 }), SECRET);
    assert!(matches!(
      verify_bearer(&bearer(&t), &AuthConfig::hs256(SECRET)),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn missing_header() {
    assert!(matches!(
      verify_bearer(&HeaderMap::new(), &AuthConfig::hs256(SECRET)),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn basic_scheme_is_rejected() {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
    assert!(matches!(
      verify_bearer(&headers, &AuthConfig::hs256(SECRET)),
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn audience_and_issuer_are_enforced_when_configured() {
    let config = AuthConfig::hs256(SECRET)
      .audience("https://todo.example.com")
      .issuer("https://issuer.example.com/");

    let good = token(
      json!({
        "sub": "auth0|abc123", "exp": FAR_FUTURE,
        "aud": "https://todo.example.com", "iss": "https://issuer.example.com/"
      }),
      SECRET,
    );
    assert!(verify_bearer(&bearer(&good), &config).is_ok());

    let wrong_aud = token(
      json!({
        "sub": "auth0|abc123", "exp": FAR_FUTURE,
        "aud": "https://elsewhere.example.com", "iss": "https://issuer.example.com/"
      }),
      SECRET,
    );
    assert!(verify_bearer(&bearer(&wrong_aud), &config).is_err());
  }

  #[test]
  fn audience_claim_is_ignored_when_not_configured() {
    let t = token(
      json!({ "sub": "auth0|abc123", "exp": FAR_FUTURE, "aud": "anything" }),
      SECRET,
    );
    assert!(verify_bearer(&bearer(&t), &AuthConfig::hs256(SECRET)).is_ok());
  }
}
