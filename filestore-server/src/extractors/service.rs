use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use filestore_service::context::{IdentityFacts, resolve};
use secrecy::{ExposeSecret, SecretBox};
use subtle::{Choice, ConstantTimeEq};

use crate::auth::{API_KEY_HEADER, AuthAwareService, AuthError, SessionClaims};
use crate::config::ConfigSecret;
use crate::error::ApiError;
use crate::state::ServiceState;

const BEARER_PREFIX: &str = "Bearer ";

impl FromRequestParts<ServiceState> for AuthAwareService {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let facts = identity_facts(&parts.headers, state).inspect_err(|err| {
            tracing::debug!("Authentication rejected: `{:?}`", err);
        })?;
        let context = resolve(&facts).map_err(AuthError::from)?;

        Ok(AuthAwareService::new(state.service.clone(), context))
    }
}

/// Collects the identity facts from the request's credentials.
///
/// An API key takes precedence over a session token. Requests without any credentials are made
/// by guests.
fn identity_facts(headers: &HeaderMap, state: &ServiceState) -> Result<IdentityFacts, AuthError> {
    if let Some(value) = headers.get(API_KEY_HEADER) {
        let presented = value
            .to_str()
            .map_err(|_| AuthError::BadRequest("API key is not valid ASCII"))?;

        return if is_known_api_key(state.config.auth.api_keys.values(), presented) {
            Ok(IdentityFacts::privileged())
        } else {
            Err(AuthError::InvalidApiKey)
        };
    }

    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(IdentityFacts::guest());
    };

    let encoded_token = value
        .to_str()
        .ok()
        .and_then(strip_bearer)
        .ok_or(AuthError::BadRequest("expected a bearer token"))?;

    let claims = SessionClaims::from_encoded_jwt(encoded_token, &state.key_directory)?;
    Ok(claims.into())
}

/// Compares the presented key against every configured key in constant time.
fn is_known_api_key<'a>(
    keys: impl IntoIterator<Item = &'a SecretBox<ConfigSecret>>,
    presented: &str,
) -> bool {
    let matched = keys.into_iter().fold(Choice::from(0), |matched, key| {
        matched | key.expose_secret().as_bytes().ct_eq(presented.as_bytes())
    });
    matched.into()
}

fn strip_bearer(header_value: &str) -> Option<&str> {
    let (prefix, tail) = header_value.split_at_checked(BEARER_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        Some(tail)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_known_api_key() {
        let keys = [
            SecretBox::new(Box::new(ConfigSecret::from("first-key"))),
            SecretBox::new(Box::new(ConfigSecret::from("second-key"))),
        ];

        assert!(is_known_api_key(&keys, "first-key"));
        assert!(is_known_api_key(&keys, "second-key"));
        assert!(!is_known_api_key(&keys, "second-ke"));
        assert!(!is_known_api_key(&keys, "second-keys"));
        assert!(!is_known_api_key(&keys, ""));
        assert!(!is_known_api_key([], "first-key"));
    }

    #[test]
    fn test_strip_bearer() {
        // Prefix matches
        assert_eq!(strip_bearer("Bearer tokenvalue"), Some("tokenvalue"));
        assert_eq!(strip_bearer("bearer tokenvalue"), Some("tokenvalue"));

        // Prefix doesn't match
        assert_eq!(strip_bearer("Basic dXNlcjpwdw=="), None);
        assert_eq!(strip_bearer("Bearer"), None);

        // No character boundary at end of expected prefix
        assert_eq!(strip_bearer("Bearer⚠️tokenvalue"), None);
    }
}
