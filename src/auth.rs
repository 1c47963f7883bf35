//! Password hashing and session authentication.
//!
//! Sessions are opaque tokens resolved by middleware into an [`AuthUser`]
//! request extension; handlers never read cookies themselves. Tokens travel
//! either in a `session` cookie or an `X-Session-Token` header.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::Rng;

use crate::errors::AppError;
use crate::handlers::AppState;
use crate::store::types::UserId;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";
/// Header alternative for non-browser clients
pub const SESSION_HEADER: &str = "x-session-token";

/// The authenticated user for the current request, injected by
/// [`session_auth`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: UserId,
}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow!("Corrupt password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Generate a 6-digit email verification code.
pub fn generate_verification_code() -> String {
    let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
    code.to_string()
}

/// Pull the session token out of the cookie or header, if any.
pub fn extract_session_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(token) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    let cookie_header = headers.get("cookie")?.to_str().ok()?;
    for pair in cookie_header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(SESSION_COOKIE) {
            let value = parts.next().unwrap_or("");
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Session authentication middleware for the protected routes.
///
/// Resolves the token to a live session and injects [`AuthUser`]; requests
/// without a valid session get a 401 before reaching any handler.
pub async fn session_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_session_token(request.headers()) else {
        return AppError::NotAuthenticated.into_response();
    };

    let session = match state.sessions.get(&token) {
        Ok(Some(session)) => session,
        Ok(None) => return AppError::NotAuthenticated.into_response(),
        Err(e) => return AppError::Internal(e).into_response(),
    };

    request.extensions_mut().insert(AuthUser {
        id: session.user_id,
    });

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("segreto").unwrap();
        assert!(verify_password("segreto", &hash).unwrap());
        assert!(!verify_password("sbagliato", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("segreto").unwrap();
        let b = hash_password("segreto").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verification_code_shape() {
        for _ in 0..20 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_extract_token_from_header() {
        let req = Request::builder()
            .header(SESSION_HEADER, "tok-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_session_token(req.headers()),
            Some("tok-123".to_string())
        );
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let req = Request::builder()
            .header("cookie", "theme=dark; session=tok-456; lang=it")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_session_token(req.headers()),
            Some("tok-456".to_string())
        );
    }

    #[test]
    fn test_no_token() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(extract_session_token(req.headers()), None);
    }
}
