//! Authentication handlers: register, login, email verification, session
//! introspection and logout.
//!
//! Successful auth responses both set the session cookie (for browsers) and
//! return the token in the body (for API clients using `X-Session-Token`).

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{extract_session_token, AuthUser, SESSION_COOKIE};
use crate::errors::AppError;
use crate::store::types::{Session, User, UserSummary};

use super::AppState;

/// Request to register a new account
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Request to log in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request to verify an email address
#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

/// Response for any flow that opens a session
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: UserSummary,
    pub session_token: String,
    pub message: String,
}

fn session_response(
    status: StatusCode,
    user: &User,
    session: &Session,
    ttl_days: i64,
    message: &str,
) -> Response {
    let cookie = format!(
        "{SESSION_COOKIE}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        session.token,
        ttl_days * 24 * 60 * 60
    );
    let body = SessionResponse {
        user: user.summary(),
        session_token: session.token.clone(),
        message: message.to_string(),
    };
    (status, [(SET_COOKIE, cookie)], Json(body)).into_response()
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let (user, session) = state.register(&req.email, &req.password, req.name)?;
    Ok(session_response(
        StatusCode::CREATED,
        &user,
        &session,
        state.config.session_ttl_days,
        "Registration completed successfully",
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let (user, session) = state.login(&req.email, &req.password)?;
    Ok(session_response(
        StatusCode::OK,
        &user,
        &session,
        state.config.session_ttl_days,
        "Logged in successfully",
    ))
}

/// POST /api/auth/verify-email
pub async fn verify_email(
    State(state): State<AppState>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Response, AppError> {
    let (user, session) = state.verify_email(&req.email, &req.code)?;
    Ok(session_response(
        StatusCode::OK,
        &user,
        &session,
        state.config.session_ttl_days,
        "Email verified successfully",
    ))
}

/// Response for GET /api/auth/me
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: UserSummary,
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>, AppError> {
    let user = state.current_user(&auth.id)?;
    Ok(Json(MeResponse {
        user: user.summary(),
    }))
}

/// Response for POST /api/auth/logout
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = extract_session_token(&headers) {
        state.sessions.delete(&token)?;
    }

    // Expire the cookie on the way out
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(LogoutResponse {
            message: "Logged out".to_string(),
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::super::test_helpers::{self as helpers, TestHarness};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn register_sets_cookie_and_me_resolves_the_user() {
        let h = TestHarness::new();

        let req = helpers::post_json(
            "/api/auth/register",
            None,
            &json!({"email": "a@b.it", "password": "password123", "name": "Alice"}),
        );
        let resp = tower::ServiceExt::oneshot(h.router(), req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let set_cookie = resp
            .headers()
            .get(axum::http::header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("HttpOnly"));

        let token = h.register_user("b@b.it", "Bob");
        let (status, body) =
            helpers::send(h.router(), helpers::get("/api/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "b@b.it");
    }

    #[tokio::test]
    async fn logout_deletes_the_session() {
        let h = TestHarness::new();
        let token = h.register_user("a@b.it", "Alice");

        let (status, _) = helpers::send(
            h.router(),
            helpers::post_empty("/api/auth/logout", Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            helpers::send(h.router(), helpers::get("/api/auth/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
