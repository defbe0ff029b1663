//! User signup and login

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::password::{hash_password, verify_password};
use crate::store::User;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[derive(Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: User,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// PBKDF2 is CPU-bound; keep it off the async workers
async fn hash_blocking(password: String, iterations: u32) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password, iterations))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn verify_blocking(password: String, stored: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let Json(req) = body?;
    let (Some(name), Some(email), Some(password)) = (
        non_empty(req.name),
        non_empty(req.email),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::InvalidInput("Missing fields".to_string()));
    };
    let phone = non_empty(req.phone);

    let hash = hash_blocking(password, state.password_iterations).await?;
    let id = state
        .store
        .create_user(&name, &email, phone.as_deref(), &hash)
        .await?;

    tracing::info!("Registered user {}", id);
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created".to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = body?;
    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let (Some(email), Some(password)) = (non_empty(req.email), req.password) else {
        return Err(invalid());
    };

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_blocking(password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    Ok(Json(LoginResponse { user }))
}

#[cfg(test)]
mod tests {
    use crate::app::test_support::*;
    use axum::http::StatusCode;

    const SIGNUP: &str =
        r#"{"name": "Asha", "email": "asha@example.com", "phone": "555-0100", "password": "hunter22"}"#;

    #[tokio::test]
    async fn test_signup_then_login() {
        let state = test_state();
        let (status, body) = send(&state, post_json("/api/signup", SIGNUP)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "User created");

        let (status, body) = send(
            &state,
            post_json(
                "/api/login",
                r#"{"email": "asha@example.com", "password": "hunter22"}"#,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["name"], "Asha");
        assert_eq!(body["user"]["phone"], "555-0100");
        assert!(body["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_signup_duplicate_is_409() {
        let state = test_state();
        send(&state, post_json("/api/signup", SIGNUP)).await;
        let (status, body) = send(&state, post_json("/api/signup", SIGNUP)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Email already exists");
    }

    #[tokio::test]
    async fn test_signup_missing_fields() {
        let (status, body) = send(
            &test_state(),
            post_json("/api/signup", r#"{"name": "Asha", "email": " "}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing fields");
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_user() {
        let state = test_state();
        send(&state, post_json("/api/signup", SIGNUP)).await;

        for body in [
            r#"{"email": "asha@example.com", "password": "wrong"}"#,
            r#"{"email": "nobody@example.com", "password": "hunter22"}"#,
            r#"{}"#,
        ] {
            let (status, _) = send(&state, post_json("/api/login", body)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "body: {}", body);
        }
    }
}
