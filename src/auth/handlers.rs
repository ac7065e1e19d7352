use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            AdminLoginRequest, AdminTokenResponse, AuthResponse, ForgotPasswordRequest,
            LoginRequest, PublicUser, RefreshRequest, ResetPasswordRequest, SignupRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        repo_types::User,
        services::{
            constant_time_eq, create_user, ensure_active, hash_password, normalize_email,
            password_fingerprint, reset_token_is_current, validate_new_password, validate_signup,
            verify_password, BLOCKED_MESSAGE,
        },
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/admin/login", post(admin_login))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_pair(keys: &JwtKeys, user: User) -> AppResult<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    if let Err(e) = validate_signup(&mut payload) {
        warn!(error = %e, "signup rejected");
        return Err(e);
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = create_user(&state.db, &payload, &hash).await?;

    info!(user_id = %user.id, user_code = %user.user_code, "user registered");
    let keys = JwtKeys::from_ref(&state);
    Ok((StatusCode::CREATED, Json(issue_pair(&keys, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = normalize_email(&payload.email);
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Please fill in email and password"));
    }

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    if user.is_blocked {
        warn!(user_id = %user.id, "blocked user attempted login");
        return Err(AppError::Forbidden(BLOCKED_MESSAGE.into()));
    }

    User::touch_last_sign_in(&state.db, user.id).await?;
    info!(user_id = %user.id, "user logged in");
    let keys = JwtKeys::from_ref(&state);
    Ok(Json(issue_pair(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = ensure_active(&state.db, claims.sub).await?;
    Ok(Json(issue_pair(&keys, user)?))
}

/// Tokens are stateless; the client drops them.
pub async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = ensure_active(&state.db, user_id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(AppError::bad_request("Please enter your email address"));
    }

    match User::find_by_email(&state.db, &email).await? {
        Some(user) if !user.is_blocked => {
            let fingerprint = password_fingerprint(&user.password_hash);
            let token = JwtKeys::from_ref(&state).sign_reset(user.id, &fingerprint)?;
            let link = reset_link(&state.config.public_url, &token);
            info!(user_id = %user.id, %link, "password reset link issued");
        }
        _ => warn!(%email, "password reset for unknown or blocked account"),
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "If the account exists, a reset link has been sent" })),
    ))
}

fn reset_link(public_url: &str, token: &str) -> String {
    format!("{}/reset-password?token={}", public_url.trim_end_matches('/'), token)
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<Value>> {
    if payload.token.trim().is_empty() {
        return Err(AppError::bad_request("Reset token is required"));
    }
    let expired = || AppError::Unauthorized("Invalid or expired reset link".into());
    let claims = JwtKeys::from_ref(&state)
        .verify_reset(payload.token.trim())
        .map_err(|_| expired())?;
    let Some(user) = User::find_by_id(&state.db, claims.sub).await? else {
        return Err(AppError::not_found("User not found"));
    };
    if !reset_token_is_current(&claims, &user) {
        warn!(user_id = %user.id, "reset token already used");
        return Err(expired());
    }
    validate_new_password(&payload.password, &payload.confirm_password)?;

    let hash = hash_password(&payload.password)?;
    if !User::replace_password(&state.db, user.id, &user.password_hash, &hash).await? {
        warn!(user_id = %user.id, "password changed during reset");
        return Err(expired());
    }
    info!(user_id = %claims.sub, "password updated");
    Ok(Json(json!({ "message": "Password updated successfully" })))
}

#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginRequest>,
) -> AppResult<Json<AdminTokenResponse>> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Please enter username and password"));
    }
    let admin = &state.config.admin;
    let username_ok = constant_time_eq(&payload.username, &admin.username);
    let password_ok = constant_time_eq(&payload.password, &admin.password);
    if !(username_ok & password_ok) {
        warn!(username = %payload.username, "admin login rejected");
        return Err(AppError::Unauthorized("Invalid username or password".into()));
    }
    info!(sub = %Uuid::nil(), "admin logged in");
    let access_token = JwtKeys::from_ref(&state).sign_admin()?;
    Ok(Json(AdminTokenResponse { access_token }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_link_joins_public_url() {
        assert_eq!(
            reset_link("https://portal.example/", "abc"),
            "https://portal.example/reset-password?token=abc"
        );
        assert_eq!(
            reset_link("http://localhost:5173", "t"),
            "http://localhost:5173/reset-password?token=t"
        );
    }

    #[test]
    fn public_user_never_serializes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            user_code: "123456789".into(),
            email: "test@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            full_name: "Test User".into(),
            mobile_number: "9876543210".into(),
            exam_preparing_for: "PO".into(),
            is_blocked: false,
            last_sign_in_at: None,
            created_at: time::OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("123456789"));
        assert!(!json.contains("argon2"));
    }
}
