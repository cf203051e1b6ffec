//! Auth API Endpoints
//!
//! - POST /register - Create a venue and its owner account
//! - POST /login - Password-based login
//! - POST /refresh - Rotate a refresh token for a new token pair
//! - POST /logout - Revoke the current access token
//! - GET /me - Get current user info

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use gl_auth::{generate_refresh_token, AccessClaims, AuthConfig, RevocationStore, TokenCodec};
use gl_common::{User, UserRole, Venue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::middleware::Authenticated;
use crate::error::PlatformError;
use crate::repository::{UserRepository, VenueRepository};
use crate::service::password::{validate_password_strength, PasswordService};

/// Registration request: creates a venue and its owner in one step
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Venue name
    pub venue_name: String,

    /// Owner email address (also the login)
    pub email: String,

    /// Owner password
    pub password: String,

    /// Owner first name
    pub first_name: String,

    /// Owner last name
    pub last_name: String,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// Token pair response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Access token
    pub access_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Access-token lifetime in seconds
    pub expires_in: i64,

    /// Refresh token
    pub refresh_token: String,
}

/// Refresh token request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    /// The refresh token to rotate
    pub refresh_token: String,
}

/// Logout request
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    /// Refresh token to delete alongside the access-token revocation
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// When true, every outstanding refresh token for the account is revoked
    #[serde(default)]
    pub all_devices: bool,
}

/// Current user info response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub venue_name: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
}

/// Auth service state
#[derive(Clone)]
pub struct AuthApiState {
    pub users: Arc<dyn UserRepository>,
    pub venues: Arc<dyn VenueRepository>,
    pub password_service: Arc<PasswordService>,
    pub codec: TokenCodec,
    pub store: Arc<dyn RevocationStore>,
    pub config: AuthConfig,
}

impl AuthApiState {
    /// Mint an access token and store a fresh refresh token for `user`.
    async fn issue_token_pair(&self, user: &User) -> Result<TokenResponse, PlatformError> {
        let claims = AccessClaims::new(
            user.id,
            user.role,
            user.venue_id,
            self.config.access_token_ttl(),
        );
        let access_token = self
            .codec
            .mint(&claims)
            .map_err(|e| PlatformError::internal(e.to_string()))?;

        let refresh_token = generate_refresh_token();
        self.store
            .put_refresh_token(&refresh_token, user.id, self.config.refresh_token_ttl_seconds())
            .await?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_ttl_seconds() as i64,
            refresh_token,
        })
    }
}

/// Register a new venue and owner account
///
/// Creates the venue and its owner user, then returns a token pair so the
/// owner is signed in immediately.
#[utoipa::path(
    post,
    path = "/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Venue and owner created", body = TokenResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AuthApiState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), PlatformError> {
    if req.venue_name.trim().is_empty() {
        return Err(PlatformError::validation("Venue name must not be empty"));
    }
    if !req.email.contains('@') {
        return Err(PlatformError::validation("Invalid email address"));
    }
    validate_password_strength(&req.password)?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(PlatformError::duplicate("User", "email", &req.email));
    }

    let now = Utc::now();
    let venue = Venue {
        id: Uuid::new_v4(),
        name: req.venue_name.trim().to_string(),
        email: req.email.clone(),
        address: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.venues.insert(&venue).await?;

    let user = User {
        id: Uuid::new_v4(),
        venue_id: venue.id,
        email: req.email,
        password_hash: state.password_service.hash_password(&req.password)?,
        first_name: req.first_name,
        last_name: req.last_name,
        role: UserRole::Owner,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.users.insert(&user).await?;

    info!(venue_id = %venue.id, user_id = %user.id, "Registered venue and owner");
    let tokens = state.issue_token_pair(&user).await?;
    Ok((StatusCode::CREATED, Json(tokens)))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthApiState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, PlatformError> {
    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(PlatformError::InvalidCredentials)?;

    if !state
        .password_service
        .verify_password(&req.password, &user.password_hash)
    {
        return Err(PlatformError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(PlatformError::unauthorized("Account is not active"));
    }

    info!(user_id = %user.id, "User logged in");
    Ok(Json(state.issue_token_pair(&user).await?))
}

/// Refresh access token
///
/// Exchanges a refresh token for a new token pair. The old refresh token is
/// consumed atomically, so a given token can be rotated at most once.
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 401, description = "Invalid refresh token")
    )
)]
pub async fn refresh(
    State(state): State<AuthApiState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, PlatformError> {
    let subject = state
        .store
        .claim_refresh_token(&req.refresh_token)
        .await?
        .ok_or_else(|| PlatformError::invalid_token("Invalid or expired refresh token"))?;

    let user = state
        .users
        .find_by_id(subject)
        .await?
        .ok_or_else(|| PlatformError::invalid_token("Unknown subject"))?;

    if !user.is_active {
        return Err(PlatformError::unauthorized("Account is not active"));
    }

    Ok(Json(state.issue_token_pair(&user).await?))
}

/// Logout
///
/// Blacklists the current access token for its remaining lifetime and
/// deletes the supplied refresh token.
#[utoipa::path(
    post,
    path = "/logout",
    tag = "auth",
    request_body = LogoutRequest,
    responses(
        (status = 204, description = "Logout successful"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<AuthApiState>,
    auth: Authenticated,
    Json(req): Json<LogoutRequest>,
) -> Result<impl IntoResponse, PlatformError> {
    let identity = auth.0;

    state
        .store
        .blacklist(&identity.token_id, identity.remaining_ttl_seconds())
        .await?;

    if req.all_devices {
        let revoked = state
            .store
            .revoke_all_refresh_tokens(identity.user_id)
            .await?;
        info!(user_id = %identity.user_id, revoked, "Revoked all refresh tokens");
    } else if let Some(refresh_token) = &req.refresh_token {
        state.store.delete_refresh_token(refresh_token).await?;
    }

    info!(user_id = %identity.user_id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user info", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_user(
    State(state): State<AuthApiState>,
    auth: Authenticated,
) -> Result<Json<CurrentUserResponse>, PlatformError> {
    let identity = auth.0;
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| PlatformError::not_found("User", identity.user_id.to_string()))?;
    let venue = state
        .venues
        .find_by_id(user.venue_id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Venue", user.venue_id.to_string()))?;

    Ok(Json(CurrentUserResponse {
        id: user.id,
        venue_id: user.venue_id,
        venue_name: venue.name,
        email: user.email.clone(),
        name: user.full_name(),
        role: user.role,
    }))
}

/// Create the auth router
pub fn auth_router(state: AuthApiState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_deserialization() {
        let json = r#"{"venueName":"The Basement","email":"owner@basement.club","password":"Str0ng-enough-pw","firstName":"Ada","lastName":"Lovelace"}"#;
        let req: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.venue_name, "The Basement");
        assert_eq!(req.email, "owner@basement.club");
    }

    #[test]
    fn test_token_response_serialization() {
        let response = TokenResponse {
            access_token: "token123".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 86400,
            refresh_token: "refresh123".to_string(),
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("accessToken"));
        assert!(json.contains("refreshToken"));
        assert!(json.contains("expiresIn"));
    }

    #[test]
    fn test_logout_request_allows_empty_body() {
        let req: LogoutRequest = serde_json::from_str("{}").unwrap();
        assert!(req.refresh_token.is_none());
    }
}
