//! API Middleware
//!
//! Authentication extractor for Axum handlers.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use gl_auth::{AuthGate, AuthIdentity, AuthRejection};
use std::sync::Arc;

use crate::api::common::ApiError;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthGate>,
}

/// Extractor for authenticated requests.
/// Runs the full gate pipeline and rejects before the handler body runs.
pub struct Authenticated(pub AuthIdentity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let app_state = parts.extensions.get::<AppState>().ok_or_else(|| {
            let error = ApiError::new("INTERNAL_ERROR", "AppState not found");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
        })?;

        let authorization = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let identity = app_state
            .gate
            .authenticate(authorization)
            .await
            .map_err(reject)?;

        Ok(Authenticated(identity))
    }
}

fn reject(rejection: AuthRejection) -> Response {
    let (status, error) = match &rejection {
        AuthRejection::StoreUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::new("SERVICE_UNAVAILABLE", "Service temporarily unavailable"),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            ApiError::new("UNAUTHORIZED", rejection.to_string()),
        ),
    };
    (status, Json(error)).into_response()
}
