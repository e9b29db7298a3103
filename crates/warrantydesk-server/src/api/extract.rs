//! Request extractors whose rejections use the API error shape.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use super::routes::AppState;
use crate::server::ServiceError;

/// The authenticated caller, taken from a valid `Authorization: Bearer`
/// access token. Signature, algorithm, issuer, audience and expiry are all
/// enforced.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub name: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ServiceError::InvalidToken)?;

        let claims = state
            .jwt
            .validate(token)
            .map_err(|_| ServiceError::InvalidToken)?;

        if claims.user_id().is_none() {
            return Err(ServiceError::InvalidToken);
        }

        Ok(Self {
            user_id: claims.sub,
            name: claims.name,
        })
    }
}

/// JSON body. Malformed, mistyped or incomplete bodies are rejected as
/// [`ServiceError::Validation`] instead of axum's plain-text rejection.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}
