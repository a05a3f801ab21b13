/// Bearer access-token extraction
///
/// Protected handlers take an `AuthenticatedUser` argument. The extractor reads
/// `Authorization: Bearer <token>`, parses it with the registered
/// `TokenManager` and rejects the request with 401 before the handler runs.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};

use crate::auth::jwt::TokenManager;
use crate::auth::service::AuthError;
use crate::error::AppError;
use crate::store::UserId;

#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let tokens = req
        .app_data::<web::Data<dyn TokenManager>>()
        .ok_or_else(|| AppError::Internal("token manager is not registered".to_string()))?;

    let token = bearer_token(req).ok_or_else(|| {
        tracing::warn!(path = %req.path(), "Missing or invalid Authorization header");
        AppError::Auth(AuthError::MissingToken)
    })?;

    let subject = tokens.parse(token).map_err(|e| {
        tracing::warn!(path = %req.path(), error = %e, "Access token rejected");
        AppError::Auth(AuthError::InvalidToken)
    })?;

    let user_id = subject.parse::<UserId>().map_err(|_| {
        tracing::warn!(subject = %subject, "Access token subject is not a user id");
        AppError::Auth(AuthError::InvalidToken)
    })?;

    tracing::debug!(user_id, "Access token validated");
    Ok(AuthenticatedUser { user_id })
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
