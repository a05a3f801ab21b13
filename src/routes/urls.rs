/// URL Routes
///
/// Creating, listing and deleting aliases requires a bearer access token;
/// resolving an alias is public.

use actix_web::{http::header, web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, ErrorContext};
use crate::urls::UrlService;
use crate::validators::{is_valid_alias, is_valid_url};

#[derive(Deserialize)]
pub struct SaveUrlRequest {
    pub url: String,
    pub alias: Option<String>,
}

#[derive(Serialize)]
pub struct SaveUrlResponse {
    pub status: &'static str,
    pub alias: String,
}

#[derive(Serialize)]
pub struct UrlsResponse {
    pub status: &'static str,
    pub urls: BTreeMap<String, String>,
}

/// POST /api/v1/urls
///
/// # Errors
/// - 400: Invalid url or alias
/// - 401: Missing or invalid access token
/// - 409: Alias already taken
pub async fn save_url(
    user: AuthenticatedUser,
    form: web::Json<SaveUrlRequest>,
    urls: web::Data<UrlService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("url_save").with_user_id(user.user_id);

    let url = is_valid_url(&form.url)?;
    let alias = is_valid_alias(form.alias.as_deref())?;

    let alias = urls
        .save_url(&url, alias.as_deref(), user.user_id)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    Ok(HttpResponse::Ok().json(SaveUrlResponse { status: "OK", alias }))
}

/// GET /api/v1/urls
pub async fn list_urls(
    user: AuthenticatedUser,
    urls: web::Data<UrlService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("url_list").with_user_id(user.user_id);

    let urls = urls
        .get_all_user_urls(user.user_id)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    Ok(HttpResponse::Ok().json(UrlsResponse { status: "OK", urls }))
}

/// GET /api/v1/urls/{alias}
///
/// 302 to the stored url.
pub async fn redirect(
    path: web::Path<String>,
    urls: web::Data<UrlService>,
) -> Result<HttpResponse, AppError> {
    let alias = path.into_inner();
    let target = urls.get_url(&alias).await?;

    tracing::debug!(alias = %alias, "Redirecting");
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, target))
        .finish())
}

/// DELETE /api/v1/urls/{alias}
///
/// Only the owner can delete; anyone else gets 404.
pub async fn delete_url(
    user: AuthenticatedUser,
    path: web::Path<String>,
    urls: web::Data<UrlService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("url_delete").with_user_id(user.user_id);

    urls.delete_url(&path, user.user_id)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    Ok(HttpResponse::Ok().json(super::auth::StatusResponse::ok()))
}
