/// Authentication Routes
///
/// Sign up, sign in, refresh and logout. The refresh token travels in an
/// HttpOnly `refreshToken` cookie scoped to the auth routes; refresh and
/// logout also accept it in the JSON body for clients without a cookie jar.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, AuthService, LogoutOutcome, SignInInput, SignUpInput, Tokens};
use crate::error::{AppError, ErrorContext};
use crate::validators::{is_present, is_valid_login, is_valid_password};

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";
pub const REFRESH_COOKIE_PATH: &str = "/api/v1/users/auth";

/// Sign up / sign in request
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub login: String,
    pub password: String,
}

/// Body fallback for refresh and logout
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "OK" }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub status: &'static str,
    pub access_token: String,
    pub refresh_token: String,
}

fn refresh_cookie(tokens: &Tokens) -> Cookie<'static> {
    let remaining = (tokens.expires_at - Utc::now()).num_seconds().max(0);
    Cookie::build(REFRESH_COOKIE_NAME, tokens.refresh_token.clone())
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(remaining))
        .finish()
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build(REFRESH_COOKIE_NAME, "")
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Strict)
        .finish();
    cookie.make_removal();
    cookie
}

fn tokens_response(tokens: Tokens) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(refresh_cookie(&tokens))
        .json(TokenResponse {
            status: "OK",
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
}

/// Cookie first, then the JSON body.
fn refresh_token_from(
    req: &HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
) -> Option<String> {
    req.cookie(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token))
        .filter(|t| !t.trim().is_empty())
}

/// POST /api/v1/users/auth/signup
///
/// # Validation
/// - Login: 4 to 128 characters
/// - Password: 8 to 72 bytes, at least one of `!*&^?#@)(-+=$_`
///
/// # Errors
/// - 400: Validation errors
/// - 409: Login already in use
/// - 500: Internal server error
pub async fn sign_up(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_sign_up");

    let login = is_valid_login(&form.login)?;
    let password = is_valid_password(&form.password)?;

    let user_id = auth
        .sign_up(SignUpInput { login, password })
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(request_id = %context.request_id, user_id, "User created");
    Ok(HttpResponse::Ok().json(StatusResponse::ok()))
}

/// POST /api/v1/users/auth/signin
///
/// Returns the token pair and sets the refresh cookie.
///
/// # Security Notes
/// - Unknown login and wrong password return the same 401 body
pub async fn sign_in(
    form: web::Json<CredentialsRequest>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_sign_in");

    let login = is_present("login", &form.login)?.to_string();
    is_present("password", &form.password)?;

    let tokens = auth
        .sign_in(SignInInput {
            login,
            password: form.password.clone(),
        })
        .await
        .map_err(|e| context.log_error(e.into()))?;

    tracing::info!(request_id = %context.request_id, "Signed in");
    Ok(tokens_response(tokens))
}

/// POST /api/v1/users/auth/refresh
///
/// Consumes the presented refresh token and issues a new pair. A token can be
/// used once; replays get 401.
pub async fn refresh(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let refresh_token = refresh_token_from(&req, body).ok_or(AuthError::InvalidSession)?;
    let tokens = auth
        .refresh(&refresh_token)
        .await
        .map_err(|e| context.log_error(e.into()))?;

    Ok(tokens_response(tokens))
}

/// POST /api/v1/users/auth/logout
///
/// Revokes the session and clears the cookie. An unknown or already used
/// token still answers 200.
pub async fn logout(
    req: HttpRequest,
    body: Option<web::Json<RefreshRequest>>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_logout");

    let outcome = match refresh_token_from(&req, body) {
        Some(token) => auth
            .logout(&token)
            .await
            .map_err(|e| context.log_error(e.into()))?,
        None => LogoutOutcome::AlreadyLoggedOut,
    };

    tracing::info!(request_id = %context.request_id, outcome = ?outcome, "Logout");
    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(StatusResponse::ok()))
}
