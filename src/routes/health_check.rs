use actix_web::HttpResponse;

use super::auth::StatusResponse;

/// GET /health_check
///
/// Liveness only; storage is not probed.
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().json(StatusResponse::ok())
}
