use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AuthService, BcryptHasher, JwtTokenManager, SessionManager, TokenManager};
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::LoggerMiddleware;
use crate::routes::{
    delete_url, health_check, list_urls, logout, redirect, refresh, save_url, sign_in, sign_up,
};
use crate::store::{
    InMemoryRefreshSessionStore, InMemoryUrlStore, InMemoryUserStore, PgRefreshSessionStore,
    PgUrlStore, PgUserStore, RefreshSessionStore, UrlStore, UserStore,
};
use crate::urls::UrlService;

/// Shared application state handed to every worker.
#[derive(Clone)]
pub struct Services {
    pub auth: web::Data<AuthService>,
    pub urls: web::Data<UrlService>,
    pub tokens: web::Data<dyn TokenManager>,
}

impl Services {
    pub fn postgres(pool: PgPool, settings: &Settings) -> Self {
        Self::build(
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgRefreshSessionStore::new(pool.clone())),
            Arc::new(PgUrlStore::new(pool)),
            settings,
        )
    }

    /// Process-local storage; everything is lost on restart.
    pub fn in_memory(settings: &Settings) -> Self {
        Self::build(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryRefreshSessionStore::new()),
            Arc::new(InMemoryUrlStore::new()),
            settings,
        )
    }

    fn build(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn RefreshSessionStore>,
        urls: Arc<dyn UrlStore>,
        settings: &Settings,
    ) -> Self {
        let tokens: Arc<dyn TokenManager> = Arc::new(JwtTokenManager::from_settings(&settings.jwt));
        let session_manager =
            SessionManager::new(sessions, tokens.clone(), &settings.jwt, &settings.session);
        let hasher = Arc::new(BcryptHasher::new(settings.session.password_cost));

        Self {
            auth: web::Data::new(AuthService::new(users, session_manager, hasher)),
            urls: web::Data::new(UrlService::new(urls)),
            tokens: web::Data::from(tokens),
        }
    }
}

pub fn run(listener: TcpListener, services: Services) -> Result<Server, std::io::Error> {
    let server = HttpServer::new(move || {
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            tracing::debug!("Rejected request body: {}", err);
            AppError::Validation(ValidationError::InvalidFormat("request body")).into()
        });

        App::new()
            .wrap(LoggerMiddleware)
            // Shared state
            .app_data(json_config)
            .app_data(services.auth.clone())
            .app_data(services.urls.clone())
            .app_data(services.tokens.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1")
                    .service(
                        web::scope("/users/auth")
                            .route("/signup", web::post().to(sign_up))
                            .route("/signin", web::post().to(sign_in))
                            .route("/refresh", web::post().to(refresh))
                            .route("/logout", web::post().to(logout)),
                    )
                    // Protected handlers take an `AuthenticatedUser`; redirect is public.
                    .service(
                        web::resource("/urls")
                            .route(web::post().to(save_url))
                            .route(web::get().to(list_urls)),
                    )
                    .service(
                        web::resource("/urls/{alias}")
                            .route(web::get().to(redirect))
                            .route(web::delete().to(delete_url)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
