pub mod auth;
pub mod page;
pub mod user;

use std::sync::Arc;

use actix_web::web;

use crate::middleware::token::TokenMiddleware;
use crate::security::token::TokenService;

pub const REGISTRATION_PATH: &str = "/api/v1/auth/registration";
pub const SIGN_IN_PATH: &str = "/api/v1/auth/signin";
pub const GOOGLE_LOGIN_PATH: &str = "/api/v1/auth/google";
pub const GOOGLE_CALLBACK_PATH: &str = "/api/v1/auth/google/callback";

/// Mounts the form page and the `/api/v1` routes. The API scope requires a
/// token except on the sign-up / sign-in endpoints.
pub fn configure(cfg: &mut web::ServiceConfig, tokens: Arc<dyn TokenService>) {
    cfg.route("/", web::get().to(page::index)).service(
        web::scope("/api/v1")
            .wrap(
                TokenMiddleware::new(tokens)
                    .except(REGISTRATION_PATH)
                    .except(SIGN_IN_PATH)
                    .except(GOOGLE_LOGIN_PATH)
                    .except(GOOGLE_CALLBACK_PATH),
            )
            .service(
                web::scope("/auth")
                    .route("/registration", web::post().to(auth::registration))
                    .route("/signin", web::post().to(auth::sign_in))
                    .route("/google", web::get().to(auth::google_login))
                    .route("/google/callback", web::get().to(auth::google_callback))
                    .route("/metrics", web::get().to(auth::metrics)),
            )
            .route("/user", web::get().to(user::get_user)),
    );
}
