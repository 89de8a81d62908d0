mod config;
mod database;
mod domain;
mod error;
mod form;
mod handler;
mod middleware;
mod repository;
mod security;
mod service;
mod template;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tokio_util::sync::CancellationToken;

use config::{Mode, Settings};
use handler::auth::CookieSettings;
use repository::{InMemoryUserRepository, SqliteUserRepository, UserRepository};
use security::oauth2::GoogleOAuth2Provider;
use security::token::{JwtTokenService, TokenService};
use service::auth::AuthService;
use service::google::{GoogleLoginService, DEFAULT_CLEAN_INTERVAL};
use service::user::UserService;

fn invalid_input(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env().map_err(invalid_input)?;

    let users: Arc<dyn UserRepository> = match &settings.database_url {
        Some(url) => {
            let pool = database::initialize_db_pool(url, num_cpus::get() as u32 * 2)
                .map_err(invalid_input)?;
            Arc::new(SqliteUserRepository::new(pool))
        }
        None => {
            log::warn!("DATABASE_URL is not set, users are kept in memory");
            Arc::new(InMemoryUserRepository::new())
        }
    };
    let tokens: Arc<dyn TokenService> =
        Arc::new(JwtTokenService::new(&settings.jwt_secret, settings.token_ttl));

    let auth = web::Data::new(AuthService::new(
        users.clone(),
        tokens.clone(),
        settings.bcrypt_cost,
    ));
    let user_service = web::Data::new(UserService::new(users.clone()));
    let cookies = web::Data::new(CookieSettings {
        secure: settings.mode == Mode::Production,
        max_age: settings.token_ttl,
    });

    let cleaner = CancellationToken::new();
    let mut cleaner_task = None;
    let google = settings.google.clone().map(|google| {
        let service = Arc::new(GoogleLoginService::new(
            Arc::new(GoogleOAuth2Provider::new(google)),
            tokens.clone(),
            users.clone(),
            settings.request_timeout,
        ));
        cleaner_task = Some(service.spawn_state_cleaner(DEFAULT_CLEAN_INTERVAL, cleaner.clone()));
        web::Data::from(service)
    });
    if google.is_none() {
        log::info!("Google login is disabled, GOOGLE_CLIENT_ID is not set");
    }

    log::info!(
        "starting HTTP server at http://{}:{}",
        settings.host,
        settings.port
    );

    let result = HttpServer::new(move || {
        let mut app = App::new()
            .app_data(auth.clone())
            .app_data(user_service.clone())
            .app_data(cookies.clone());
        if let Some(google) = &google {
            app = app.app_data(google.clone());
        }

        let tokens = tokens.clone();
        app.wrap(actix_web::middleware::Logger::default())
            .configure(move |cfg| handler::configure(cfg, tokens))
            .default_service(web::route().to(handler::page::default_handler))
    })
    .bind((settings.host.as_str(), settings.port))?
    .workers(num_cpus::get() * 2)
    .run()
    .await;

    cleaner.cancel();
    if let Some(task) = cleaner_task {
        if let Err(e) = task.await {
            log::error!("state cleaner stopped abnormally: {e}");
        }
    }
    result
}
