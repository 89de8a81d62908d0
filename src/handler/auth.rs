use std::time::Duration;

use actix_web::cookie::{self, Cookie, SameSite};
use actix_web::http::{header, StatusCode};
use actix_web::{error, web, HttpResponse, ResponseError, Result};

use crate::error::json_error;
use crate::form::user::{CallbackQuery, RegisterFormData, SignInFormData, TokenResponse};
use crate::middleware::token::TOKEN_COOKIE;
use crate::service::auth::{AuthError, AuthService, RegisterCommand, SignInCommand};
use crate::service::google::{GoogleLoginError, GoogleLoginService};

/// How the `token` cookie is issued.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub max_age: Duration,
}

impl CookieSettings {
    fn token_cookie(&self, token: String) -> Cookie<'static> {
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);

        Cookie::build(TOKEN_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(cookie::time::Duration::seconds(max_age))
            .finish()
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::AlreadyExists => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

impl ResponseError for GoogleLoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            GoogleLoginError::InvalidState | GoogleLoginError::StateExpired => {
                StatusCode::BAD_REQUEST
            }
            GoogleLoginError::UserInfo(_) => StatusCode::BAD_GATEWAY,
            GoogleLoginError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            GoogleLoginError::AlreadyExists => StatusCode::CONFLICT,
            GoogleLoginError::TooManyStates => StatusCode::SERVICE_UNAVAILABLE,
            GoogleLoginError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

pub async fn registration(
    auth: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
    body: web::Json<RegisterFormData>,
) -> Result<HttpResponse, AuthError> {
    let RegisterFormData {
        username,
        email,
        password,
    } = body.into_inner();

    let token = web::block(move || {
        auth.register(RegisterCommand {
            username,
            email,
            password,
        })
    })
    .await
    .map_err(|e| AuthError::Unexpected(Box::new(e)))??;

    Ok(HttpResponse::Created()
        .cookie(cookies.token_cookie(token.clone()))
        .json(TokenResponse { token }))
}

pub async fn sign_in(
    auth: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
    body: web::Json<SignInFormData>,
) -> Result<HttpResponse, AuthError> {
    let SignInFormData { email, password } = body.into_inner();

    let token = web::block(move || auth.sign_in(SignInCommand { email, password }))
        .await
        .map_err(|e| AuthError::Unexpected(Box::new(e)))??;

    Ok(HttpResponse::Ok()
        .cookie(cookies.token_cookie(token.clone()))
        .json(TokenResponse { token }))
}

fn google_service(
    google: Option<web::Data<GoogleLoginService>>,
) -> Result<web::Data<GoogleLoginService>> {
    google.ok_or_else(|| error::ErrorNotFound("google login is not configured"))
}

pub async fn google_login(google: Option<web::Data<GoogleLoginService>>) -> Result<HttpResponse> {
    let google = google_service(google)?;

    Ok(HttpResponse::TemporaryRedirect()
        .append_header((header::LOCATION, google.redirect_url()?))
        .finish())
}

pub async fn google_callback(
    google: Option<web::Data<GoogleLoginService>>,
    cookies: web::Data<CookieSettings>,
    query: web::Query<CallbackQuery>,
) -> Result<HttpResponse> {
    let google = google_service(google)?;
    let token = google.callback(&query.state, &query.code).await?;

    Ok(HttpResponse::SeeOther()
        .cookie(cookies.token_cookie(token))
        .append_header((header::LOCATION, "/"))
        .finish())
}

pub async fn metrics(google: Option<web::Data<GoogleLoginService>>) -> Result<HttpResponse> {
    let google = google_service(google)?;

    Ok(HttpResponse::Ok().json(google.metrics()))
}
