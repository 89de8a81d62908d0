use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::domain::user::User;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GOOGLE_SCOPES: &str = "openid email profile";

#[derive(Debug, thiserror::Error)]
pub enum OAuth2Error {
    #[error("invalid exchange operation")]
    Exchange(#[source] reqwest::Error),
    #[error("get user info error")]
    UserInfo(#[source] reqwest::Error),
    #[error("provider rejected the request: {0}")]
    Rejected(String),
}

/// Client credentials registered with Google.
#[derive(Debug, Clone)]
pub struct GoogleSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// An OAuth2 identity provider.
#[async_trait]
pub trait OAuth2Provider: Send + Sync {
    /// URL the browser is sent to in order to grant access; `state` comes back
    /// untouched on the callback.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for the profile of the user who granted it.
    async fn user_info(&self, code: &str) -> Result<User, OAuth2Error>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleUser {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    picture: String,
}

pub struct GoogleOAuth2Provider {
    settings: GoogleSettings,
    client: reqwest::Client,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuth2Provider {
    pub fn new(settings: GoogleSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    /// Points the code exchange and the profile lookup somewhere else.
    #[cfg(test)]
    pub fn with_endpoints(
        mut self,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    async fn exchange(&self, code: &str) -> Result<TokenResponse, OAuth2Error> {
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.as_str()),
                ("redirect_uri", self.settings.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(OAuth2Error::Exchange)?;

        check_status(response)
            .await?
            .json::<TokenResponse>()
            .await
            .map_err(OAuth2Error::Exchange)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<GoogleUser, OAuth2Error> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(OAuth2Error::UserInfo)?;

        check_status(response)
            .await?
            .json::<GoogleUser>()
            .await
            .map_err(OAuth2Error::UserInfo)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, OAuth2Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(OAuth2Error::Rejected(format!("{status}: {body}")))
}

#[async_trait]
impl OAuth2Provider for GoogleOAuth2Provider {
    fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.settings.client_id.as_str()),
            ("redirect_uri", self.settings.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", GOOGLE_SCOPES),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ];

        match Url::parse_with_params(GOOGLE_AUTH_URL, &params) {
            Ok(url) => url.into(),
            // The base URL is a constant, so this only happens if it is edited badly.
            Err(e) => {
                log::error!("op=authorize_url: {e}");
                GOOGLE_AUTH_URL.to_string()
            }
        }
    }

    async fn user_info(&self, code: &str) -> Result<User, OAuth2Error> {
        let token = self.exchange(code).await?;
        let user = self.fetch_user(&token.access_token).await?;

        Ok(User::from_google(user.id, user.name, user.email, user.picture))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use actix_web::dev::ServerHandle;
    use actix_web::http::header;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

    use super::*;

    const ACCESS_TOKEN: &str = "at-1";

    fn settings() -> GoogleSettings {
        GoogleSettings {
            client_id: "client-1".into(),
            client_secret: "secret".into(),
            redirect_url: "http://localhost:8080/api/v1/auth/google/callback".into(),
        }
    }

    async fn token_endpoint(form: web::Form<HashMap<String, String>>) -> HttpResponse {
        let field = |name: &str| form.get(name).map(String::as_str);
        if field("code") == Some("good")
            && field("client_secret") == Some("secret")
            && field("grant_type") == Some("authorization_code")
        {
            HttpResponse::Ok().json(serde_json::json!({
                "access_token": ACCESS_TOKEN,
                "token_type": "Bearer",
            }))
        } else {
            HttpResponse::BadRequest().body("invalid_grant")
        }
    }

    async fn userinfo_endpoint(req: HttpRequest, body: web::Data<&'static str>) -> HttpResponse {
        let bearer = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        if bearer == Some(format!("Bearer {ACCESS_TOKEN}").as_str()) {
            HttpResponse::Ok()
                .content_type("application/json")
                .body(*body.get_ref())
        } else {
            HttpResponse::Unauthorized().finish()
        }
    }

    /// Serves `/token` and `/userinfo` on a random local port. The userinfo
    /// endpoint answers with `userinfo_body` as is.
    fn fake_google(userinfo_body: &'static str) -> (GoogleOAuth2Provider, ServerHandle) {
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(userinfo_body))
                .route("/token", web::post().to(token_endpoint))
                .route("/userinfo", web::get().to(userinfo_endpoint))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let provider = GoogleOAuth2Provider::new(settings()).with_endpoints(
            format!("http://{addr}/token"),
            format!("http://{addr}/userinfo"),
        );
        (provider, handle)
    }

    #[actix_web::test]
    async fn user_info_exchanges_the_code_for_a_profile() {
        let (provider, server) = fake_google(
            r#"{"id":"g-42","name":"Alex Miller","email":"Alex@Gmail.com","picture":"pic"}"#,
        );

        let user = provider.user_info("good").await.unwrap();

        assert_eq!(user.id, "g-42");
        assert_eq!(user.username, "Alex Miller");
        assert_eq!(user.email, "alex@gmail.com");
        assert_eq!(user.picture, "pic");
        assert!(user.password_hash.is_none());
        server.stop(false).await;
    }

    #[actix_web::test]
    async fn rejected_code_reports_the_provider_answer() {
        let (provider, server) = fake_google(r#"{"id":"g-42"}"#);

        let err = provider.user_info("expired").await.unwrap_err();

        match err {
            OAuth2Error::Rejected(message) => {
                assert!(message.starts_with("400"), "{message}");
                assert!(message.contains("invalid_grant"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        server.stop(false).await;
    }

    #[actix_web::test]
    async fn malformed_profile_is_a_user_info_error() {
        let (provider, server) = fake_google("<html>not json</html>");

        let err = provider.user_info("good").await.unwrap_err();

        assert!(matches!(err, OAuth2Error::UserInfo(_)), "{err:?}");
        server.stop(false).await;
    }

    #[test]
    fn authorize_url_carries_the_state_and_client() {
        let provider = GoogleOAuth2Provider::new(settings());

        let url = Url::parse(&provider.authorize_url("state123")).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert!(query.contains(&("state".into(), "state123".into())));
        assert!(query.contains(&("client_id".into(), "client-1".into())));
        assert!(query.contains(&("access_type".into(), "offline".into())));
        assert!(query.contains(&("prompt".into(), "consent".into())));
        assert!(query.contains(&(
            "redirect_uri".into(),
            "http://localhost:8080/api/v1/auth/google/callback".into()
        )));
    }
}
