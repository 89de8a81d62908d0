use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_utils::future::{ready, Ready};
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse,
};

use crate::security::token::TokenService;

pub const TOKEN_COOKIE: &str = "token";

// Middleware Factory
pub struct TokenMiddleware {
    token_service: Arc<dyn TokenService>,
    exceptions: Rc<HashSet<String>>,
}

impl TokenMiddleware {
    pub fn new(token_service: Arc<dyn TokenService>) -> Self {
        Self {
            token_service,
            exceptions: Rc::new(HashSet::new()),
        }
    }

    /// Lets requests for `path` through without a token.
    pub fn except(mut self, path: impl Into<String>) -> Self {
        Rc::make_mut(&mut self.exceptions).insert(path.into());
        self
    }
}

// Middleware Service
pub struct TokenGuard<S> {
    service: S,
    token_service: Arc<dyn TokenService>,
    exceptions: Rc<HashSet<String>>,
}

impl<S, B> Transform<S, ServiceRequest> for TokenMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = TokenGuard<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenGuard {
            service,
            token_service: self.token_service.clone(),
            exceptions: self.exceptions.clone(),
        }))
    }
}

impl<S, B> Service<ServiceRequest> for TokenGuard<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let exempt = self.exceptions.contains(req.path());

        let claims = request_token(&req).and_then(|token| self.token_service.validate(&token).ok());

        match claims {
            Some(claims) => {
                req.extensions_mut().insert(claims);
            }
            None if !exempt => {
                log::debug!("op=token_middleware: rejected request to {}", req.path());
                let (req, _payload) = req.into_parts();
                let res = HttpResponse::Unauthorized()
                    .json(serde_json::json!({ "error": "Unauthorized" }))
                    .map_into_right_body();
                return Box::pin(async { Ok(ServiceResponse::new(req, res)) });
            }
            None => {}
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// Reads the token from the `token` cookie, falling back to an
/// `Authorization: Bearer` header.
fn request_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}
