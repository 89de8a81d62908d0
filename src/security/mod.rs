pub mod oauth2;
pub mod token;

use actix_utils::future::{ready, Ready};
use actix_web::{dev::Payload, Error, FromRequest, HttpMessage, HttpRequest};

use token::Claims;

/// Identity of the caller, as established by the token middleware.
#[derive(Debug, Clone)]
pub enum SecurityToken {
    Anonymous,
    Authenticated { claims: Claims },
}

impl SecurityToken {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            SecurityToken::Authenticated { claims } => Some(claims.user_id()),
            _ => None,
        }
    }
}

impl FromRequest for SecurityToken {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<Claims>() {
            ready(Ok(SecurityToken::Authenticated {
                claims: claims.clone(),
            }))
        } else {
            ready(Ok(SecurityToken::Anonymous))
        }
    }
}
