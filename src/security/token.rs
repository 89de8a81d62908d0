use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const ALGORITHM: Algorithm = Algorithm::HS256;
pub const ISSUER: &str = "fpart";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token encoding failed")]
    Encode(#[source] jsonwebtoken::errors::Error),
}

/// The claims that are stored in the JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub id: String,
    pub iat: u64,
    pub exp: u64,
    pub nbf: u64,
    pub iss: String,
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.id
    }
}

pub trait TokenService: Send + Sync {
    fn generate(&self, user_id: &str) -> Result<String, TokenError>;

    fn validate(&self, token: &str) -> Result<Claims, TokenError>;
}

/// HMAC-signed JWTs.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn claims_for(&self, user_id: &str, issued_at: u64) -> Claims {
        Claims {
            id: user_id.to_string(),
            iat: issued_at,
            exp: issued_at + self.ttl.as_secs(),
            nbf: issued_at,
            iss: ISSUER.to_string(),
        }
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key).map_err(TokenError::Encode)
    }
}

impl TokenService for JwtTokenService {
    fn generate(&self, user_id: &str) -> Result<String, TokenError> {
        self.encode_claims(&self.claims_for(user_id, unix_now()))
    }

    fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[ISSUER]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("op=validate_token: {e}");
                TokenError::InvalidToken
            })
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
