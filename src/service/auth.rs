use std::sync::Arc;

use crate::domain::user::{self, User, ValidationError};
use crate::error::BoxError;
use crate::repository::{RepositoryError, UserRepository};
use crate::security::token::TokenService;

pub struct RegisterCommand {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub struct SignInCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("user already exists")]
    AlreadyExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("Something went wrong. Please retry later.")]
    Unexpected(#[source] BoxError),
}

/// Password based registration and sign-in.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenService>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenService>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    /// Creates an account and returns a token for it.
    pub fn register(&self, cmd: RegisterCommand) -> Result<String, AuthError> {
        // Validate before paying for the hash.
        let mut user = User::register(&cmd.username, &cmd.email, String::new())?;
        let hash = bcrypt::hash(cmd.password.as_str(), self.bcrypt_cost)
            .map_err(|e| AuthError::Unexpected(Box::new(e)))?;
        user.password_hash = Some(hash);

        self.users.add_user(&user).map_err(|e| match e {
            RepositoryError::AlreadyExists => AuthError::AlreadyExists,
            e => {
                log::error!("op=register: repository error: {e}");
                AuthError::Unexpected(Box::new(e))
            }
        })?;

        let token = self
            .tokens
            .generate(&user.id)
            .map_err(|e| AuthError::Unexpected(Box::new(e)))?;

        log::debug!("op=register: user {} registered", user.id);
        Ok(token)
    }

    pub fn sign_in(&self, cmd: SignInCommand) -> Result<String, AuthError> {
        let email = user::normalize_email(&cmd.email);
        user::validate_email(&email)?;

        let user = match self.users.get_user_by_email(&email) {
            Ok(user) => user,
            Err(RepositoryError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => {
                log::error!("op=sign_in: repository error: {e}");
                return Err(AuthError::Unexpected(Box::new(e)));
            }
        };

        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        let is_valid = bcrypt::verify(cmd.password.as_str(), hash)
            .map_err(|e| AuthError::Unexpected(Box::new(e)))?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .tokens
            .generate(&user.id)
            .map_err(|e| AuthError::Unexpected(Box::new(e)))?;

        log::debug!("op=sign_in: user {} signed in", user.id);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::repository::InMemoryUserRepository;
    use crate::security::token::JwtTokenService;

    struct Fixture {
        service: AuthService,
        users: Arc<InMemoryUserRepository>,
        tokens: Arc<JwtTokenService>,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserRepository::new());
        let tokens = Arc::new(JwtTokenService::new("secret123", Duration::from_secs(60)));
        Fixture {
            service: AuthService::new(users.clone(), tokens.clone(), 4),
            users,
            tokens,
        }
    }

    fn register(username: &str, email: &str, password: &str) -> RegisterCommand {
        RegisterCommand {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn sign_in(email: &str, password: &str) -> SignInCommand {
        SignInCommand {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn register_stores_a_hashed_password_and_returns_a_token() {
        let f = fixture();

        let token = f.service.register(register("alex", "alex@example.org", "hunter2")).unwrap();

        let claims = f.tokens.validate(&token).unwrap();
        let stored = f.users.get_user_by_id(claims.user_id()).unwrap();
        assert_eq!(stored.username, "alex");
        let hash = stored.password_hash.unwrap();
        assert_ne!(hash, "hunter2");
        assert!(bcrypt::verify("hunter2", &hash).unwrap());
    }

    #[test]
    fn register_rejects_invalid_fields() {
        let f = fixture();

        assert!(matches!(
            f.service.register(register("a", "alex@example.org", "pw")),
            Err(AuthError::Validation(ValidationError::InvalidUsername))
        ));
        assert!(matches!(
            f.service.register(register("alex", "not-an-email", "pw")),
            Err(AuthError::Validation(ValidationError::InvalidEmail))
        ));
    }

    #[test]
    fn register_twice_with_the_same_email_conflicts() {
        let f = fixture();
        f.service.register(register("alex", "alex@example.org", "pw")).unwrap();

        assert!(matches!(
            f.service.register(register("bob", "alex@example.org", "pw")),
            Err(AuthError::AlreadyExists)
        ));
    }

    #[test]
    fn email_case_does_not_make_a_new_identity() {
        let f = fixture();
        f.service
            .register(register("alex", "Alex@Example.org", "pw"))
            .unwrap();

        assert!(f.service.sign_in(sign_in("alex@example.org", "pw")).is_ok());
        assert!(f.service.sign_in(sign_in("ALEX@EXAMPLE.ORG", "pw")).is_ok());
        assert!(matches!(
            f.service.register(register("bob", "alex@example.org", "pw")),
            Err(AuthError::AlreadyExists)
        ));
    }

    #[test]
    fn sign_in_with_the_right_password() {
        let f = fixture();
        let registered = f.service.register(register("alex", "alex@example.org", "pw")).unwrap();

        let token = f.service.sign_in(sign_in("alex@example.org", "pw")).unwrap();

        assert_eq!(
            f.tokens.validate(&token).unwrap().id,
            f.tokens.validate(&registered).unwrap().id
        );
    }

    #[test]
    fn sign_in_failures_do_not_reveal_which_part_was_wrong() {
        let f = fixture();
        f.service.register(register("alex", "alex@example.org", "pw")).unwrap();

        assert!(matches!(
            f.service.sign_in(sign_in("alex@example.org", "wrong")),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            f.service.sign_in(sign_in("nobody@example.org", "pw")),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn sign_in_rejects_malformed_email() {
        let f = fixture();

        assert!(matches!(
            f.service.sign_in(sign_in("alex", "pw")),
            Err(AuthError::Validation(ValidationError::InvalidEmail))
        ));
    }

    #[test]
    fn google_accounts_cannot_sign_in_with_a_password() {
        let f = fixture();
        f.users
            .add_user(&User::from_google("g-1", "Alex", "alex@gmail.com", ""))
            .unwrap();

        assert!(matches!(
            f.service.sign_in(sign_in("alex@gmail.com", "")),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
