mod memory;
mod sqlite;

pub use memory::InMemoryUserRepository;
pub use sqlite::SqliteUserRepository;

use crate::domain::user::User;
use crate::error::BoxError;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("user not found")]
    NotFound,
    #[error("user already exists")]
    AlreadyExists,
    #[error("repository failure")]
    Unexpected(#[source] BoxError),
}

/// Storage of user accounts.
///
/// Implementations block; callers on the async side go through `web::block`.
pub trait UserRepository: Send + Sync {
    /// Stores a new user. A user with the same id or email yields
    /// [`RepositoryError::AlreadyExists`].
    fn add_user(&self, user: &User) -> Result<(), RepositoryError>;

    fn get_user_by_id(&self, id: &str) -> Result<User, RepositoryError>;

    fn get_user_by_email(&self, email: &str) -> Result<User, RepositoryError>;
}
