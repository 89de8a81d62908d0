use std::sync::Arc;

use crate::domain::user::User;
use crate::error::BoxError;
use crate::repository::{RepositoryError, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("Something went wrong. Please retry later.")]
    Unexpected(#[source] BoxError),
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub fn get_by_id(&self, id: &str) -> Result<User, UserError> {
        match self.users.get_user_by_id(id) {
            Ok(user) => {
                log::debug!("op=get_by_id: success operation");
                Ok(user)
            }
            Err(RepositoryError::NotFound) => Err(UserError::NotFound),
            Err(e) => {
                log::error!("op=get_by_id: repository error: {e}");
                Err(UserError::Unexpected(Box::new(e)))
            }
        }
    }
}
