use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{RepositoryError, UserRepository};
use crate::domain::user::User;

#[derive(Default)]
struct Storage {
    users: HashMap<String, User>,
    /// email -> id
    emails: HashMap<String, String>,
}

/// Process-local user storage, used when no database is configured.
#[derive(Default)]
pub struct InMemoryUserRepository {
    storage: Mutex<Storage>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn storage(&self) -> MutexGuard<'_, Storage> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl UserRepository for InMemoryUserRepository {
    fn add_user(&self, user: &User) -> Result<(), RepositoryError> {
        let mut storage = self.storage();
        if storage.users.contains_key(&user.id) || storage.emails.contains_key(&user.email) {
            return Err(RepositoryError::AlreadyExists);
        }

        storage.emails.insert(user.email.clone(), user.id.clone());
        storage.users.insert(user.id.clone(), user.clone());

        Ok(())
    }

    fn get_user_by_id(&self, id: &str) -> Result<User, RepositoryError> {
        self.storage()
            .users
            .get(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    fn get_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let storage = self.storage();
        storage
            .emails
            .get(email)
            .and_then(|id| storage.users.get(id))
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_finds_users() {
        let repo = InMemoryUserRepository::new();
        let user = User::from_google(
            "user-id",
            "Alex Miller",
            "example@gmail.com",
            "url://pic.png",
        );

        repo.add_user(&user).unwrap();

        assert_eq!(repo.get_user_by_id("user-id").unwrap(), user);
        assert_eq!(repo.get_user_by_email("example@gmail.com").unwrap(), user);
    }

    #[test]
    fn rejects_duplicates() {
        let repo = InMemoryUserRepository::new();
        let user = User::from_google("user-id", "Alex Miller", "example@gmail.com", "");
        repo.add_user(&user).unwrap();

        let same_id = User::from_google("user-id", "Other", "other@gmail.com", "");
        let same_email = User::from_google("other-id", "Other", "example@gmail.com", "");

        assert!(matches!(repo.add_user(&same_id), Err(RepositoryError::AlreadyExists)));
        assert!(matches!(repo.add_user(&same_email), Err(RepositoryError::AlreadyExists)));
    }

    #[test]
    fn missing_users_are_not_found() {
        let repo = InMemoryUserRepository::new();

        assert!(matches!(repo.get_user_by_id("nope"), Err(RepositoryError::NotFound)));
        assert!(matches!(
            repo.get_user_by_email("nope@example.org"),
            Err(RepositoryError::NotFound)
        ));
    }
}
