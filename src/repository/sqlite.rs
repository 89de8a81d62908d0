use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::SqliteConnection;

use super::{RepositoryError, UserRepository};
use crate::database::{self, action, model::user::UserRecord};
use crate::domain::user::User;

pub struct SqliteUserRepository {
    pool: database::Pool,
}

impl SqliteUserRepository {
    pub fn new(pool: database::Pool) -> Self {
        Self { pool }
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut SqliteConnection) -> Result<T, DieselError>,
    ) -> Result<T, RepositoryError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| RepositoryError::Unexpected(Box::new(e)))?;

        f(&mut *conn).map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                RepositoryError::AlreadyExists
            }
            e => RepositoryError::Unexpected(Box::new(e)),
        })
    }
}

impl UserRepository for SqliteUserRepository {
    fn add_user(&self, user: &User) -> Result<(), RepositoryError> {
        let record = UserRecord::from(user);
        self.with_connection(|conn| action::user::insert_user(conn, &record))?;

        Ok(())
    }

    fn get_user_by_id(&self, id: &str) -> Result<User, RepositoryError> {
        self.with_connection(|conn| action::user::get_user_by_id(conn, id))?
            .map(User::from)
            .ok_or(RepositoryError::NotFound)
    }

    fn get_user_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        self.with_connection(|conn| action::user::get_user_by_email(conn, email))?
            .map(User::from)
            .ok_or(RepositoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> SqliteUserRepository {
        SqliteUserRepository::new(database::in_memory_pool())
    }

    #[test]
    fn round_trips_a_registered_user() {
        let repo = repository();
        let user = User::register("alex", "alex@example.org", "$2b$04$hash").unwrap();

        repo.add_user(&user).unwrap();

        assert_eq!(repo.get_user_by_id(&user.id).unwrap(), user);
        assert_eq!(repo.get_user_by_email("alex@example.org").unwrap(), user);
    }

    #[test]
    fn keeps_google_users_without_password() {
        let repo = repository();
        let user = User::from_google("g-42", "Alex Miller", "alex@gmail.com", "https://pic");

        repo.add_user(&user).unwrap();

        assert_eq!(repo.get_user_by_id("g-42").unwrap().password_hash, None);
    }

    #[test]
    fn unique_violations_become_already_exists() {
        let repo = repository();
        let user = User::from_google("g-42", "Alex Miller", "alex@gmail.com", "");
        repo.add_user(&user).unwrap();

        let same_email = User::from_google("g-43", "Alex", "alex@gmail.com", "");

        assert!(matches!(repo.add_user(&user), Err(RepositoryError::AlreadyExists)));
        assert!(matches!(repo.add_user(&same_email), Err(RepositoryError::AlreadyExists)));
    }

    #[test]
    fn missing_rows_are_not_found() {
        let repo = repository();

        assert!(matches!(repo.get_user_by_id("missing"), Err(RepositoryError::NotFound)));
    }
}
