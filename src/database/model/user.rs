use diesel::{deserialize::Queryable, prelude::Insertable};

use crate::database::schema::users;
use crate::domain::user::User;

/// Row of the `users` table.
#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = users)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub picture: String,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            password: user.password_hash.clone(),
            picture: user.picture.clone(),
        }
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            password_hash: record.password,
            picture: record.picture,
        }
    }
}
