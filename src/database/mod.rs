pub mod action;
pub mod model;
pub mod schema;

use diesel::{connection::SimpleConnection, prelude::*, r2d2};

use crate::error::BoxError;

pub type Result<T> = std::result::Result<T, BoxError>;
pub type Pool = r2d2::Pool<r2d2::ConnectionManager<SqliteConnection>>;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id       TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL,
    email    TEXT NOT NULL UNIQUE,
    password TEXT,
    picture  TEXT NOT NULL DEFAULT ''
);
"#;

/// Initialize the database connection pool for `database_url` and make sure
/// the `users` table exists.
pub fn initialize_db_pool(database_url: &str, max_size: u32) -> Result<Pool> {
    let manager = r2d2::ConnectionManager::<SqliteConnection>::new(database_url);

    let pool = r2d2::Pool::builder().max_size(max_size).build(manager)?;

    let mut conn = pool.get()?;
    conn.batch_execute(SCHEMA)?;

    Ok(pool)
}

/// A single-connection pool over a private in-memory database.
#[cfg(test)]
pub fn in_memory_pool() -> Pool {
    initialize_db_pool(":memory:", 1).expect("in-memory database should open")
}
