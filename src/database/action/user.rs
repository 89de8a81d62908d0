use diesel::prelude::*;

use crate::database::model::user::UserRecord;

pub fn insert_user(conn: &mut SqliteConnection, record: &UserRecord) -> QueryResult<usize> {
    use crate::database::schema::users::dsl::*;

    diesel::insert_into(users).values(record).execute(conn)
}

pub fn get_user_by_id(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> QueryResult<Option<UserRecord>> {
    use crate::database::schema::users::dsl::{id, users};

    users
        .filter(id.eq(user_id))
        .first::<UserRecord>(conn)
        .optional()
}

pub fn get_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> QueryResult<Option<UserRecord>> {
    use crate::database::schema::users::dsl::{email as email_column, users};

    users
        .filter(email_column.eq(email))
        .first::<UserRecord>(conn)
        .optional()
}
