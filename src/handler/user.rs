use actix_web::http::StatusCode;
use actix_web::{error, web, HttpResponse, ResponseError, Result};

use crate::error::json_error;
use crate::form::user::{GetUserQuery, UserResponse};
use crate::security::SecurityToken;
use crate::service::user::{UserError, UserService};

impl ResponseError for UserError {
    fn status_code(&self) -> StatusCode {
        match self {
            UserError::NotFound => StatusCode::NOT_FOUND,
            UserError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        json_error(self)
    }
}

/// Returns `?userId=` if given, otherwise the caller's own profile.
pub async fn get_user(
    token: SecurityToken,
    users: web::Data<UserService>,
    query: web::Query<GetUserQuery>,
) -> Result<HttpResponse> {
    let user_id = match (query.into_inner().user_id, token.user_id()) {
        (Some(id), _) if !id.is_empty() => id,
        (_, Some(id)) => id.to_string(),
        _ => return Err(error::ErrorUnauthorized("Unauthorized")),
    };

    let user = web::block(move || users.get_by_id(&user_id))
        .await
        .map_err(error::ErrorInternalServerError)??;

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}
