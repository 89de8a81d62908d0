use actix_web::{error, web, HttpResponse, Result};
use askama::Template;

use crate::form::user::PageQuery;
use crate::template::{self, FormKind};

pub async fn index(query: web::Query<PageQuery>) -> Result<HttpResponse> {
    let template = template::FormTemplate {
        kind: FormKind::from_query(query.form.as_deref()),
    };
    let content = template.render().map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Ok().content_type("text/html").body(content))
}

pub async fn default_handler() -> Result<HttpResponse> {
    let template = template::error::NotFoundTemplate;
    let content = template.render().map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::NotFound()
        .content_type("text/html")
        .body(content))
}
