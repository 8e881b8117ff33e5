use actix_web::HttpResponse;
use askama::Template;

use crate::error::AppResult;

pub fn render<T: Template>(template: T) -> AppResult<HttpResponse> {
    let body = template.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}
