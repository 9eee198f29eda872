pub mod api_route;
pub mod app;
pub mod default_route;

pub use app::*;

use actix_web::HttpResponse;
use askama::Template;

pub fn render_template(template: impl Template) -> HttpResponse {
    match template.render() {
        Ok(html) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Err(e) => {
            log::error!("Failed to render template: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to render page")
        }
    }
}
