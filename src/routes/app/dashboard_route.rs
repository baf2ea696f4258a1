use actix_web::{get, web, HttpResponse};
use askama::Template;

use crate::services::{RunRegistry, RunSnapshot};

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    runs: Vec<RunSnapshot>,
}

#[get("/dashboard")]
pub async fn dashboard(registry: web::Data<RunRegistry>) -> HttpResponse {
    let runs = registry.snapshots();

    match (DashboardTemplate { runs }).render() {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(e) => {
            log::error!("Failed to render dashboard: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to render dashboard")
        }
    }
}
