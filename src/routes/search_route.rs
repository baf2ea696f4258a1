use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    domain::search::SearchParameters,
    services::{RunRegistry, SearchRequest, SearchRequestSender},
};

const DEFAULT_EXPERIENCE_YEARS: u8 = 2;
const DEFAULT_MAX_RECORDS: usize = 100;

fn default_experience() -> u8 {
    DEFAULT_EXPERIENCE_YEARS
}

fn default_max_records() -> usize {
    DEFAULT_MAX_RECORDS
}

#[derive(Deserialize)]
struct StartSearchBody {
    keywords: String,
    #[serde(default)]
    location: String,
    #[serde(default = "default_experience")]
    experience: u8,
    #[serde(default = "default_max_records")]
    max_records: usize,
}

#[post("")]
pub async fn start_search(
    body: web::Form<StartSearchBody>,
    registry: web::Data<RunRegistry>,
    search_sender: web::Data<SearchRequestSender>,
) -> HttpResponse {
    let params = match SearchParameters::new(
        &body.keywords,
        &body.location,
        body.experience,
        body.max_records,
    ) {
        Ok(params) => params,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    };

    let (run_id, cancel) = registry.register(params.clone());
    let request = SearchRequest {
        run_id,
        params,
        cancel,
    };

    match search_sender.sender.send(request) {
        Ok(_) => {
            log::info!("Queued run {}", run_id);
            HttpResponse::Ok().json(json!({ "run_id": run_id }))
        }
        Err(e) => {
            log::error!("Found error while sending search request: {}", e);
            registry.forget(&run_id);
            HttpResponse::ServiceUnavailable()
                .json(json!({ "error": "search worker is not running" }))
        }
    }
}

#[get("/{run_id}")]
pub async fn search_status(
    path: web::Path<Uuid>,
    registry: web::Data<RunRegistry>,
) -> HttpResponse {
    match registry.snapshot(&path.into_inner()) {
        Some(snapshot) => HttpResponse::Ok().json(snapshot),
        None => HttpResponse::NotFound().json(json!({ "error": "unknown run" })),
    }
}

#[post("/{run_id}/cancel")]
pub async fn cancel_search(
    path: web::Path<Uuid>,
    registry: web::Data<RunRegistry>,
) -> HttpResponse {
    let run_id = path.into_inner();
    match registry.cancel(&run_id) {
        true => {
            log::info!("Cancellation requested for run {}", run_id);
            HttpResponse::Ok().json(json!({ "run_id": run_id, "cancel_requested": true }))
        }
        false => HttpResponse::NotFound().json(json!({ "error": "unknown run" })),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use super::{cancel_search, search_status, start_search};
    use crate::services::{RunRegistry, SearchRequest, SearchRequestSender};

    #[actix_web::test]
    async fn start_search_queues_request() {
        let registry = web::Data::new(RunRegistry::new());
        let (sender, mut receiver) = mpsc::unbounded_channel::<SearchRequest>();
        let app = test::init_service(
            App::new()
                .app_data(registry.clone())
                .app_data(web::Data::new(SearchRequestSender { sender }))
                .service(
                    web::scope("/search")
                        .service(start_search)
                        .service(search_status)
                        .service(cancel_search),
                ),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_form([("keywords", "rust"), ("location", "Pune"), ("max_records", "5")])
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let request = receiver.try_recv().unwrap();
        assert_eq!(body["run_id"], request.run_id.to_string());
        assert_eq!(request.params.max_records(), 5);
        assert_eq!(request.params.experience_years(), 2);

        let req = test::TestRequest::get()
            .uri(&format!("/search/{}", request.run_id))
            .to_request();
        let snapshot: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(snapshot["status"], "Queued");

        let req = test::TestRequest::post()
            .uri(&format!("/search/{}/cancel", request.run_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(request.cancel.is_requested());
    }

    #[actix_web::test]
    async fn start_search_rejects_invalid_input() {
        let (sender, _receiver) = mpsc::unbounded_channel::<SearchRequest>();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(RunRegistry::new()))
                .app_data(web::Data::new(SearchRequestSender { sender }))
                .service(web::scope("/search").service(start_search)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/search")
            .set_form([("keywords", "   "), ("max_records", "5")])
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unknown_run_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(RunRegistry::new()))
                .service(
                    web::scope("/search")
                        .service(search_status)
                        .service(cancel_search),
                ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/search/{}", Uuid::new_v4()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri(&format!("/search/{}/cancel", Uuid::new_v4()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
