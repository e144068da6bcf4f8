//! Health endpoints

use actix_web::HttpResponse;

/// Service health summary
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok"}))
}

/// Liveness probe
pub async fn live() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// Readiness probe
pub async fn ready() -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn probes_answer_on_their_paths() {
        let app = test::init_service(
            App::new()
                .route("/api/v1/health", web::get().to(health))
                .route("/health/live", web::get().to(live))
                .route("/health/ready", web::get().to(ready)),
        )
        .await;

        for path in ["/api/v1/health", "/health/live", "/health/ready"] {
            let req = test::TestRequest::get().uri(path).to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success(), "{path}");
        }
    }
}
