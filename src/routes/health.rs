use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

use crate::state::ServiceInfo;

/// Liveness probe. Served outside `/api` and never authenticated.
#[get("/health")]
pub async fn health(info: web::Data<ServiceInfo>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "ok": true,
        "name": info.name,
        "env": info.env
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_rt::test]
    async fn test_health_reports_name_and_env() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(ServiceInfo::new("staging")))
                .service(health),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let json: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            json,
            json!({ "ok": true, "name": "devbase-api", "env": "staging" })
        );
    }
}
