use actix_web::{test, web, App};
use waypoint_api::health_check;

#[actix_web::test]
async fn health_check_returns_status_and_timestamp() {
    let app = test::init_service(
        App::new().route("/health", web::get().to(health_check)),
    )
    .await;

    let resp = test::TestRequest::get()
        .uri("/health")
        .send_request(&app)
        .await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().is_some());
}
