mod common;

use actix_web::{test, web, App};
use serde_json::json;
use waypoint_api::auth::handlers::{login, me, signup};

use common::test_state;

macro_rules! auth_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .route("/auth/signup", web::post().to(signup))
                .route("/auth/login", web::post().to(login))
                .route("/auth/me", web::get().to(me)),
        )
        .await
    };
}

#[actix_web::test]
async fn signup_returns_user_and_verifiable_token() {
    let (state, _store) = test_state();
    let app = auth_app!(state.clone());

    let resp = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "email": "a@x.com",
            "password": "Secret123!",
            "name": "A"
        }))
        .send_request(&app)
        .await;

    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["name"], "A");
    assert!(body["user"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());

    // Claims round-trip to the stored identity.
    let claims = state.tokens.verify(token).expect("token should verify");
    assert_eq!(claims.sub, body["user"]["id"].as_str().unwrap());
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.name, "A");
}

#[actix_web::test]
async fn duplicate_signup_conflicts_regardless_of_password() {
    let (state, store) = test_state();
    let app = auth_app!(state);

    let resp = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "email": "a@x.com",
            "password": "Secret123!",
            "name": "A"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 201);

    let resp = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "email": "a@x.com",
            "password": "Different456!",
            "name": "B"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 409);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "User already exists");
    assert_eq!(store.account_count().await, 1);
}

#[actix_web::test]
async fn signup_normalizes_email() {
    let (state, _store) = test_state();
    let app = auth_app!(state);

    let resp = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "email": "  A@X.com ",
            "password": "Secret123!",
            "name": "A"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "a@x.com");

    // Mixed-case variant hits the same account.
    let resp = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "email": "a@X.COM",
            "password": "Other789!!",
            "name": "B"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 409);
}

#[actix_web::test]
async fn signup_validation_lists_fields() {
    let (state, _store) = test_state();
    let app = auth_app!(state);

    let resp = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "email": "not-an-email",
            "password": "short"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password", "name"]);
}

#[actix_web::test]
async fn login_succeeds_with_correct_credentials() {
    let (state, _store) = test_state();
    let app = auth_app!(state);

    test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "email": "a@x.com",
            "password": "Secret123!",
            "name": "A"
        }))
        .send_request(&app)
        .await;

    let resp = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({
            "email": "a@x.com",
            "password": "Secret123!"
        }))
        .send_request(&app)
        .await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[actix_web::test]
async fn login_failures_are_indistinguishable() {
    let (state, _store) = test_state();
    let app = auth_app!(state);

    test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "email": "a@x.com",
            "password": "Secret123!",
            "name": "A"
        }))
        .send_request(&app)
        .await;

    let wrong_password = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({
            "email": "a@x.com",
            "password": "WrongPass1!"
        }))
        .send_request(&app)
        .await;
    assert_eq!(wrong_password.status(), 401);
    let wrong_password_body = test::read_body(wrong_password).await;

    let no_account = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({
            "email": "missing@x.com",
            "password": "WrongPass1!"
        }))
        .send_request(&app)
        .await;
    assert_eq!(no_account.status(), 401);
    let no_account_body = test::read_body(no_account).await;

    assert_eq!(wrong_password_body, no_account_body);
}

#[actix_web::test]
async fn login_rate_limit_rejects_sixth_request() {
    let (state, _store) = test_state();
    assert_eq!(state.config.rate_limit.login.limit, 5);
    let app = auth_app!(state);

    for _ in 0..5 {
        let resp = test::TestRequest::post()
            .uri("/auth/login")
            .insert_header(("X-Forwarded-For", "1.2.3.4"))
            .set_json(json!({
                "email": "a@x.com",
                "password": "WrongPass1!"
            }))
            .send_request(&app)
            .await;
        assert_eq!(resp.status(), 401);
    }

    let resp = test::TestRequest::post()
        .uri("/auth/login")
        .insert_header(("X-Forwarded-For", "1.2.3.4"))
        .set_json(json!({
            "email": "a@x.com",
            "password": "WrongPass1!"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 429);
    assert_eq!(resp.headers().get("X-RateLimit-Remaining").unwrap(), "0");
    assert_eq!(resp.headers().get("X-RateLimit-Limit").unwrap(), "5");
    assert!(resp.headers().contains_key("Retry-After"));
    assert!(resp.headers().contains_key("X-RateLimit-Reset"));
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Too many requests. Please try again later.");

    // A different client is unaffected.
    let resp = test::TestRequest::post()
        .uri("/auth/login")
        .insert_header(("X-Forwarded-For", "5.6.7.8"))
        .set_json(json!({
            "email": "a@x.com",
            "password": "WrongPass1!"
        }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn me_requires_a_valid_bearer_token() {
    let (state, _store) = test_state();
    let app = auth_app!(state);

    let resp = test::TestRequest::post()
        .uri("/auth/signup")
        .set_json(json!({
            "email": "a@x.com",
            "password": "Secret123!",
            "name": "A"
        }))
        .send_request(&app)
        .await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let token = body["token"].as_str().unwrap().to_string();

    let resp = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "a@x.com");

    let resp = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);

    let resp = test::TestRequest::get()
        .uri("/auth/me")
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 401);
}
