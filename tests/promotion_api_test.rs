mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{response_json, TestApp};
use serde_json::json;
use uuid::Uuid;

fn promotion_body(code: &str) -> serde_json::Value {
    json!({
        "code": code,
        "name": format!("Promotion {}", code),
        "discountPercent": 15
    })
}

#[tokio::test]
async fn validate_returns_discount_for_applicable_code() {
    let app = TestApp::new().await;
    app.create_promotion(promotion_body("welcome15")).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/promotions/validate",
            Some(json!({ "code": "WELCOME15", "orderAmount": 100 })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = response_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["promotion"]["code"], "WELCOME15");
    assert_eq!(body["promotion"]["discountPercent"], json!(15.0));
    assert_eq!(body["promotion"]["discountAmount"], json!(15.0));
    assert_eq!(body["promotion"]["minOrder"], json!(0.0));
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn validate_reports_minimum_order_as_a_decline() {
    let app = TestApp::new().await;
    app.create_promotion(json!({
        "code": "BIGSPEND",
        "name": "Big spenders",
        "discountPercent": 20,
        "minOrder": 50
    }))
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/promotions/validate",
            Some(json!({ "code": "bigspend", "orderAmount": "49.50" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(
        body,
        json!({
            "valid": false,
            "error": "Minimum order of 50.00 required",
            "reason": "below_minimum",
            "minOrder": 50.0
        })
    );
}

#[tokio::test]
async fn validate_reports_unknown_code() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/promotions/validate",
            Some(json!({ "code": "NOSUCHCODE", "orderAmount": 10 })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["reason"], "not_found");
    assert_eq!(body["error"], "Promo code not found");
}

#[tokio::test]
async fn validate_reports_date_window_declines() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.create_promotion(json!({
        "code": "LASTWEEK",
        "name": "Last week",
        "discountPercent": 10,
        "validUntil": (now - Duration::days(1)).to_rfc3339(),
        "usageLimit": 100
    }))
    .await;
    app.create_promotion(json!({
        "code": "NEXTWEEK",
        "name": "Next week",
        "discountPercent": 10,
        "validFrom": (now + Duration::days(7)).to_rfc3339(),
        "validUntil": (now + Duration::days(14)).to_rfc3339()
    }))
    .await;

    for (code, reason) in [("LASTWEEK", "expired"), ("NEXTWEEK", "not_yet_valid")] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/promotions/validate",
                Some(json!({ "code": code, "orderAmount": 100 })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["reason"], reason, "code {}", code);
        assert!(body.get("minOrder").is_none());
    }
}

#[tokio::test]
async fn validate_rejects_malformed_input_with_bad_request() {
    let app = TestApp::new().await;
    app.create_promotion(promotion_body("WELCOME15")).await;

    let cases = [
        json!({ "code": "", "orderAmount": 10 }),
        json!({ "code": "   ", "orderAmount": 10 }),
        json!({ "orderAmount": 10 }),
        json!({ "code": "WELCOME15" }),
        json!({ "code": "WELCOME15", "orderAmount": -1 }),
        json!({ "code": "WELCOME15", "orderAmount": "lots" }),
    ];

    for case in cases {
        let response = app
            .request(
                Method::POST,
                "/api/v1/promotions/validate",
                Some(case.clone()),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", case);
        let body = response_json(response).await;
        assert_eq!(body["error"], "Bad Request");
        assert!(body["timestamp"].is_string());
    }

    let response = app
        .request_raw(Method::POST, "/api/v1/promotions/validate", "{not json")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn error_bodies_carry_the_request_id() {
    let app = TestApp::new().await;

    let response = app
        .request_with_headers(
            Method::POST,
            "/api/v1/promotions/validate",
            Some(json!({ "code": "", "orderAmount": 1 })),
            &[("x-request-id", "checkout-42")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["x-request-id"], "checkout-42");
    let body = response_json(response).await;
    assert_eq!(body["request_id"], "checkout-42");
}

#[tokio::test]
async fn deactivated_promotion_is_declined_until_reactivated() {
    let app = TestApp::new().await;
    let created = app.create_promotion(promotion_body("TOGGLE")).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/admin/promotions/{}/deactivate", id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["isActive"], false);

    let validate = json!({ "code": "TOGGLE", "orderAmount": 40 });
    let body = response_json(
        app.request(Method::POST, "/api/v1/promotions/validate", Some(validate.clone()))
            .await,
    )
    .await;
    assert_eq!(body["reason"], "inactive");

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/admin/promotions/{}/activate", id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(
        app.request(Method::POST, "/api/v1/promotions/validate", Some(validate))
            .await,
    )
    .await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["promotion"]["discountAmount"], json!(6.0));
}

#[tokio::test]
async fn redeem_consumes_uses_up_to_the_limit() {
    let app = TestApp::new().await;
    let created = app
        .create_promotion(json!({
            "code": "ONCE",
            "name": "Single use",
            "discountPercent": 50,
            "usageLimit": 1
        }))
        .await;

    let redeem = json!({ "code": "ONCE", "orderAmount": 30, "orderId": Uuid::new_v4() });
    let response = app
        .request(Method::POST, "/api/v1/promotions/redeem", Some(redeem.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["promotion"]["discountAmount"], json!(15.0));

    let again = response_json(
        app.request(Method::POST, "/api/v1/promotions/redeem", Some(redeem))
            .await,
    )
    .await;
    assert_eq!(again["valid"], false);
    assert_eq!(again["reason"], "usage_limit_reached");

    let validate = response_json(
        app.request(
            Method::POST,
            "/api/v1/promotions/validate",
            Some(json!({ "code": "ONCE", "orderAmount": 30 })),
        )
        .await,
    )
    .await;
    assert_eq!(validate["reason"], "usage_limit_reached");

    let stored = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/admin/promotions/{}", created["id"].as_str().unwrap()),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(stored["usedCount"], 1);
}

#[tokio::test]
async fn validate_never_changes_used_count() {
    let app = TestApp::new().await;
    let created = app
        .create_promotion(json!({
            "code": "PEEK",
            "name": "Peek",
            "discountPercent": 5,
            "usageLimit": 2
        }))
        .await;

    for _ in 0..3 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/promotions/validate",
                Some(json!({ "code": "PEEK", "orderAmount": 10 })),
            )
            .await;
        assert_eq!(response_json(response).await["valid"], true);
    }

    let stored = response_json(
        app.request(
            Method::GET,
            &format!("/api/v1/admin/promotions/{}", created["id"].as_str().unwrap()),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(stored["usedCount"], 0);
}

#[tokio::test]
async fn admin_crud_round_trip() {
    let app = TestApp::new().await;
    let created = app
        .create_promotion(json!({
            "code": " spring ",
            "name": "Spring",
            "description": "Seasonal",
            "discountPercent": 12.5,
            "minOrder": 20
        }))
        .await;
    assert_eq!(created["code"], "SPRING");
    assert_eq!(created["isActive"], true);
    assert_eq!(created["usedCount"], 0);
    let id = created["id"].as_str().unwrap().to_string();
    let path = format!("/api/v1/admin/promotions/{}", id);

    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/admin/promotions",
            Some(promotion_body("SPRING")),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let response = app
        .request(
            Method::PUT,
            &path,
            Some(json!({ "discountPercent": 25, "description": null, "usageLimit": 10 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["discountPercent"], json!(25.0));
    assert_eq!(updated["minOrder"], json!(20.0));
    assert_eq!(updated["usageLimit"], 10);
    assert!(updated["description"].is_null());
    assert_eq!(updated["name"], "Spring");

    let response = app.request(Method::DELETE, &path, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.request(Method::GET, &path, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.request(Method::DELETE, &path, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_create_rejects_invalid_promotions() {
    let app = TestApp::new().await;
    let now = Utc::now();

    let cases = [
        json!({ "code": "TOOMUCH", "name": "Too much", "discountPercent": 150 }),
        json!({ "code": "NEG", "name": "Negative", "discountPercent": 10, "minOrder": -1 }),
        json!({ "code": "", "name": "Empty", "discountPercent": 10 }),
        json!({ "code": "NONAME", "name": "", "discountPercent": 10 }),
        json!({ "code": "LIMIT", "name": "Limit", "discountPercent": 10, "usageLimit": -3 }),
        json!({
            "code": "BACKWARDS",
            "name": "Backwards",
            "discountPercent": 10,
            "validFrom": (now + Duration::days(2)).to_rfc3339(),
            "validUntil": (now + Duration::days(1)).to_rfc3339()
        }),
    ];

    for case in cases {
        let response = app
            .request(Method::POST, "/api/v1/admin/promotions", Some(case.clone()))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {}", case);
    }
}

#[tokio::test]
async fn admin_update_rechecks_the_merged_window() {
    let app = TestApp::new().await;
    let now = Utc::now();
    let created = app
        .create_promotion(json!({
            "code": "WINDOW",
            "name": "Window",
            "discountPercent": 10,
            "validUntil": (now + Duration::days(3)).to_rfc3339()
        }))
        .await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/admin/promotions/{}", created["id"].as_str().unwrap()),
            Some(json!({ "validFrom": (now + Duration::days(5)).to_rfc3339() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_list_paginates_and_filters() {
    let app = TestApp::new().await;
    for code in ["ALPHA", "BRAVO", "CHARLIE"] {
        app.create_promotion(promotion_body(code)).await;
    }
    // Default page size in the test config is 2.
    let body = response_json(
        app.request(Method::GET, "/api/v1/admin/promotions", None)
            .await,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);

    let body = response_json(
        app.request(Method::GET, "/api/v1/admin/promotions?page=2", None)
            .await,
    )
    .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Requested sizes are clamped to the maximum of 5.
    let body = response_json(
        app.request(Method::GET, "/api/v1/admin/promotions?per_page=50", None)
            .await,
    )
    .await;
    assert_eq!(body["pagination"]["perPage"], 5);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let first_id = body["data"][0]["id"].as_str().unwrap().to_string();
    app.request(
        Method::POST,
        &format!("/api/v1/admin/promotions/{}/deactivate", first_id),
        None,
    )
    .await;

    let body = response_json(
        app.request(Method::GET, "/api/v1/admin/promotions?active=false", None)
            .await,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["id"], first_id);
}

#[tokio::test]
async fn unknown_promotion_id_is_not_found() {
    let app = TestApp::new().await;
    let path = format!("/api/v1/admin/promotions/{}/activate", Uuid::new_v4());

    let response = app.request(Method::POST, &path, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn health_and_openapi_endpoints_respond() {
    let app = TestApp::new().await;

    for path in ["/health", "/health/ready", "/health/live", "/health/version"] {
        let response = app.request(Method::GET, path, None).await;
        assert_eq!(response.status(), StatusCode::OK, "path {}", path);
    }

    let ready = response_json(app.request(Method::GET, "/health/ready", None).await).await;
    assert_eq!(ready["ready"], true);

    let response = app
        .request(Method::GET, "/api-docs/openapi.json", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = response_json(response).await;
    assert!(doc["paths"]["/api/v1/promotions/validate"].is_object());
}
