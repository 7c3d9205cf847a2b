mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{error_code, TestApp};

fn purchase(tid: &str) -> Value {
    json!({
        "tid": tid,
        "partner_order_id": 17,
        "partner_user_id": "17",
        "item_name": "당의 대여",
        "quantity": 1,
        "total_amount": 15000,
        "vat_amount": 1363,
        "rsrvt_date": "2026-05-01T00:00:00Z",
        "rsrvt_time": "14:00:00",
    })
}

#[tokio::test]
async fn test_purchase_is_recorded_for_the_caller_only() {
    let app = TestApp::new().await;
    let (id, token) = app.user("buyer").await;
    let (other_id, _) = app.user("someone").await;

    let forbidden = app
        .post(
            &format!("/api/v1/stores/payment/{}", other_id),
            Some(&token),
            purchase("T100"),
        )
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let anonymous = app
        .post(&format!("/api/v1/stores/payment/{}", id), None, purchase("T100"))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let created = app
        .post(&format!("/api/v1/stores/payment/{}", id), Some(&token), purchase("T100"))
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["data"]["status"], "pending");
    assert_eq!(created.body["data"]["tax_free_amount"], 0);
}

#[tokio::test]
async fn test_new_purchase_replaces_pending_one() {
    let app = TestApp::new().await;
    let (id, token) = app.user("buyer").await;
    let uri = format!("/api/v1/stores/payment/{}", id);

    app.post(&uri, Some(&token), purchase("T1")).await;
    let second = app.post(&uri, Some(&token), purchase("T2")).await;
    assert_eq!(second.status, StatusCode::CREATED);

    let first = app.get("/api/v1/stores/payment/T1", Some(&token)).await;
    assert_eq!(first.status, StatusCode::NOT_FOUND);
    let second = app.get("/api/v1/stores/payment/T2", Some(&token)).await;
    assert_eq!(second.status, StatusCode::OK);
}

#[tokio::test]
async fn test_approval_flow() {
    let app = TestApp::new().await;
    let (id, token) = app.user("buyer").await;
    let (_, stranger) = app.user("stranger").await;
    let admin = app.admin_token().await;
    app.post(&format!("/api/v1/stores/payment/{}", id), Some(&token), purchase("T9"))
        .await;

    let peek = app.get("/api/v1/stores/payment/T9", Some(&stranger)).await;
    assert_eq!(peek.status, StatusCode::FORBIDDEN);
    let admin_view = app.get("/api/v1/stores/payment/T9", Some(&admin)).await;
    assert_eq!(admin_view.status, StatusCode::OK);

    let approval = json!({ "aid": "A9", "payment_method_type": "MONEY" });
    let approved = app
        .put("/api/v1/stores/payment/T9", Some(&token), approval.clone())
        .await;
    assert_eq!(approved.status, StatusCode::OK, "{}", approved.body);
    assert_eq!(approved.body["data"]["status"], "approved");
    assert_eq!(approved.body["data"]["aid"], "A9");
    assert!(approved.body["data"]["approved_at"].is_string());

    let twice = app
        .put("/api/v1/stores/payment/T9", Some(&token), approval)
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
    assert_eq!(error_code(&twice), "CONFLICT");

    // approved records survive the next purchase
    app.post(&format!("/api/v1/stores/payment/{}", id), Some(&token), purchase("T10"))
        .await;
    let kept = app.get("/api/v1/stores/payment/T9", Some(&token)).await;
    assert_eq!(kept.status, StatusCode::OK);
}

#[tokio::test]
async fn test_purchase_validation_and_duplicate_tid() {
    let app = TestApp::new().await;
    let (id, token) = app.user("buyer").await;
    let (other_id, other) = app.user("other").await;

    let mut negative = purchase("T1");
    negative["total_amount"] = json!(-5);
    let rejected = app
        .post(&format!("/api/v1/stores/payment/{}", id), Some(&token), negative)
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);

    let not_an_id = app
        .post("/api/v1/stores/payment/abc", Some(&token), purchase("T1"))
        .await;
    assert_eq!(not_an_id.status, StatusCode::BAD_REQUEST);

    app.post(&format!("/api/v1/stores/payment/{}", id), Some(&token), purchase("T1"))
        .await;
    let duplicate = app
        .post(&format!("/api/v1/stores/payment/{}", other_id), Some(&other), purchase("T1"))
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let missing_aid = app
        .put("/api/v1/stores/payment/T1", Some(&token), json!({ "aid": " " }))
        .await;
    assert_eq!(missing_aid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlong_payment_method_type_is_rejected() {
    let app = TestApp::new().await;
    let (id, token) = app.user("buyer").await;
    app.post(&format!("/api/v1/stores/payment/{}", id), Some(&token), purchase("T20"))
        .await;

    let rejected = app
        .put(
            "/api/v1/stores/payment/T20",
            Some(&token),
            json!({ "aid": "A20", "payment_method_type": "M".repeat(51) }),
        )
        .await;
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&rejected), "VALIDATION_ERROR");

    let still_pending = app.get("/api/v1/stores/payment/T20", Some(&token)).await;
    assert_eq!(still_pending.body["data"]["status"], "pending");
}
