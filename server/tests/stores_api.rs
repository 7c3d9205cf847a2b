mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::TestApp;

fn store_body() -> Value {
    json!({
        "hanbok_store": "한복남 경복궁점",
        "hanbok_address": "서울 종로구 사직로 161",
        "location_x": 126.9770,
        "location_y": 37.5796,
        "star": 4.5,
    })
}

async fn store(app: &TestApp, token: &str) -> i64 {
    let response = app.post("/api/v1/stores", Some(token), store_body()).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_only_staff_create_stores() {
    let app = TestApp::new().await;
    let (_, customer) = app.user("customer").await;
    let forbidden = app.post("/api/v1/stores", Some(&customer), store_body()).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let (owner_id, staff) = app.staff("seller").await;
    let store_id = store(&app, &staff).await;

    let list = app.get("/api/v1/stores", None).await;
    assert_eq!(list.status, StatusCode::OK);
    let stores = list.body["data"]["StoreList"].as_array().unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0]["id"], store_id);
    assert_eq!(stores[0]["owner_id"], owner_id);
    assert_eq!(stores[0]["star"], 4.5);
}

#[tokio::test]
async fn test_store_validation() {
    let app = TestApp::new().await;
    let (_, staff) = app.staff("seller").await;

    let mut bad_star = store_body();
    bad_star["star"] = json!(7);
    assert_eq!(
        app.post("/api/v1/stores", Some(&staff), bad_star).await.status,
        StatusCode::BAD_REQUEST
    );

    let mut long_name = store_body();
    long_name["hanbok_store"] = json!("가".repeat(21));
    assert_eq!(
        app.post("/api/v1/stores", Some(&staff), long_name).await.status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_hanboks_only_in_own_store() {
    let app = TestApp::new().await;
    let (_, owner) = app.staff("owner").await;
    let (_, rival) = app.staff("rival").await;
    let store_id = store(&app, &owner).await;
    let uri = format!("/api/v1/stores/{}/hanboks", store_id);
    let hanbok = json!({
        "hanbok_name": "당의",
        "hanbok_description": "조선 왕실 여성 예복",
        "hanbok_price": 15000,
    });

    let rival_attempt = app.post(&uri, Some(&rival), hanbok.clone()).await;
    assert_eq!(rival_attempt.status, StatusCode::FORBIDDEN);

    let created = app.post(&uri, Some(&owner), hanbok).await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);

    let negative = app
        .post(
            &uri,
            Some(&owner),
            json!({ "hanbok_name": "철릭", "hanbok_description": "무관 복식", "hanbok_price": -1 }),
        )
        .await;
    assert_eq!(negative.status, StatusCode::BAD_REQUEST);

    let missing_store = app
        .post(
            "/api/v1/stores/999/hanboks",
            Some(&owner),
            json!({ "hanbok_name": "철릭", "hanbok_description": "무관 복식", "hanbok_price": 1 }),
        )
        .await;
    assert_eq!(missing_store.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_detail_and_comments() {
    let app = TestApp::new().await;
    let (_, owner) = app.staff("owner").await;
    let (_, writer) = app.user("writer").await;
    let (_, other) = app.user("other").await;
    let store_id = store(&app, &owner).await;
    let comments_uri = format!("/api/v1/stores/{}/comments", store_id);

    let empty = app
        .post(&comments_uri, Some(&writer), json!({ "content": "   " }))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let comment = app
        .post(&comments_uri, Some(&writer), json!({ "content": "옷이 예뻐요" }))
        .await;
    assert_eq!(comment.status, StatusCode::CREATED);
    let comment_id = comment.body["data"]["id"].as_i64().unwrap();

    let detail = app.get(&format!("/api/v1/stores/{}", store_id), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["data"]["Store"]["id"], store_id);
    assert_eq!(detail.body["data"]["HanbokList"], json!([]));
    assert_eq!(detail.body["data"]["Comment"].as_array().unwrap().len(), 1);

    let comment_uri = format!("/api/v1/comments/{}", comment_id);
    let hijack = app
        .put(&comment_uri, Some(&other), json!({ "content": "spam" }))
        .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let edited = app
        .put(&comment_uri, Some(&writer), json!({ "content": "옷이 정말 예뻐요" }))
        .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.body["data"]["content"], "옷이 정말 예뻐요");

    assert_eq!(
        app.delete(&comment_uri, Some(&other)).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.delete(&comment_uri, Some(&writer)).await.status,
        StatusCode::NO_CONTENT
    );
    let comments = app.get(&comments_uri, None).await;
    assert_eq!(comments.body["data"], json!([]));

    let missing = app.get("/api/v1/stores/999", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_like_and_bookmark() {
    let app = TestApp::new().await;
    let (_, owner) = app.staff("owner").await;
    let (_, fan) = app.user("fan").await;
    let store_id = store(&app, &owner).await;

    let liked = app
        .post(&format!("/api/v1/stores/{}/like", store_id), Some(&fan), json!({}))
        .await;
    assert_eq!(liked.body["data"]["status"], "liked");

    let bookmarked = app
        .post(&format!("/api/v1/stores/{}/bookmark", store_id), Some(&fan), json!({}))
        .await;
    assert_eq!(bookmarked.body["data"]["status"], "bookmarked");
    assert_eq!(bookmarked.body["data"]["count"], 1);

    let detail = app.get(&format!("/api/v1/stores/{}", store_id), None).await;
    assert_eq!(detail.body["data"]["likes"], 1);
    assert_eq!(detail.body["data"]["bookmarks"], 1);

    let me = app.get("/api/v1/users/me", Some(&fan)).await;
    assert_eq!(me.body["data"]["bookmark_stores"][0]["id"], store_id);

    let removed = app
        .post(&format!("/api/v1/stores/{}/bookmark", store_id), Some(&fan), json!({}))
        .await;
    assert_eq!(removed.body["data"]["status"], "unbookmarked");
    assert_eq!(removed.body["data"]["count"], 0);
}
