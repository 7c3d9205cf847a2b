mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{error_code, TestApp};

#[tokio::test]
async fn test_event_admin_operations_require_admin() {
    let app = TestApp::new().await;
    let (_, token) = app.user("visitor").await;

    let category = app
        .post("/api/v1/events/categories", Some(&token), json!({ "name": "전시" }))
        .await;
    assert_eq!(category.status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&category), "FORBIDDEN");

    let event = app
        .post(
            "/api/v1/events",
            Some(&token),
            json!({ "category_id": 1, "title": "t", "content": "c" }),
        )
        .await;
    assert_eq!(event.status, StatusCode::FORBIDDEN);

    let anonymous = app
        .post("/api/v1/events", None, json!({ "category_id": 1, "title": "t", "content": "c" }))
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_category_conflicts() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let first = app
        .post("/api/v1/events/categories", Some(&admin), json!({ "name": "공연" }))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    let second = app
        .post("/api/v1/events/categories", Some(&admin), json!({ "name": "공연" }))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let list = app.get("/api/v1/events/categories", None).await;
    assert_eq!(list.body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_event_validation() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let category = app
        .post("/api/v1/events/categories", Some(&admin), json!({ "name": "궁" }))
        .await;
    let category_id = category.body["data"]["id"].as_i64().unwrap();

    let missing_category = app
        .post(
            "/api/v1/events",
            Some(&admin),
            json!({ "category_id": 999, "title": "t", "content": "c" }),
        )
        .await;
    assert_eq!(missing_category.status, StatusCode::BAD_REQUEST);

    let reversed = app
        .post(
            "/api/v1/events",
            Some(&admin),
            json!({
                "category_id": category_id,
                "title": "t",
                "content": "c",
                "event_start_date": "2026-05-03T00:00:00Z",
                "event_end_date": "2026-05-01T00:00:00Z",
            }),
        )
        .await;
    assert_eq!(reversed.status, StatusCode::BAD_REQUEST);

    let bad_slot = app
        .post(
            "/api/v1/events",
            Some(&admin),
            json!({ "category_id": category_id, "title": "t", "content": "c", "time_slots": ["21:00-20:00"] }),
        )
        .await;
    assert_eq!(bad_slot.status, StatusCode::BAD_REQUEST);

    let duplicate_slot = app
        .post(
            "/api/v1/events",
            Some(&admin),
            json!({ "category_id": category_id, "title": "t", "content": "c", "time_slots": ["10:00-11:00", "10:00 - 11:00"] }),
        )
        .await;
    assert_eq!(duplicate_slot.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_event_search_detail_update_and_delete() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let event_id = app.event(&admin, 5).await;

    let all = app.get("/api/v1/events", None).await;
    assert_eq!(all.status, StatusCode::OK);
    let summaries = all.body["data"].as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["title"], "경복궁 야간관람");
    assert!(summaries[0].get("content").is_none());

    let hit = app.get("/api/v1/events?search=%EA%B2%BD%EB%B3%B5%EA%B6%81", None).await;
    assert_eq!(hit.body["data"].as_array().unwrap().len(), 1);
    let miss = app.get("/api/v1/events?search=deoksugung", None).await;
    assert_eq!(miss.body["data"].as_array().unwrap().len(), 0);

    let detail = app.get(&format!("/api/v1/events/{}", event_id), None).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["data"]["likes"], 0);
    assert_eq!(detail.body["data"]["time_slots"], json!(["19:00-20:00", "20:30-21:30"]));

    let bad_update = app
        .put(
            &format!("/api/v1/events/{}", event_id),
            Some(&admin),
            json!({ "event_end_date": "2026-04-01T00:00:00Z" }),
        )
        .await;
    assert_eq!(bad_update.status, StatusCode::BAD_REQUEST);

    let update = app
        .put(
            &format!("/api/v1/events/{}", event_id),
            Some(&admin),
            json!({ "title": "창덕궁 달빛기행", "money": 5000 }),
        )
        .await;
    assert_eq!(update.status, StatusCode::OK, "{}", update.body);
    assert_eq!(update.body["data"]["title"], "창덕궁 달빛기행");
    assert_eq!(update.body["data"]["money"], 5000);
    assert_eq!(update.body["data"]["max_booking"], 5);

    let deleted = app.delete(&format!("/api/v1/events/{}", event_id), Some(&admin)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = app.get(&format!("/api/v1/events/{}", event_id), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&gone), "NOT_FOUND");
}

#[tokio::test]
async fn test_reviews_newest_first_and_owner_only() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let event_id = app.event(&admin, 5).await;
    let (_, author) = app.user("author").await;
    let (_, stranger) = app.user("stranger").await;
    let uri = format!("/api/v1/events/{}/review", event_id);

    let bad_grade = app
        .post(&uri, Some(&author), json!({ "content": "좋아요", "grade": 6 }))
        .await;
    assert_eq!(bad_grade.status, StatusCode::BAD_REQUEST);

    let first = app
        .post(&uri, Some(&author), json!({ "content": "first", "grade": 4 }))
        .await;
    assert_eq!(first.status, StatusCode::CREATED);
    let second = app
        .post(&uri, Some(&author), json!({ "content": "second", "grade": 5 }))
        .await;
    let review_id = second.body["data"]["id"].as_i64().unwrap();

    let list = app.get(&uri, None).await;
    let reviews = list.body["data"].as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["content"], "second");

    let review_uri = format!("/api/v1/reviews/{}", review_id);
    let hijack = app
        .put(&review_uri, Some(&stranger), json!({ "content": "mine now" }))
        .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let edit = app
        .put(&review_uri, Some(&author), json!({ "grade": 3 }))
        .await;
    assert_eq!(edit.status, StatusCode::OK);
    assert_eq!(edit.body["data"]["grade"], 3);
    assert_eq!(edit.body["data"]["content"], "second");

    assert_eq!(
        app.delete(&review_uri, Some(&stranger)).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.delete(&review_uri, Some(&author)).await.status,
        StatusCode::NO_CONTENT
    );
    assert_eq!(app.get(&uri, None).await.body["data"].as_array().unwrap().len(), 1);

    let missing_event = app
        .post("/api/v1/events/999/review", Some(&author), json!({ "content": "x", "grade": 1 }))
        .await;
    assert_eq!(missing_event.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_and_bookmark_toggle() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let event_id = app.event(&admin, 5).await;
    let (_, token) = app.user("fan").await;
    let like_uri = format!("/api/v1/events/{}/like", event_id);

    let liked = app.post(&like_uri, Some(&token), json!({})).await;
    assert_eq!(liked.status, StatusCode::OK);
    assert_eq!(liked.body["data"]["status"], "liked");
    assert_eq!(liked.body["data"]["count"], 1);

    let unliked = app.post(&like_uri, Some(&token), json!({})).await;
    assert_eq!(unliked.body["data"]["status"], "unliked");
    assert_eq!(unliked.body["data"]["count"], 0);

    let bookmarked = app
        .post(&format!("/api/v1/events/{}/bookmark", event_id), Some(&token), json!({}))
        .await;
    assert_eq!(bookmarked.body["data"]["status"], "bookmarked");

    let me = app.get("/api/v1/users/me", Some(&token)).await;
    let bookmarks = me.body["data"]["bookmark_events"].as_array().unwrap();
    assert_eq!(bookmarks.len(), 1);
    assert_eq!(bookmarks[0]["id"], event_id);

    let missing = app.post("/api/v1/events/999/like", Some(&token), json!({})).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_listing_import_is_all_or_nothing() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let invalid = app
        .post(
            "/api/v1/events/listings",
            Some(&admin),
            json!([
                { "title": "덕수궁 석조전", "start_date": "2026-06-01", "end_date": "2026-06-30" },
                { "title": "", "start_date": "2026-06-01" },
            ]),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.get("/api/v1/events/listings", None).await.body["data"], json!([]));

    let imported = app
        .post(
            "/api/v1/events/listings",
            Some(&admin),
            json!([
                { "title": "덕수궁 석조전", "start_date": "2026-06-01", "end_date": "2026-06-30" },
                { "title": "종묘 제례악", "image": "https://example.com/jongmyo.jpg" },
            ]),
        )
        .await;
    assert_eq!(imported.status, StatusCode::CREATED, "{}", imported.body);
    assert_eq!(imported.body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_overlong_category_and_listing_fields_are_rejected() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let category = app
        .post(
            "/api/v1/events/categories",
            Some(&admin),
            json!({ "name": "전시", "description": "설".repeat(201) }),
        )
        .await;
    assert_eq!(category.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&category), "VALIDATION_ERROR");

    let at_limit = app
        .post(
            "/api/v1/events/categories",
            Some(&admin),
            json!({ "name": "전시", "description": "설".repeat(200) }),
        )
        .await;
    assert_eq!(at_limit.status, StatusCode::CREATED, "{}", at_limit.body);

    let listing = app
        .post(
            "/api/v1/events/listings",
            Some(&admin),
            json!([{ "title": "창덕궁 달빛기행", "image": "i".repeat(501) }]),
        )
        .await;
    assert_eq!(listing.status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&listing), "VALIDATION_ERROR");
    assert_eq!(app.get("/api/v1/events/listings", None).await.body["data"], json!([]));
}
