#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use hanbok_server::auth::TokenKeys;
use hanbok_server::config::AdminSeed;
use hanbok_server::db::{MemoryRepository, Repository};
use hanbok_server::handlers::users::ensure_superuser;
use hanbok_server::models::user::RoleUpdate;
use hanbok_server::routes::{create_routes, RouterOptions};
use hanbok_server::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@hanbok.test";
pub const ADMIN_PASSWORD: &str = "admin-pass-1";
pub const PASSWORD: &str = "hanbok-pass-1";

#[derive(Clone)]
pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepository>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        let repo = Arc::new(MemoryRepository::new());
        ensure_superuser(
            repo.as_ref(),
            &AdminSeed {
                email: ADMIN_EMAIL.to_string(),
                username: "admin".to_string(),
                password: ADMIN_PASSWORD.to_string(),
            },
        )
        .await
        .expect("seed admin");

        let tokens = TokenKeys::new(
            "integration-secret",
            Duration::from_secs(300),
            Duration::from_secs(3600),
        );
        let shared: Arc<dyn Repository> = repo.clone();
        let router = create_routes(AppState::new(shared, tokens), RouterOptions::default());
        Self { router, repo }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn login(&self, email: &str, password: &str) -> (String, String) {
        let response = self
            .post(
                "/api/v1/users/token",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        let data = &response.body["data"];
        (
            data["access"].as_str().unwrap().to_string(),
            data["refresh"].as_str().unwrap().to_string(),
        )
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await.0
    }

    /// Signs up `username` and returns (user id, access token).
    pub async fn user(&self, username: &str) -> (i64, String) {
        let email = format!("{}@hanbok.test", username);
        let response = self
            .post(
                "/api/v1/users/signup",
                None,
                json!({
                    "email": email,
                    "username": username,
                    "password": PASSWORD,
                    "password2": PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        let id = response.body["data"]["id"].as_i64().unwrap();
        (id, self.login(&email, PASSWORD).await.0)
    }

    pub async fn staff(&self, username: &str) -> (i64, String) {
        let (id, token) = self.user(username).await;
        self.repo
            .update_roles(
                id,
                RoleUpdate {
                    is_staff: Some(true),
                    ..RoleUpdate::default()
                },
            )
            .await
            .unwrap();
        (id, token)
    }

    /// Creates a category and an event running 2026-05-01..=2026-05-03 with two daily slots.
    pub async fn event(&self, admin: &str, max_booking: i32) -> i64 {
        let category = self
            .post(
                "/api/v1/events/categories",
                Some(admin),
                json!({ "name": format!("궁중-{}", max_booking) }),
            )
            .await;
        assert_eq!(category.status, StatusCode::CREATED, "{}", category.body);

        let event = self
            .post(
                "/api/v1/events",
                Some(admin),
                json!({
                    "category_id": category.body["data"]["id"],
                    "title": "경복궁 야간관람",
                    "content": "Night tour of the palace",
                    "event_start_date": "2026-05-01T09:00:00Z",
                    "event_end_date": "2026-05-03T21:00:00Z",
                    "time_slots": ["19:00-20:00", "20:30-21:30"],
                    "max_booking": max_booking,
                    "money": 3000,
                    "tags": ["palace", "night"],
                }),
            )
            .await;
        assert_eq!(event.status, StatusCode::CREATED, "{}", event.body);
        event.body["data"]["id"].as_i64().unwrap()
    }

    pub async fn ticket(&self, admin: &str, event_id: i64, date: &str, time: &str) -> i64 {
        let response = self
            .post(
                &format!("/api/v1/events/{}/tickets", event_id),
                Some(admin),
                json!({ "event_date": date, "event_time": time }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["data"]["id"].as_i64().unwrap()
    }
}

pub fn error_code(response: &TestResponse) -> &str {
    response.body["error"]["code"].as_str().unwrap_or_default()
}
