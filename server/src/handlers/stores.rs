use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::{require_staff, AuthUser};
use crate::models::store::{
    validate_comment, Hanbok, NewHanbok, NewStore, NewStoreComment, Store, StoreComment,
};
use crate::models::Toggle;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, success};

use super::events::ToggleResult;

#[derive(Debug, Deserialize)]
pub struct CreateStoreRequest {
    pub hanbok_store: String,
    pub hanbok_address: String,
    pub location_x: Decimal,
    pub location_y: Decimal,
    #[serde(default)]
    pub star: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CreateHanbokRequest {
    pub hanbok_name: String,
    pub hanbok_description: String,
    pub hanbok_price: i32,
    pub hanbok_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct StoreList {
    #[serde(rename = "StoreList")]
    pub stores: Vec<Store>,
}

#[derive(Debug, Serialize)]
pub struct StoreDetail {
    #[serde(rename = "Store")]
    pub store: Store,
    #[serde(rename = "HanbokList")]
    pub hanboks: Vec<Hanbok>,
    #[serde(rename = "Comment")]
    pub comments: Vec<StoreComment>,
    pub likes: i64,
    pub bookmarks: i64,
}

pub async fn list_stores(State(state): State<AppState>) -> Result<Response, AppError> {
    let stores = state.repo.list_stores().await?;
    Ok(success(StoreList { stores }, "Stores retrieved"))
}

pub async fn create_store(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<CreateStoreRequest>,
) -> Result<Response, AppError> {
    require_staff(&user)?;

    let new_store = NewStore {
        owner_id: user.id,
        hanbok_store: payload.hanbok_store.trim().to_string(),
        hanbok_address: payload.hanbok_address.trim().to_string(),
        location_x: payload.location_x,
        location_y: payload.location_y,
        star: payload.star,
    };
    new_store.validate()?;

    let store = state.repo.create_store(new_store).await?;
    tracing::info!(store_id = store.id, owner_id = user.id, "Store created");
    Ok(created(store, "Store created"))
}

pub async fn store_detail(
    State(state): State<AppState>,
    AppPath(store_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let store = state.repo.get_store(store_id).await?;
    let hanboks = state.repo.list_hanboks(store_id).await?;
    let comments = state.repo.list_store_comments(store_id).await?;
    let engagement = state.repo.store_engagement(store_id).await?;

    Ok(success(
        StoreDetail {
            store,
            hanboks,
            comments,
            likes: engagement.likes,
            bookmarks: engagement.bookmarks,
        },
        "Store retrieved",
    ))
}

pub async fn list_hanboks(
    State(state): State<AppState>,
    AppPath(store_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let hanboks = state.repo.list_hanboks(store_id).await?;
    Ok(success(hanboks, "Hanboks retrieved"))
}

/// Only staff members may list items, and only in a store they own.
pub async fn create_hanbok(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(store_id): AppPath<i64>,
    AppJson(payload): AppJson<CreateHanbokRequest>,
) -> Result<Response, AppError> {
    require_staff(&user)?;
    let store = state.repo.get_store(store_id).await?;
    if store.owner_id != user.id {
        return Err(AppError::Forbidden(
            "You can only add hanboks to your own store".to_string(),
        ));
    }

    let new_hanbok = NewHanbok {
        store_id,
        owner_id: user.id,
        hanbok_name: payload.hanbok_name.trim().to_string(),
        hanbok_description: payload.hanbok_description.trim().to_string(),
        hanbok_price: payload.hanbok_price,
        hanbok_image: payload.hanbok_image,
    };
    new_hanbok.validate()?;

    let hanbok = state.repo.create_hanbok(new_hanbok).await?;
    Ok(created(hanbok, "Hanbok created"))
}

pub async fn list_comments(
    State(state): State<AppState>,
    AppPath(store_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let comments = state.repo.list_store_comments(store_id).await?;
    Ok(success(comments, "Comments retrieved"))
}

pub async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(store_id): AppPath<i64>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<Response, AppError> {
    validate_comment(&payload.content)?;
    let comment = state
        .repo
        .create_store_comment(NewStoreComment {
            store_id,
            author_id: user.id,
            content: payload.content.trim().to_string(),
        })
        .await?;
    Ok(created(comment, "Comment created"))
}

async fn authored_comment(
    state: &AppState,
    comment_id: i64,
    user_id: i64,
) -> Result<StoreComment, AppError> {
    let comment = state.repo.get_store_comment(comment_id).await?;
    if comment.author_id != user_id {
        return Err(AppError::Forbidden(
            "Only the author can change this comment".to_string(),
        ));
    }
    Ok(comment)
}

pub async fn update_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(comment_id): AppPath<i64>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<Response, AppError> {
    authored_comment(&state, comment_id, user.id).await?;
    validate_comment(&payload.content)?;
    let comment = state
        .repo
        .update_store_comment(comment_id, payload.content.trim().to_string())
        .await?;
    Ok(success(comment, "Comment updated"))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(comment_id): AppPath<i64>,
) -> Result<Response, AppError> {
    authored_comment(&state, comment_id, user.id).await?;
    state.repo.delete_store_comment(comment_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(store_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let toggle = state.repo.toggle_store_like(store_id, user.id).await?;
    let engagement = state.repo.store_engagement(store_id).await?;
    let status = match toggle {
        Toggle::Added => "liked",
        Toggle::Removed => "unliked",
    };
    Ok(success(
        ToggleResult {
            status,
            count: engagement.likes,
        },
        status,
    ))
}

pub async fn toggle_bookmark(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(store_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let toggle = state.repo.toggle_store_bookmark(store_id, user.id).await?;
    let engagement = state.repo.store_engagement(store_id).await?;
    let status = match toggle {
        Toggle::Added => "bookmarked",
        Toggle::Removed => "unbookmarked",
    };
    Ok(success(
        ToggleResult {
            status,
            count: engagement.bookmarks,
        },
        status,
    ))
}
