use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::models::event::{validate_grade, validate_review_content, NewEventReview, ReviewUpdate};
use crate::models::user::User;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub content: String,
    pub grade: i32,
    pub review_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub content: Option<String>,
    pub grade: Option<i32>,
    pub review_image: Option<String>,
}

fn ensure_author(user: &User, author_id: i64) -> Result<(), AppError> {
    if user.id != author_id {
        return Err(AppError::Forbidden(
            "Only the author can change this review".to_string(),
        ));
    }
    Ok(())
}

/// Reviews of an event, newest first.
pub async fn list_reviews(
    State(state): State<AppState>,
    AppPath(event_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let reviews = state.repo.list_event_reviews(event_id).await?;
    Ok(success(reviews, "Reviews retrieved"))
}

pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(event_id): AppPath<i64>,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> Result<Response, AppError> {
    validate_review_content(&payload.content)?;
    validate_grade(payload.grade)?;

    let review = state
        .repo
        .create_event_review(NewEventReview {
            author_id: user.id,
            event_id,
            content: payload.content.trim().to_string(),
            review_image: payload.review_image,
            grade: payload.grade,
        })
        .await?;
    Ok(created(review, "Review created"))
}

pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(review_id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateReviewRequest>,
) -> Result<Response, AppError> {
    let review = state.repo.get_event_review(review_id).await?;
    ensure_author(&user, review.author_id)?;

    let update = ReviewUpdate {
        content: payload
            .content
            .map(|c| c.trim().to_string())
            .unwrap_or(review.content),
        review_image: payload.review_image.or(review.review_image),
        grade: payload.grade.unwrap_or(review.grade),
    };
    validate_review_content(&update.content)?;
    validate_grade(update.grade)?;

    let review = state.repo.update_event_review(review_id, update).await?;
    Ok(success(review, "Review updated"))
}

pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(review_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let review = state.repo.get_event_review(review_id).await?;
    ensure_author(&user, review.author_id)?;
    state.repo.delete_event_review(review_id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
