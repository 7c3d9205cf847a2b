use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{require_admin, AuthUser};
use crate::db::RepoError;
use crate::models::event::{
    validate_listing, Event, EventPatch, EventSummary, NewCategory, NewEvent, NewEventListing,
};
use crate::models::Toggle;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{AppJson, AppPath, AppQuery};
use crate::utils::response::{created, success};

#[derive(Debug, Default, Deserialize)]
pub struct EventSearch {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub category_id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_slots: Vec<String>,
    pub max_booking: Option<i32>,
    pub money: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub likes: i64,
    pub bookmarks: i64,
}

#[derive(Debug, Serialize)]
pub struct ToggleResult {
    pub status: &'static str,
    pub count: i64,
}

/// Rejects a category reference that does not resolve, as a client error.
async fn ensure_category(state: &AppState, category_id: i64) -> Result<(), AppError> {
    match state.repo.get_category(category_id).await {
        Ok(_) => Ok(()),
        Err(RepoError::NotFound(_)) => Err(AppError::ValidationError(format!(
            "category {} does not exist",
            category_id
        ))),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EventSearch>,
) -> Result<Response, AppError> {
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let events: Vec<EventSummary> = state
        .repo
        .list_events(search)
        .await?
        .iter()
        .map(EventSummary::from)
        .collect();
    Ok(success(events, "Events retrieved"))
}

pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<Response, AppError> {
    require_admin(&user)?;
    ensure_category(&state, payload.category_id).await?;

    let new_event = NewEvent {
        author_id: user.id,
        category_id: payload.category_id,
        title: payload.title,
        content: payload.content,
        image: payload.image,
        event_start_date: payload.event_start_date,
        event_end_date: payload.event_end_date,
        time_slots: payload.time_slots,
        max_booking: payload.max_booking,
        money: payload.money,
        tags: payload.tags,
    }
    .normalize()?;

    let event = state.repo.create_event(new_event).await?;
    tracing::info!(event_id = event.id, author_id = user.id, "Event created");
    Ok(created(event, "Event created"))
}

pub async fn get_event(
    State(state): State<AppState>,
    AppPath(event_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let event = state.repo.get_event(event_id).await?;
    let engagement = state.repo.event_engagement(event_id).await?;
    Ok(success(
        EventDetail {
            event,
            likes: engagement.likes,
            bookmarks: engagement.bookmarks,
        },
        "Event retrieved",
    ))
}

pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(event_id): AppPath<i64>,
    AppJson(patch): AppJson<EventPatch>,
) -> Result<Response, AppError> {
    require_admin(&user)?;

    let mut event = state.repo.get_event(event_id).await?;
    if let Some(category_id) = patch.category_id {
        if category_id != event.category_id {
            ensure_category(&state, category_id).await?;
        }
    }
    event.apply(patch)?;

    let event = state.repo.update_event(&event).await?;
    Ok(success(event, "Event updated"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(event_id): AppPath<i64>,
) -> Result<Response, AppError> {
    require_admin(&user)?;
    state.repo.delete_event(event_id).await?;
    tracing::info!(event_id, admin_id = user.id, "Event deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(event_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let toggle = state.repo.toggle_event_like(event_id, user.id).await?;
    let engagement = state.repo.event_engagement(event_id).await?;
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
    AppPath(event_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let toggle = state.repo.toggle_event_bookmark(event_id, user.id).await?;
    let engagement = state.repo.event_engagement(event_id).await?;
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

pub async fn list_categories(State(state): State<AppState>) -> Result<Response, AppError> {
    let categories = state.repo.list_categories().await?;
    Ok(success(categories, "Categories retrieved"))
}

pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<Response, AppError> {
    require_admin(&user)?;
    let new_category = NewCategory {
        name: payload.name.trim().to_string(),
        description: payload.description,
    };
    new_category.validate()?;

    let category = state.repo.create_category(new_category).await?;
    Ok(created(category, "Category created"))
}

pub async fn list_listings(State(state): State<AppState>) -> Result<Response, AppError> {
    let listings = state.repo.list_event_listings().await?;
    Ok(success(listings, "Listings retrieved"))
}

/// Stores externally curated announcements in one batch; nothing is stored if any entry is invalid.
pub async fn import_listings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(listings): AppJson<Vec<NewEventListing>>,
) -> Result<Response, AppError> {
    require_admin(&user)?;
    if listings.is_empty() {
        return Err(AppError::ValidationError(
            "at least one listing is required".to_string(),
        ));
    }
    for listing in &listings {
        validate_listing(listing)?;
    }

    let created_rows = state.repo.create_event_listings(listings).await?;
    tracing::info!(count = created_rows.len(), "Imported event listings");
    Ok(created(created_rows, "Listings imported"))
}
