//! Persistence layer.
//!
//! Handlers talk to a [`Repository`] trait object so the same routes run over
//! Postgres in production and over an in-memory backend in development and
//! tests. Operations that must read and write atomically (booking toggles,
//! like/bookmark toggles, pending purchase replacement) are single repository
//! calls; each backend is responsible for making them atomic.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::event::{
    Category, Event, EventListing, EventReview, NewCategory, NewEvent, NewEventListing,
    NewEventReview, ReviewUpdate,
};
use crate::models::purchase::{NewPurchaseRecord, PurchaseApproval, PurchaseRecord};
use crate::models::store::{Hanbok, NewHanbok, NewStore, NewStoreComment, Store, StoreComment};
use crate::models::ticket::{BookedTicket, BookingOutcome, NewTicket, Ticket, TicketBooking};
use crate::models::user::{NewUser, ProfileUpdate, RoleUpdate, User};
use crate::models::{Engagement, Toggle};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait Repository: Send + Sync {
    // Accounts
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn get_user(&self, id: i64) -> RepoResult<User>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<User>;
    async fn update_password(&self, id: i64, password_hash: String) -> RepoResult<()>;
    async fn update_roles(&self, id: i64, roles: RoleUpdate) -> RepoResult<User>;
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> RepoResult<()>;
    async fn is_token_revoked(&self, jti: Uuid) -> RepoResult<bool>;

    // Events
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn get_category(&self, id: i64) -> RepoResult<Category>;
    async fn create_category(&self, category: NewCategory) -> RepoResult<Category>;
    async fn list_events(&self, search: Option<&str>) -> RepoResult<Vec<Event>>;
    async fn get_event(&self, id: i64) -> RepoResult<Event>;
    async fn create_event(&self, event: NewEvent) -> RepoResult<Event>;
    async fn update_event(&self, event: &Event) -> RepoResult<Event>;
    async fn delete_event(&self, id: i64) -> RepoResult<()>;
    async fn toggle_event_like(&self, event_id: i64, user_id: i64) -> RepoResult<Toggle>;
    async fn toggle_event_bookmark(&self, event_id: i64, user_id: i64) -> RepoResult<Toggle>;
    async fn event_engagement(&self, event_id: i64) -> RepoResult<Engagement>;
    async fn bookmarked_events(&self, user_id: i64) -> RepoResult<Vec<Event>>;

    // Event reviews and listings
    async fn list_event_reviews(&self, event_id: i64) -> RepoResult<Vec<EventReview>>;
    async fn get_event_review(&self, id: i64) -> RepoResult<EventReview>;
    async fn create_event_review(&self, review: NewEventReview) -> RepoResult<EventReview>;
    async fn update_event_review(&self, id: i64, update: ReviewUpdate) -> RepoResult<EventReview>;
    async fn delete_event_review(&self, id: i64) -> RepoResult<()>;
    async fn list_event_listings(&self) -> RepoResult<Vec<EventListing>>;
    async fn create_event_listings(
        &self,
        listings: Vec<NewEventListing>,
    ) -> RepoResult<Vec<EventListing>>;

    // Tickets
    async fn list_tickets(&self, event_id: i64) -> RepoResult<Vec<Ticket>>;
    async fn get_ticket(&self, id: i64) -> RepoResult<Ticket>;
    async fn create_ticket(&self, ticket: NewTicket) -> RepoResult<Ticket>;
    /// Inserts the tickets whose (event, date, time) slot is still free; returns the inserted ones.
    async fn create_missing_tickets(&self, tickets: Vec<NewTicket>) -> RepoResult<Vec<Ticket>>;
    async fn delete_ticket(&self, id: i64) -> RepoResult<()>;
    async fn get_booking(&self, ticket_id: i64, user_id: i64)
        -> RepoResult<Option<TicketBooking>>;
    async fn toggle_booking(
        &self,
        ticket_id: i64,
        user_id: i64,
        quantity: i32,
    ) -> RepoResult<BookingOutcome>;
    async fn list_user_bookings(&self, user_id: i64) -> RepoResult<Vec<BookedTicket>>;

    // Stores
    async fn list_stores(&self) -> RepoResult<Vec<Store>>;
    async fn get_store(&self, id: i64) -> RepoResult<Store>;
    async fn create_store(&self, store: NewStore) -> RepoResult<Store>;
    async fn list_hanboks(&self, store_id: i64) -> RepoResult<Vec<Hanbok>>;
    async fn create_hanbok(&self, hanbok: NewHanbok) -> RepoResult<Hanbok>;
    async fn list_store_comments(&self, store_id: i64) -> RepoResult<Vec<StoreComment>>;
    async fn get_store_comment(&self, id: i64) -> RepoResult<StoreComment>;
    async fn create_store_comment(&self, comment: NewStoreComment) -> RepoResult<StoreComment>;
    async fn update_store_comment(&self, id: i64, content: String) -> RepoResult<StoreComment>;
    async fn delete_store_comment(&self, id: i64) -> RepoResult<()>;
    async fn toggle_store_like(&self, store_id: i64, user_id: i64) -> RepoResult<Toggle>;
    async fn toggle_store_bookmark(&self, store_id: i64, user_id: i64) -> RepoResult<Toggle>;
    async fn store_engagement(&self, store_id: i64) -> RepoResult<Engagement>;
    async fn bookmarked_stores(&self, user_id: i64) -> RepoResult<Vec<Store>>;

    // Payments
    /// Drops the user's unapproved records and stores `record` in their place.
    async fn replace_pending_purchase(&self, record: NewPurchaseRecord)
        -> RepoResult<PurchaseRecord>;
    async fn get_purchase(&self, tid: &str) -> RepoResult<PurchaseRecord>;
    async fn approve_purchase(
        &self,
        tid: &str,
        approval: PurchaseApproval,
    ) -> RepoResult<PurchaseRecord>;

    async fn health_check(&self) -> RepoResult<()>;
    fn backend_name(&self) -> &'static str;
}
