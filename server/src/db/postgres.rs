//! Postgres repository over a `sqlx::PgPool`.
//!
//! The schema lives in `server/migrations` and is applied at startup with
//! [`PgRepository::migrate`]. Uniqueness and referential rules are enforced
//! by constraints; their violations surface as [`RepoError::Conflict`] and
//! [`RepoError::NotFound`]. Multi-statement operations run inside one
//! transaction, and the booking toggle locks the ticket row with
//! `SELECT ... FOR UPDATE` so capacity checks never race.
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{RepoError, RepoResult, Repository};
use crate::models::event::{
    Category, Event, EventListing, EventReview, NewCategory, NewEvent, NewEventListing,
    NewEventReview, ReviewUpdate,
};
use crate::models::purchase::{NewPurchaseRecord, PurchaseApproval, PurchaseRecord};
use crate::models::store::{Hanbok, NewHanbok, NewStore, NewStoreComment, Store, StoreComment};
use crate::models::ticket::{
    BookedTicket, BookingDecision, BookingOutcome, NewTicket, Ticket, TicketBooking,
};
use crate::models::user::{NewUser, ProfileUpdate, RoleUpdate, User};
use crate::models::{Engagement, Toggle};

const USER_COLUMNS: &str = "id, email, username, password_hash, profile_image, is_active, \
     is_admin, is_staff, created_at, updated_at";
const EVENT_COLUMNS: &str = "id, author_id, category_id, title, content, image, \
     event_start_date, event_end_date, time_slots, max_booking, money, tags, created_at, updated_at";
const REVIEW_COLUMNS: &str =
    "id, author_id, event_id, content, review_image, grade, created_at, updated_at";
const TICKET_COLUMNS: &str =
    "id, author_id, event_id, event_date, event_time, max_booking_count, current_booking, money";
const BOOKING_COLUMNS: &str = "id, author_id, ticket_id, money, quantity, created_at";
const STORE_COLUMNS: &str =
    "id, owner_id, hanbok_store, hanbok_address, location_x, location_y, star, created_at";
const HANBOK_COLUMNS: &str =
    "id, store_id, owner_id, hanbok_name, hanbok_description, hanbok_price, hanbok_image";
const COMMENT_COLUMNS: &str = "id, store_id, author_id, content, created_at, updated_at";
const PURCHASE_COLUMNS: &str = "id, user_id, tid, partner_order_id, partner_user_id, item_name, \
     quantity, total_amount, vat_amount, tax_free_amount, rsrvt_date, rsrvt_time, created_at, \
     payment_method_type, aid, approved_at";

#[derive(Debug, FromRow)]
struct EventRow {
    id: i64,
    author_id: i64,
    category_id: i64,
    title: String,
    content: String,
    image: Option<String>,
    event_start_date: Option<DateTime<Utc>>,
    event_end_date: Option<DateTime<Utc>>,
    time_slots: Json<Vec<String>>,
    max_booking: Option<i32>,
    money: Option<i32>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            category_id: row.category_id,
            title: row.title,
            content: row.content,
            image: row.image,
            event_start_date: row.event_start_date,
            event_end_date: row.event_end_date,
            time_slots: row.time_slots.0,
            max_booking: row.max_booking,
            money: row.money,
            tags: row.tags,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Tables that hold a (parent, user) membership pair. The SQL fragments are
/// fixed per variant so no caller-supplied text reaches a query string.
#[derive(Debug, Clone, Copy)]
enum Membership {
    EventLike,
    EventBookmark,
    StoreLike,
    StoreBookmark,
}

impl Membership {
    fn table(self) -> &'static str {
        match self {
            Membership::EventLike => "event_likes",
            Membership::EventBookmark => "event_bookmarks",
            Membership::StoreLike => "store_likes",
            Membership::StoreBookmark => "store_bookmarks",
        }
    }

    fn parent_column(self) -> &'static str {
        match self {
            Membership::EventLike | Membership::EventBookmark => "event_id",
            Membership::StoreLike | Membership::StoreBookmark => "store_id",
        }
    }

    fn parent_label(self) -> &'static str {
        match self {
            Membership::EventLike | Membership::EventBookmark => "event",
            Membership::StoreLike | Membership::StoreBookmark => "store",
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn constraint_of(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db) => db.constraint(),
        _ => None,
    }
}

/// Maps constraint violations on a write to the matching repository error.
fn write_error(err: sqlx::Error, conflict: &str, missing: &str) -> RepoError {
    if is_unique_violation(&err) {
        RepoError::Conflict(conflict.to_string())
    } else if is_foreign_key_violation(&err) {
        RepoError::NotFound(missing.to_string())
    } else {
        RepoError::Database(err)
    }
}

fn user_write_error(err: sqlx::Error) -> RepoError {
    if is_unique_violation(&err) {
        let what = match constraint_of(&err) {
            Some("users_username_key") => "username is already taken",
            _ => "email is already registered",
        };
        RepoError::Conflict(what.to_string())
    } else {
        RepoError::Database(err)
    }
}

fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }

    async fn exists(&self, table: &'static str, label: &str, id: i64) -> RepoResult<()> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", table);
        let found: bool = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if found {
            Ok(())
        } else {
            Err(RepoError::NotFound(format!("{} {}", label, id)))
        }
    }

    async fn toggle_membership(
        &self,
        membership: Membership,
        parent_id: i64,
        user_id: i64,
    ) -> RepoResult<Toggle> {
        let delete_sql = format!(
            "DELETE FROM {} WHERE {} = $1 AND user_id = $2",
            membership.table(),
            membership.parent_column()
        );
        let insert_sql = format!(
            "INSERT INTO {} ({}, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            membership.table(),
            membership.parent_column()
        );
        let mut tx = self.pool.begin().await?;

        // Each statement sees rows committed by concurrent toggles, so retry
        // until one of them actually changes the set.
        let toggle = loop {
            let removed = sqlx::query(&delete_sql)
                .bind(parent_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            if removed > 0 {
                break Toggle::Removed;
            }

            let inserted = sqlx::query(&insert_sql)
                .bind(parent_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|err| {
                    write_error(
                        err,
                        "membership already recorded",
                        &format!("{} {}", membership.parent_label(), parent_id),
                    )
                })?
                .rows_affected();
            if inserted > 0 {
                break Toggle::Added;
            }
        };

        tx.commit().await?;
        Ok(toggle)
    }

    async fn engagement(&self, likes: Membership, bookmarks: Membership, id: i64) -> RepoResult<Engagement> {
        let sql = format!(
            "SELECT (SELECT COUNT(*) FROM {likes} WHERE {col} = $1), \
                    (SELECT COUNT(*) FROM {bookmarks} WHERE {col} = $1)",
            likes = likes.table(),
            bookmarks = bookmarks.table(),
            col = likes.parent_column(),
        );
        let (likes, bookmarks): (i64, i64) = sqlx::query_as(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(Engagement { likes, bookmarks })
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, username, password_hash, profile_image, is_admin, is_staff) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.profile_image)
        .bind(user.is_admin)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(user_write_error)
    }

    async fn get_user(&self, id: i64) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("user {}", id)))
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET email = $2, username = $3, profile_image = $4, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&update.email)
        .bind(&update.username)
        .bind(&update.profile_image)
        .fetch_optional(&self.pool)
        .await
        .map_err(user_write_error)?
        .ok_or_else(|| RepoError::NotFound(format!("user {}", id)))
    }

    async fn update_password(&self, id: i64, password_hash: String) -> RepoResult<()> {
        let updated = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(RepoError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn update_roles(&self, id: i64, roles: RoleUpdate) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_admin = COALESCE($2, is_admin), is_staff = COALESCE($3, is_staff), \
             is_active = COALESCE($4, is_active), updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(roles.is_admin)
        .bind(roles.is_staff)
        .bind(roles.is_active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("user {}", id)))
    }

    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> RepoResult<()> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> RepoResult<bool> {
        Ok(
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)")
                .bind(jti)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_category(&self, id: i64) -> RepoResult<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("category {}", id)))
    }

    async fn create_category(&self, category: NewCategory) -> RepoResult<Category> {
        let conflict = format!("category '{}' already exists", category.name);
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) \
             RETURNING id, name, description",
        )
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| write_error(err, &conflict, "category"))
    }

    async fn list_events(&self, search: Option<&str>) -> RepoResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE $1::text IS NULL OR title ILIKE $1 ORDER BY id",
            EVENT_COLUMNS
        ))
        .bind(search.map(like_pattern))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn get_event(&self, id: i64) -> RepoResult<Event> {
        sqlx::query_as::<_, EventRow>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Event::from)
            .ok_or_else(|| RepoError::NotFound(format!("event {}", id)))
    }

    async fn create_event(&self, event: NewEvent) -> RepoResult<Event> {
        let missing = format!("category {}", event.category_id);
        sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO events (author_id, category_id, title, content, image, event_start_date, \
             event_end_date, time_slots, max_booking, money, tags) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(event.author_id)
        .bind(event.category_id)
        .bind(&event.title)
        .bind(&event.content)
        .bind(&event.image)
        .bind(event.event_start_date)
        .bind(event.event_end_date)
        .bind(Json(&event.time_slots))
        .bind(event.max_booking)
        .bind(event.money)
        .bind(&event.tags)
        .fetch_one(&self.pool)
        .await
        .map(Event::from)
        .map_err(|err| write_error(err, "event already exists", &missing))
    }

    async fn update_event(&self, event: &Event) -> RepoResult<Event> {
        let missing = format!("category {}", event.category_id);
        sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events SET category_id = $2, title = $3, content = $4, image = $5, \
             event_start_date = $6, event_end_date = $7, time_slots = $8, max_booking = $9, \
             money = $10, tags = $11, updated_at = NOW() WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(event.id)
        .bind(event.category_id)
        .bind(&event.title)
        .bind(&event.content)
        .bind(&event.image)
        .bind(event.event_start_date)
        .bind(event.event_end_date)
        .bind(Json(&event.time_slots))
        .bind(event.max_booking)
        .bind(event.money)
        .bind(&event.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| write_error(err, "event already exists", &missing))?
        .map(Event::from)
        .ok_or_else(|| RepoError::NotFound(format!("event {}", event.id)))
    }

    async fn delete_event(&self, id: i64) -> RepoResult<()> {
        let deleted = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(RepoError::NotFound(format!("event {}", id)));
        }
        Ok(())
    }

    async fn toggle_event_like(&self, event_id: i64, user_id: i64) -> RepoResult<Toggle> {
        self.toggle_membership(Membership::EventLike, event_id, user_id)
            .await
    }

    async fn toggle_event_bookmark(&self, event_id: i64, user_id: i64) -> RepoResult<Toggle> {
        self.toggle_membership(Membership::EventBookmark, event_id, user_id)
            .await
    }

    async fn event_engagement(&self, event_id: i64) -> RepoResult<Engagement> {
        self.exists("events", "event", event_id).await?;
        self.engagement(Membership::EventLike, Membership::EventBookmark, event_id)
            .await
    }

    async fn bookmarked_events(&self, user_id: i64) -> RepoResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(
            "SELECT e.id, e.author_id, e.category_id, e.title, e.content, e.image, \
             e.event_start_date, e.event_end_date, e.time_slots, e.max_booking, e.money, e.tags, \
             e.created_at, e.updated_at \
             FROM events e JOIN event_bookmarks b ON b.event_id = e.id \
             WHERE b.user_id = $1 ORDER BY e.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn list_event_reviews(&self, event_id: i64) -> RepoResult<Vec<EventReview>> {
        self.exists("events", "event", event_id).await?;
        Ok(sqlx::query_as::<_, EventReview>(&format!(
            "SELECT {} FROM event_reviews WHERE event_id = $1 ORDER BY created_at DESC, id DESC",
            REVIEW_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_event_review(&self, id: i64) -> RepoResult<EventReview> {
        sqlx::query_as::<_, EventReview>(&format!(
            "SELECT {} FROM event_reviews WHERE id = $1",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("review {}", id)))
    }

    async fn create_event_review(&self, review: NewEventReview) -> RepoResult<EventReview> {
        let missing = format!("event {}", review.event_id);
        sqlx::query_as::<_, EventReview>(&format!(
            "INSERT INTO event_reviews (author_id, event_id, content, review_image, grade) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(review.author_id)
        .bind(review.event_id)
        .bind(&review.content)
        .bind(&review.review_image)
        .bind(review.grade)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| write_error(err, "review already exists", &missing))
    }

    async fn update_event_review(&self, id: i64, update: ReviewUpdate) -> RepoResult<EventReview> {
        sqlx::query_as::<_, EventReview>(&format!(
            "UPDATE event_reviews SET content = $2, review_image = $3, grade = $4, \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .bind(&update.content)
        .bind(&update.review_image)
        .bind(update.grade)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("review {}", id)))
    }

    async fn delete_event_review(&self, id: i64) -> RepoResult<()> {
        let deleted = sqlx::query("DELETE FROM event_reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(RepoError::NotFound(format!("review {}", id)));
        }
        Ok(())
    }

    async fn list_event_listings(&self) -> RepoResult<Vec<EventListing>> {
        Ok(sqlx::query_as::<_, EventListing>(
            "SELECT id, title, start_date, end_date, image FROM event_listings ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_event_listings(
        &self,
        listings: Vec<NewEventListing>,
    ) -> RepoResult<Vec<EventListing>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(listings.len());
        for listing in listings {
            let row = sqlx::query_as::<_, EventListing>(
                "INSERT INTO event_listings (title, start_date, end_date, image) \
                 VALUES ($1, $2, $3, $4) RETURNING id, title, start_date, end_date, image",
            )
            .bind(&listing.title)
            .bind(listing.start_date)
            .bind(listing.end_date)
            .bind(&listing.image)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn list_tickets(&self, event_id: i64) -> RepoResult<Vec<Ticket>> {
        self.exists("events", "event", event_id).await?;
        Ok(sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {} FROM tickets WHERE event_id = $1 ORDER BY event_date, event_time, id",
            TICKET_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_ticket(&self, id: i64) -> RepoResult<Ticket> {
        sqlx::query_as::<_, Ticket>(&format!("SELECT {} FROM tickets WHERE id = $1", TICKET_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("ticket {}", id)))
    }

    async fn create_ticket(&self, ticket: NewTicket) -> RepoResult<Ticket> {
        let conflict = format!(
            "a ticket for {} {} already exists",
            ticket.event_date, ticket.event_time
        );
        let missing = format!("event {}", ticket.event_id);
        sqlx::query_as::<_, Ticket>(&format!(
            "INSERT INTO tickets (author_id, event_id, event_date, event_time, max_booking_count, money) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            TICKET_COLUMNS
        ))
        .bind(ticket.author_id)
        .bind(ticket.event_id)
        .bind(ticket.event_date)
        .bind(&ticket.event_time)
        .bind(ticket.max_booking_count)
        .bind(ticket.money)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| write_error(err, &conflict, &missing))
    }

    async fn create_missing_tickets(&self, tickets: Vec<NewTicket>) -> RepoResult<Vec<Ticket>> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::new();
        for ticket in tickets {
            let missing = format!("event {}", ticket.event_id);
            let row = sqlx::query_as::<_, Ticket>(&format!(
                "INSERT INTO tickets (author_id, event_id, event_date, event_time, max_booking_count, money) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (event_id, event_date, event_time) DO NOTHING RETURNING {}",
                TICKET_COLUMNS
            ))
            .bind(ticket.author_id)
            .bind(ticket.event_id)
            .bind(ticket.event_date)
            .bind(&ticket.event_time)
            .bind(ticket.max_booking_count)
            .bind(ticket.money)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|err| write_error(err, "ticket already exists", &missing))?;
            created.extend(row);
        }
        tx.commit().await?;
        Ok(created)
    }

    async fn delete_ticket(&self, id: i64) -> RepoResult<()> {
        let deleted = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(RepoError::NotFound(format!("ticket {}", id)));
        }
        Ok(())
    }

    async fn get_booking(
        &self,
        ticket_id: i64,
        user_id: i64,
    ) -> RepoResult<Option<TicketBooking>> {
        Ok(sqlx::query_as::<_, TicketBooking>(&format!(
            "SELECT {} FROM ticket_bookings WHERE ticket_id = $1 AND author_id = $2",
            BOOKING_COLUMNS
        ))
        .bind(ticket_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn toggle_booking(
        &self,
        ticket_id: i64,
        user_id: i64,
        quantity: i32,
    ) -> RepoResult<BookingOutcome> {
        let mut tx = self.pool.begin().await?;

        let ticket = sqlx::query_as::<_, Ticket>(&format!(
            "SELECT {} FROM tickets WHERE id = $1 FOR UPDATE",
            TICKET_COLUMNS
        ))
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("ticket {}", ticket_id)))?;

        let existing = sqlx::query_as::<_, TicketBooking>(&format!(
            "SELECT {} FROM ticket_bookings WHERE ticket_id = $1 AND author_id = $2",
            BOOKING_COLUMNS
        ))
        .bind(ticket_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = match ticket.decide_booking(existing.as_ref(), quantity) {
            BookingDecision::Cancel {
                booking_id,
                quantity,
            } => {
                let booking = sqlx::query_as::<_, TicketBooking>(&format!(
                    "DELETE FROM ticket_bookings WHERE id = $1 RETURNING {}",
                    BOOKING_COLUMNS
                ))
                .bind(booking_id)
                .fetch_one(&mut *tx)
                .await?;
                let ticket = sqlx::query_as::<_, Ticket>(&format!(
                    "UPDATE tickets SET current_booking = GREATEST(current_booking - $2, 0) \
                     WHERE id = $1 RETURNING {}",
                    TICKET_COLUMNS
                ))
                .bind(ticket_id)
                .bind(quantity)
                .fetch_one(&mut *tx)
                .await?;
                BookingOutcome::Cancelled { ticket, booking }
            }
            BookingDecision::Book { quantity, money } => {
                let booking = sqlx::query_as::<_, TicketBooking>(&format!(
                    "INSERT INTO ticket_bookings (author_id, ticket_id, money, quantity) \
                     VALUES ($1, $2, $3, $4) RETURNING {}",
                    BOOKING_COLUMNS
                ))
                .bind(user_id)
                .bind(ticket_id)
                .bind(money)
                .bind(quantity)
                .fetch_one(&mut *tx)
                .await
                .map_err(|err| write_error(err, "ticket is already booked", "user"))?;
                let ticket = sqlx::query_as::<_, Ticket>(&format!(
                    "UPDATE tickets SET current_booking = current_booking + $2 \
                     WHERE id = $1 RETURNING {}",
                    TICKET_COLUMNS
                ))
                .bind(ticket_id)
                .bind(quantity)
                .fetch_one(&mut *tx)
                .await?;
                BookingOutcome::Booked { ticket, booking }
            }
            BookingDecision::SoldOut => BookingOutcome::SoldOut { ticket },
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn list_user_bookings(&self, user_id: i64) -> RepoResult<Vec<BookedTicket>> {
        Ok(sqlx::query_as::<_, BookedTicket>(
            "SELECT b.id AS booking_id, t.id AS ticket_id, t.event_id, t.event_date, t.event_time, \
             b.quantity, b.money, b.created_at \
             FROM ticket_bookings b JOIN tickets t ON t.id = b.ticket_id \
             WHERE b.author_id = $1 ORDER BY t.event_date, t.event_time, b.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_stores(&self) -> RepoResult<Vec<Store>> {
        Ok(sqlx::query_as::<_, Store>(&format!(
            "SELECT {} FROM stores ORDER BY id",
            STORE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_store(&self, id: i64) -> RepoResult<Store> {
        sqlx::query_as::<_, Store>(&format!("SELECT {} FROM stores WHERE id = $1", STORE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("store {}", id)))
    }

    async fn create_store(&self, store: NewStore) -> RepoResult<Store> {
        sqlx::query_as::<_, Store>(&format!(
            "INSERT INTO stores (owner_id, hanbok_store, hanbok_address, location_x, location_y, star) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            STORE_COLUMNS
        ))
        .bind(store.owner_id)
        .bind(&store.hanbok_store)
        .bind(&store.hanbok_address)
        .bind(store.location_x)
        .bind(store.location_y)
        .bind(store.star)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| write_error(err, "store already exists", "user"))
    }

    async fn list_hanboks(&self, store_id: i64) -> RepoResult<Vec<Hanbok>> {
        self.exists("stores", "store", store_id).await?;
        Ok(sqlx::query_as::<_, Hanbok>(&format!(
            "SELECT {} FROM hanboks WHERE store_id = $1 ORDER BY id",
            HANBOK_COLUMNS
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_hanbok(&self, hanbok: NewHanbok) -> RepoResult<Hanbok> {
        let missing = format!("store {}", hanbok.store_id);
        sqlx::query_as::<_, Hanbok>(&format!(
            "INSERT INTO hanboks (store_id, owner_id, hanbok_name, hanbok_description, hanbok_price, hanbok_image) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            HANBOK_COLUMNS
        ))
        .bind(hanbok.store_id)
        .bind(hanbok.owner_id)
        .bind(&hanbok.hanbok_name)
        .bind(&hanbok.hanbok_description)
        .bind(hanbok.hanbok_price)
        .bind(&hanbok.hanbok_image)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| write_error(err, "hanbok already exists", &missing))
    }

    async fn list_store_comments(&self, store_id: i64) -> RepoResult<Vec<StoreComment>> {
        self.exists("stores", "store", store_id).await?;
        Ok(sqlx::query_as::<_, StoreComment>(&format!(
            "SELECT {} FROM store_comments WHERE store_id = $1 ORDER BY id",
            COMMENT_COLUMNS
        ))
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_store_comment(&self, id: i64) -> RepoResult<StoreComment> {
        sqlx::query_as::<_, StoreComment>(&format!(
            "SELECT {} FROM store_comments WHERE id = $1",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("comment {}", id)))
    }

    async fn create_store_comment(&self, comment: NewStoreComment) -> RepoResult<StoreComment> {
        let missing = format!("store {}", comment.store_id);
        sqlx::query_as::<_, StoreComment>(&format!(
            "INSERT INTO store_comments (store_id, author_id, content) VALUES ($1, $2, $3) RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(comment.store_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| write_error(err, "comment already exists", &missing))
    }

    async fn update_store_comment(&self, id: i64, content: String) -> RepoResult<StoreComment> {
        sqlx::query_as::<_, StoreComment>(&format!(
            "UPDATE store_comments SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("comment {}", id)))
    }

    async fn delete_store_comment(&self, id: i64) -> RepoResult<()> {
        let deleted = sqlx::query("DELETE FROM store_comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(RepoError::NotFound(format!("comment {}", id)));
        }
        Ok(())
    }

    async fn toggle_store_like(&self, store_id: i64, user_id: i64) -> RepoResult<Toggle> {
        self.toggle_membership(Membership::StoreLike, store_id, user_id)
            .await
    }

    async fn toggle_store_bookmark(&self, store_id: i64, user_id: i64) -> RepoResult<Toggle> {
        self.toggle_membership(Membership::StoreBookmark, store_id, user_id)
            .await
    }

    async fn store_engagement(&self, store_id: i64) -> RepoResult<Engagement> {
        self.exists("stores", "store", store_id).await?;
        self.engagement(Membership::StoreLike, Membership::StoreBookmark, store_id)
            .await
    }

    async fn bookmarked_stores(&self, user_id: i64) -> RepoResult<Vec<Store>> {
        Ok(sqlx::query_as::<_, Store>(
            "SELECT s.id, s.owner_id, s.hanbok_store, s.hanbok_address, s.location_x, s.location_y, \
             s.star, s.created_at \
             FROM stores s JOIN store_bookmarks b ON b.store_id = s.id \
             WHERE b.user_id = $1 ORDER BY s.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn replace_pending_purchase(
        &self,
        record: NewPurchaseRecord,
    ) -> RepoResult<PurchaseRecord> {
        let mut tx = self.pool.begin().await?;

        let dropped = sqlx::query(
            "DELETE FROM purchase_records WHERE user_id = $1 AND approved_at IS NULL",
        )
        .bind(record.user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if dropped > 0 {
            tracing::debug!(user_id = record.user_id, dropped, "Dropped pending purchase records");
        }

        let conflict = format!("purchase '{}' already exists", record.tid);
        let row = sqlx::query_as::<_, PurchaseRecord>(&format!(
            "INSERT INTO purchase_records (user_id, tid, partner_order_id, partner_user_id, item_name, \
             quantity, total_amount, vat_amount, tax_free_amount, rsrvt_date, rsrvt_time, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {}",
            PURCHASE_COLUMNS
        ))
        .bind(record.user_id)
        .bind(&record.tid)
        .bind(record.partner_order_id)
        .bind(&record.partner_user_id)
        .bind(&record.item_name)
        .bind(record.quantity)
        .bind(record.total_amount)
        .bind(record.vat_amount)
        .bind(record.tax_free_amount)
        .bind(record.rsrvt_date)
        .bind(record.rsrvt_time)
        .bind(record.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| write_error(err, &conflict, "user"))?;

        tx.commit().await?;
        Ok(row)
    }

    async fn get_purchase(&self, tid: &str) -> RepoResult<PurchaseRecord> {
        sqlx::query_as::<_, PurchaseRecord>(&format!(
            "SELECT {} FROM purchase_records WHERE tid = $1",
            PURCHASE_COLUMNS
        ))
        .bind(tid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("purchase '{}'", tid)))
    }

    async fn approve_purchase(
        &self,
        tid: &str,
        approval: PurchaseApproval,
    ) -> RepoResult<PurchaseRecord> {
        let approved = sqlx::query_as::<_, PurchaseRecord>(&format!(
            "UPDATE purchase_records SET aid = $2, payment_method_type = $3, approved_at = $4 \
             WHERE tid = $1 AND approved_at IS NULL RETURNING {}",
            PURCHASE_COLUMNS
        ))
        .bind(tid)
        .bind(&approval.aid)
        .bind(&approval.payment_method_type)
        .bind(approval.approved_at)
        .fetch_optional(&self.pool)
        .await?;

        match approved {
            Some(record) => Ok(record),
            None => {
                // Either the record is missing or another request approved it first.
                self.get_purchase(tid).await?;
                Err(RepoError::Conflict(format!(
                    "purchase '{}' is already approved",
                    tid
                )))
            }
        }
    }

    async fn health_check(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("궁"), "%궁%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn test_membership_sql_fragments() {
        assert_eq!(Membership::EventLike.table(), "event_likes");
        assert_eq!(Membership::StoreBookmark.parent_column(), "store_id");
        assert_eq!(Membership::EventBookmark.parent_label(), "event");
    }
}
