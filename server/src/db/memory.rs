//! In-memory repository.
//!
//! All state lives behind one `tokio::sync::RwLock`, so every trait method is
//! atomic with respect to every other. Nothing is durable; the backend exists
//! for local development and for the HTTP test-suite.
use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
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

/// Per-table id sequences, mirroring `BIGSERIAL` columns.
#[derive(Debug, Default)]
struct Sequences {
    user: i64,
    category: i64,
    event: i64,
    review: i64,
    listing: i64,
    ticket: i64,
    booking: i64,
    store: i64,
    hanbok: i64,
    comment: i64,
    purchase: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct State {
    seq: Sequences,
    users: BTreeMap<i64, User>,
    revoked_tokens: HashMap<Uuid, DateTime<Utc>>,
    categories: BTreeMap<i64, Category>,
    events: BTreeMap<i64, Event>,
    event_likes: HashSet<(i64, i64)>,
    event_bookmarks: HashSet<(i64, i64)>,
    reviews: BTreeMap<i64, EventReview>,
    listings: BTreeMap<i64, EventListing>,
    tickets: BTreeMap<i64, Ticket>,
    bookings: BTreeMap<i64, TicketBooking>,
    stores: BTreeMap<i64, Store>,
    store_likes: HashSet<(i64, i64)>,
    store_bookmarks: HashSet<(i64, i64)>,
    hanboks: BTreeMap<i64, Hanbok>,
    comments: BTreeMap<i64, StoreComment>,
    purchases: BTreeMap<i64, PurchaseRecord>,
}

impl State {
    fn user_conflict(&self, email: &str, username: &str, except: Option<i64>) -> RepoResult<()> {
        for user in self.users.values().filter(|u| Some(u.id) != except) {
            if user.email.eq_ignore_ascii_case(email) {
                return Err(RepoError::Conflict("email is already registered".into()));
            }
            if user.username == username {
                return Err(RepoError::Conflict("username is already taken".into()));
            }
        }
        Ok(())
    }

    fn user_mut(&mut self, id: i64) -> RepoResult<&mut User> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("user {}", id)))
    }

    fn require_event(&self, id: i64) -> RepoResult<&Event> {
        self.events
            .get(&id)
            .ok_or_else(|| RepoError::NotFound(format!("event {}", id)))
    }

    fn require_store(&self, id: i64) -> RepoResult<&Store> {
        self.stores
            .get(&id)
            .ok_or_else(|| RepoError::NotFound(format!("store {}", id)))
    }

    fn slot_taken(&self, ticket: &NewTicket) -> bool {
        self.tickets.values().any(|t| {
            t.event_id == ticket.event_id
                && t.event_date == ticket.event_date
                && t.event_time == ticket.event_time
        })
    }

    fn insert_ticket(&mut self, ticket: NewTicket) -> Ticket {
        let row = Ticket {
            id: next(&mut self.seq.ticket),
            author_id: ticket.author_id,
            event_id: ticket.event_id,
            event_date: ticket.event_date,
            event_time: ticket.event_time,
            max_booking_count: ticket.max_booking_count,
            current_booking: 0,
            money: ticket.money,
        };
        self.tickets.insert(row.id, row.clone());
        row
    }

    fn remove_ticket(&mut self, id: i64) {
        self.tickets.remove(&id);
        self.bookings.retain(|_, b| b.ticket_id != id);
    }
}

fn toggle(set: &mut HashSet<(i64, i64)>, key: (i64, i64)) -> Toggle {
    if set.remove(&key) {
        Toggle::Removed
    } else {
        set.insert(key);
        Toggle::Added
    }
}

fn count_for(set: &HashSet<(i64, i64)>, target: i64) -> i64 {
    set.iter().filter(|(id, _)| *id == target).count() as i64
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut state = self.state.write().await;
        state.user_conflict(&user.email, &user.username, None)?;
        let now = Utc::now();
        let row = User {
            id: next(&mut state.seq.user),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            profile_image: user.profile_image,
            is_active: true,
            is_admin: user.is_admin,
            is_staff: user.is_staff,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: i64) -> RepoResult<User> {
        self.state
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("user {}", id)))
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> RepoResult<User> {
        let mut state = self.state.write().await;
        state.user_conflict(&update.email, &update.username, Some(id))?;
        let user = state.user_mut(id)?;
        user.email = update.email;
        user.username = update.username;
        user.profile_image = update.profile_image;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn update_password(&self, id: i64, password_hash: String) -> RepoResult<()> {
        let mut state = self.state.write().await;
        let user = state.user_mut(id)?;
        user.password_hash = password_hash;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn update_roles(&self, id: i64, roles: RoleUpdate) -> RepoResult<User> {
        let mut state = self.state.write().await;
        let user = state.user_mut(id)?;
        user.apply_roles(&roles);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> RepoResult<()> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        state.revoked_tokens.retain(|_, exp| *exp > now);
        state.revoked_tokens.insert(jti, expires_at);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> RepoResult<bool> {
        Ok(self.state.read().await.revoked_tokens.contains_key(&jti))
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        Ok(self.state.read().await.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: i64) -> RepoResult<Category> {
        self.state
            .read()
            .await
            .categories
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("category {}", id)))
    }

    async fn create_category(&self, category: NewCategory) -> RepoResult<Category> {
        let mut state = self.state.write().await;
        if state.categories.values().any(|c| c.name == category.name) {
            return Err(RepoError::Conflict(format!(
                "category '{}' already exists",
                category.name
            )));
        }
        let row = Category {
            id: next(&mut state.seq.category),
            name: category.name,
            description: category.description,
        };
        state.categories.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_events(&self, search: Option<&str>) -> RepoResult<Vec<Event>> {
        let needle = search.map(str::to_lowercase);
        Ok(self
            .state
            .read()
            .await
            .events
            .values()
            .filter(|e| match &needle {
                Some(needle) => e.title.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn get_event(&self, id: i64) -> RepoResult<Event> {
        self.state.read().await.require_event(id).cloned()
    }

    async fn create_event(&self, event: NewEvent) -> RepoResult<Event> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&event.category_id) {
            return Err(RepoError::NotFound(format!("category {}", event.category_id)));
        }
        let now = Utc::now();
        let row = Event {
            id: next(&mut state.seq.event),
            author_id: event.author_id,
            category_id: event.category_id,
            title: event.title,
            content: event.content,
            image: event.image,
            event_start_date: event.event_start_date,
            event_end_date: event.event_end_date,
            time_slots: event.time_slots,
            max_booking: event.max_booking,
            money: event.money,
            tags: event.tags,
            created_at: now,
            updated_at: now,
        };
        state.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_event(&self, event: &Event) -> RepoResult<Event> {
        let mut state = self.state.write().await;
        if !state.categories.contains_key(&event.category_id) {
            return Err(RepoError::NotFound(format!("category {}", event.category_id)));
        }
        let stored = state
            .events
            .get_mut(&event.id)
            .ok_or_else(|| RepoError::NotFound(format!("event {}", event.id)))?;
        *stored = Event {
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..event.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_event(&self, id: i64) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if state.events.remove(&id).is_none() {
            return Err(RepoError::NotFound(format!("event {}", id)));
        }
        let ticket_ids: Vec<i64> = state
            .tickets
            .values()
            .filter(|t| t.event_id == id)
            .map(|t| t.id)
            .collect();
        for ticket_id in ticket_ids {
            state.remove_ticket(ticket_id);
        }
        state.reviews.retain(|_, r| r.event_id != id);
        state.event_likes.retain(|(event_id, _)| *event_id != id);
        state.event_bookmarks.retain(|(event_id, _)| *event_id != id);
        Ok(())
    }

    async fn toggle_event_like(&self, event_id: i64, user_id: i64) -> RepoResult<Toggle> {
        let mut state = self.state.write().await;
        state.require_event(event_id)?;
        Ok(toggle(&mut state.event_likes, (event_id, user_id)))
    }

    async fn toggle_event_bookmark(&self, event_id: i64, user_id: i64) -> RepoResult<Toggle> {
        let mut state = self.state.write().await;
        state.require_event(event_id)?;
        Ok(toggle(&mut state.event_bookmarks, (event_id, user_id)))
    }

    async fn event_engagement(&self, event_id: i64) -> RepoResult<Engagement> {
        let state = self.state.read().await;
        state.require_event(event_id)?;
        Ok(Engagement {
            likes: count_for(&state.event_likes, event_id),
            bookmarks: count_for(&state.event_bookmarks, event_id),
        })
    }

    async fn bookmarked_events(&self, user_id: i64) -> RepoResult<Vec<Event>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .values()
            .filter(|e| state.event_bookmarks.contains(&(e.id, user_id)))
            .cloned()
            .collect())
    }

    async fn list_event_reviews(&self, event_id: i64) -> RepoResult<Vec<EventReview>> {
        let state = self.state.read().await;
        state.require_event(event_id)?;
        let mut reviews: Vec<EventReview> = state
            .reviews
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reviews)
    }

    async fn get_event_review(&self, id: i64) -> RepoResult<EventReview> {
        self.state
            .read()
            .await
            .reviews
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("review {}", id)))
    }

    async fn create_event_review(&self, review: NewEventReview) -> RepoResult<EventReview> {
        let mut state = self.state.write().await;
        state.require_event(review.event_id)?;
        let now = Utc::now();
        let row = EventReview {
            id: next(&mut state.seq.review),
            author_id: review.author_id,
            event_id: review.event_id,
            content: review.content,
            review_image: review.review_image,
            grade: review.grade,
            created_at: now,
            updated_at: now,
        };
        state.reviews.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_event_review(&self, id: i64, update: ReviewUpdate) -> RepoResult<EventReview> {
        let mut state = self.state.write().await;
        let review = state
            .reviews
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("review {}", id)))?;
        review.content = update.content;
        review.review_image = update.review_image;
        review.grade = update.grade;
        review.updated_at = Utc::now();
        Ok(review.clone())
    }

    async fn delete_event_review(&self, id: i64) -> RepoResult<()> {
        match self.state.write().await.reviews.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound(format!("review {}", id))),
        }
    }

    async fn list_event_listings(&self) -> RepoResult<Vec<EventListing>> {
        Ok(self.state.read().await.listings.values().cloned().collect())
    }

    async fn create_event_listings(
        &self,
        listings: Vec<NewEventListing>,
    ) -> RepoResult<Vec<EventListing>> {
        let mut state = self.state.write().await;
        let mut created = Vec::with_capacity(listings.len());
        for listing in listings {
            let row = EventListing {
                id: next(&mut state.seq.listing),
                title: listing.title,
                start_date: listing.start_date,
                end_date: listing.end_date,
                image: listing.image,
            };
            state.listings.insert(row.id, row.clone());
            created.push(row);
        }
        Ok(created)
    }

    async fn list_tickets(&self, event_id: i64) -> RepoResult<Vec<Ticket>> {
        let state = self.state.read().await;
        state.require_event(event_id)?;
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        tickets.sort_by(|a, b| {
            (a.event_date, &a.event_time, a.id).cmp(&(b.event_date, &b.event_time, b.id))
        });
        Ok(tickets)
    }

    async fn get_ticket(&self, id: i64) -> RepoResult<Ticket> {
        self.state
            .read()
            .await
            .tickets
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("ticket {}", id)))
    }

    async fn create_ticket(&self, ticket: NewTicket) -> RepoResult<Ticket> {
        let mut state = self.state.write().await;
        state.require_event(ticket.event_id)?;
        if state.slot_taken(&ticket) {
            return Err(RepoError::Conflict(format!(
                "a ticket for {} {} already exists",
                ticket.event_date, ticket.event_time
            )));
        }
        Ok(state.insert_ticket(ticket))
    }

    async fn create_missing_tickets(&self, tickets: Vec<NewTicket>) -> RepoResult<Vec<Ticket>> {
        let mut state = self.state.write().await;
        let mut created = Vec::new();
        for ticket in tickets {
            state.require_event(ticket.event_id)?;
            if !state.slot_taken(&ticket) {
                created.push(state.insert_ticket(ticket));
            }
        }
        Ok(created)
    }

    async fn delete_ticket(&self, id: i64) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if !state.tickets.contains_key(&id) {
            return Err(RepoError::NotFound(format!("ticket {}", id)));
        }
        state.remove_ticket(id);
        Ok(())
    }

    async fn get_booking(
        &self,
        ticket_id: i64,
        user_id: i64,
    ) -> RepoResult<Option<TicketBooking>> {
        Ok(self
            .state
            .read()
            .await
            .bookings
            .values()
            .find(|b| b.ticket_id == ticket_id && b.author_id == user_id)
            .cloned())
    }

    async fn toggle_booking(
        &self,
        ticket_id: i64,
        user_id: i64,
        quantity: i32,
    ) -> RepoResult<BookingOutcome> {
        let mut state = self.state.write().await;
        let ticket = state
            .tickets
            .get(&ticket_id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("ticket {}", ticket_id)))?;
        let existing = state
            .bookings
            .values()
            .find(|b| b.ticket_id == ticket_id && b.author_id == user_id)
            .cloned();

        match ticket.decide_booking(existing.as_ref(), quantity) {
            BookingDecision::Cancel {
                booking_id,
                quantity,
            } => {
                let booking = state
                    .bookings
                    .remove(&booking_id)
                    .ok_or_else(|| RepoError::NotFound(format!("booking {}", booking_id)))?;
                let stored = state
                    .tickets
                    .get_mut(&ticket_id)
                    .ok_or_else(|| RepoError::NotFound(format!("ticket {}", ticket_id)))?;
                stored.current_booking = (stored.current_booking - quantity).max(0);
                Ok(BookingOutcome::Cancelled {
                    ticket: stored.clone(),
                    booking,
                })
            }
            BookingDecision::Book { quantity, money } => {
                let booking = TicketBooking {
                    id: next(&mut state.seq.booking),
                    author_id: user_id,
                    ticket_id,
                    money,
                    quantity,
                    created_at: Utc::now(),
                };
                state.bookings.insert(booking.id, booking.clone());
                let stored = state
                    .tickets
                    .get_mut(&ticket_id)
                    .ok_or_else(|| RepoError::NotFound(format!("ticket {}", ticket_id)))?;
                stored.current_booking += quantity;
                Ok(BookingOutcome::Booked {
                    ticket: stored.clone(),
                    booking,
                })
            }
            BookingDecision::SoldOut => Ok(BookingOutcome::SoldOut { ticket }),
        }
    }

    async fn list_user_bookings(&self, user_id: i64) -> RepoResult<Vec<BookedTicket>> {
        let state = self.state.read().await;
        let mut booked: Vec<BookedTicket> = state
            .bookings
            .values()
            .filter(|b| b.author_id == user_id)
            .filter_map(|b| {
                state.tickets.get(&b.ticket_id).map(|t| BookedTicket {
                    booking_id: b.id,
                    ticket_id: t.id,
                    event_id: t.event_id,
                    event_date: t.event_date,
                    event_time: t.event_time.clone(),
                    quantity: b.quantity,
                    money: b.money,
                    created_at: b.created_at,
                })
            })
            .collect();
        booked.sort_by(|a, b| {
            (a.event_date, &a.event_time, a.booking_id).cmp(&(b.event_date, &b.event_time, b.booking_id))
        });
        Ok(booked)
    }

    async fn list_stores(&self) -> RepoResult<Vec<Store>> {
        Ok(self.state.read().await.stores.values().cloned().collect())
    }

    async fn get_store(&self, id: i64) -> RepoResult<Store> {
        self.state.read().await.require_store(id).cloned()
    }

    async fn create_store(&self, store: NewStore) -> RepoResult<Store> {
        let mut state = self.state.write().await;
        let row = Store {
            id: next(&mut state.seq.store),
            owner_id: store.owner_id,
            hanbok_store: store.hanbok_store,
            hanbok_address: store.hanbok_address,
            location_x: store.location_x,
            location_y: store.location_y,
            star: store.star,
            created_at: Utc::now(),
        };
        state.stores.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_hanboks(&self, store_id: i64) -> RepoResult<Vec<Hanbok>> {
        let state = self.state.read().await;
        state.require_store(store_id)?;
        Ok(state
            .hanboks
            .values()
            .filter(|h| h.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn create_hanbok(&self, hanbok: NewHanbok) -> RepoResult<Hanbok> {
        let mut state = self.state.write().await;
        state.require_store(hanbok.store_id)?;
        let row = Hanbok {
            id: next(&mut state.seq.hanbok),
            store_id: hanbok.store_id,
            owner_id: hanbok.owner_id,
            hanbok_name: hanbok.hanbok_name,
            hanbok_description: hanbok.hanbok_description,
            hanbok_price: hanbok.hanbok_price,
            hanbok_image: hanbok.hanbok_image,
        };
        state.hanboks.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_store_comments(&self, store_id: i64) -> RepoResult<Vec<StoreComment>> {
        let state = self.state.read().await;
        state.require_store(store_id)?;
        Ok(state
            .comments
            .values()
            .filter(|c| c.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn get_store_comment(&self, id: i64) -> RepoResult<StoreComment> {
        self.state
            .read()
            .await
            .comments
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("comment {}", id)))
    }

    async fn create_store_comment(&self, comment: NewStoreComment) -> RepoResult<StoreComment> {
        let mut state = self.state.write().await;
        state.require_store(comment.store_id)?;
        let now = Utc::now();
        let row = StoreComment {
            id: next(&mut state.seq.comment),
            store_id: comment.store_id,
            author_id: comment.author_id,
            content: comment.content,
            created_at: now,
            updated_at: now,
        };
        state.comments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_store_comment(&self, id: i64, content: String) -> RepoResult<StoreComment> {
        let mut state = self.state.write().await;
        let comment = state
            .comments
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("comment {}", id)))?;
        comment.content = content;
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete_store_comment(&self, id: i64) -> RepoResult<()> {
        match self.state.write().await.comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound(format!("comment {}", id))),
        }
    }

    async fn toggle_store_like(&self, store_id: i64, user_id: i64) -> RepoResult<Toggle> {
        let mut state = self.state.write().await;
        state.require_store(store_id)?;
        Ok(toggle(&mut state.store_likes, (store_id, user_id)))
    }

    async fn toggle_store_bookmark(&self, store_id: i64, user_id: i64) -> RepoResult<Toggle> {
        let mut state = self.state.write().await;
        state.require_store(store_id)?;
        Ok(toggle(&mut state.store_bookmarks, (store_id, user_id)))
    }

    async fn store_engagement(&self, store_id: i64) -> RepoResult<Engagement> {
        let state = self.state.read().await;
        state.require_store(store_id)?;
        Ok(Engagement {
            likes: count_for(&state.store_likes, store_id),
            bookmarks: count_for(&state.store_bookmarks, store_id),
        })
    }

    async fn bookmarked_stores(&self, user_id: i64) -> RepoResult<Vec<Store>> {
        let state = self.state.read().await;
        Ok(state
            .stores
            .values()
            .filter(|s| state.store_bookmarks.contains(&(s.id, user_id)))
            .cloned()
            .collect())
    }

    async fn replace_pending_purchase(
        &self,
        record: NewPurchaseRecord,
    ) -> RepoResult<PurchaseRecord> {
        let mut state = self.state.write().await;
        let replaced = |p: &PurchaseRecord| p.user_id == record.user_id && p.approved_at.is_none();
        if state
            .purchases
            .values()
            .any(|p| p.tid == record.tid && !replaced(p))
        {
            return Err(RepoError::Conflict(format!(
                "purchase '{}' already exists",
                record.tid
            )));
        }
        state.purchases.retain(|_, p| !replaced(p));
        let row = PurchaseRecord {
            id: next(&mut state.seq.purchase),
            user_id: record.user_id,
            tid: record.tid,
            partner_order_id: record.partner_order_id,
            partner_user_id: record.partner_user_id,
            item_name: record.item_name,
            quantity: record.quantity,
            total_amount: record.total_amount,
            vat_amount: record.vat_amount,
            tax_free_amount: record.tax_free_amount,
            rsrvt_date: record.rsrvt_date,
            rsrvt_time: record.rsrvt_time,
            created_at: record.created_at,
            payment_method_type: None,
            aid: None,
            approved_at: None,
        };
        state.purchases.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_purchase(&self, tid: &str) -> RepoResult<PurchaseRecord> {
        self.state
            .read()
            .await
            .purchases
            .values()
            .find(|p| p.tid == tid)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("purchase '{}'", tid)))
    }

    async fn approve_purchase(
        &self,
        tid: &str,
        approval: PurchaseApproval,
    ) -> RepoResult<PurchaseRecord> {
        let mut state = self.state.write().await;
        let record = state
            .purchases
            .values_mut()
            .find(|p| p.tid == tid)
            .ok_or_else(|| RepoError::NotFound(format!("purchase '{}'", tid)))?;
        record
            .approve(approval)
            .map_err(|_| RepoError::Conflict(format!("purchase '{}' is already approved", tid)))?;
        Ok(record.clone())
    }

    async fn health_check(&self) -> RepoResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
