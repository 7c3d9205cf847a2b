use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, SecurityHeadersLayer};
use crate::handlers::{events, health_check, payments, reviews, stores, tickets, users};
use crate::state::AppState;

/// Layer settings that come from configuration rather than from the routes.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub cors_allowed_origins: Option<String>,
    pub include_hsts: bool,
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(users::signup))
        .route("/token", post(users::login))
        .route("/token/refresh", post(users::refresh))
        .route("/logout", post(users::logout))
        .route("/me", get(users::me))
        .route("/me/modify", put(users::modify_profile))
        .route("/me/bookings", get(tickets::my_bookings))
        .route("/me/:user_id/password", put(users::change_password))
        .route("/:user_id/roles", put(users::set_roles))
}

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events).post(events::create_event))
        .route(
            "/categories",
            get(events::list_categories).post(events::create_category),
        )
        .route(
            "/listings",
            get(events::list_listings).post(events::import_listings),
        )
        .route(
            "/:event_id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route(
            "/:event_id/review",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route("/:event_id/like", post(events::toggle_like))
        .route("/:event_id/bookmark", post(events::toggle_bookmark))
        .route(
            "/:event_id/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route("/:event_id/tickets/generate", post(tickets::generate_tickets))
}

fn review_routes() -> Router<AppState> {
    Router::new().route(
        "/:review_id",
        put(reviews::update_review).delete(reviews::delete_review),
    )
}

fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:ticket_id",
            get(tickets::get_ticket).delete(tickets::delete_ticket),
        )
        .route(
            "/:ticket_id/booking",
            get(tickets::booking_status).post(tickets::toggle_booking),
        )
}

fn store_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(stores::list_stores).post(stores::create_store))
        .route(
            "/payment/:key",
            get(payments::get_purchase)
                .post(payments::create_purchase)
                .put(payments::approve_purchase),
        )
        .route("/:store_id", get(stores::store_detail))
        .route(
            "/:store_id/hanboks",
            get(stores::list_hanboks).post(stores::create_hanbok),
        )
        .route(
            "/:store_id/comments",
            get(stores::list_comments).post(stores::create_comment),
        )
        .route("/:store_id/like", post(stores::toggle_like))
        .route("/:store_id/bookmark", post(stores::toggle_bookmark))
}

fn comment_routes() -> Router<AppState> {
    Router::new().route(
        "/:comment_id",
        put(stores::update_comment).delete(stores::delete_comment),
    )
}

pub fn create_routes(state: AppState, options: RouterOptions) -> Router {
    let api = Router::new()
        .nest("/users", user_routes())
        .nest("/events", event_routes())
        .nest("/reviews", review_routes())
        .nest("/tickets", ticket_routes())
        .nest("/stores", store_routes())
        .nest("/comments", comment_routes());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(SecurityHeadersLayer::new(options.include_hsts))
        .layer(create_cors_layer(options.cors_allowed_origins.as_deref()))
}
