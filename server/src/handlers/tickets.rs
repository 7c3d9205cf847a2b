use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::{require_admin, AuthUser};
use crate::db::RepoError;
use crate::models::event::{Event, TimeSlot};
use crate::models::ticket::{
    validate_new_ticket, validate_quantity, BookingOutcome, NewTicket, Ticket, TicketBooking,
};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{AppJson, AppPath};
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub event_date: NaiveDate,
    pub event_time: String,
    pub max_booking_count: Option<i32>,
    pub money: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Serialize)]
pub struct GeneratedTickets {
    pub created: usize,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Serialize)]
pub struct BookingStatus {
    pub ticket: Ticket,
    pub remaining: i32,
    pub booking: Option<TicketBooking>,
}

#[derive(Debug, Serialize)]
pub struct BookingResult {
    pub status: &'static str,
    pub ticket: Ticket,
    pub booking: TicketBooking,
}

fn event_defaults(event: &Event) -> Result<(i32, i32), AppError> {
    match (event.max_booking, event.money) {
        (Some(max_booking), Some(money)) => Ok((max_booking, money)),
        _ => Err(AppError::ValidationError(format!(
            "event {} needs max_booking and money to generate tickets",
            event.id
        ))),
    }
}

pub async fn list_tickets(
    State(state): State<AppState>,
    AppPath(event_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let tickets = state.repo.list_tickets(event_id).await?;
    Ok(success(tickets, "Tickets retrieved"))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(event_id): AppPath<i64>,
    AppJson(payload): AppJson<CreateTicketRequest>,
) -> Result<Response, AppError> {
    require_admin(&user)?;

    let event = match state.repo.get_event(event_id).await {
        Ok(event) => event,
        Err(RepoError::NotFound(_)) => {
            return Err(AppError::ValidationError(format!(
                "event {} does not exist",
                event_id
            )))
        }
        Err(e) => return Err(e.into()),
    };

    if !event.covers_date(payload.event_date) {
        return Err(AppError::ValidationError(format!(
            "{} is outside the event's dates",
            payload.event_date
        )));
    }
    let event_time = payload.event_time.parse::<TimeSlot>()?.to_string();
    if !event.offers_slot(&event_time) {
        return Err(AppError::ValidationError(format!(
            "{} is not one of the event's time slots",
            event_time
        )));
    }

    let max_booking_count = payload
        .max_booking_count
        .or(event.max_booking)
        .ok_or_else(|| AppError::ValidationError("max_booking_count is required".to_string()))?;
    let money = payload
        .money
        .or(event.money)
        .ok_or_else(|| AppError::ValidationError("money is required".to_string()))?;

    let new_ticket = NewTicket {
        author_id: user.id,
        event_id,
        event_date: payload.event_date,
        event_time,
        max_booking_count,
        money,
    };
    validate_new_ticket(&new_ticket)?;

    let ticket = state.repo.create_ticket(new_ticket).await?;
    tracing::info!(ticket_id = ticket.id, event_id, "Ticket created");
    Ok(created(ticket, "Ticket created"))
}

/// Opens one ticket per day and time slot of the event, skipping slots that already have one.
pub async fn generate_tickets(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(event_id): AppPath<i64>,
) -> Result<Response, AppError> {
    require_admin(&user)?;

    let event = state.repo.get_event(event_id).await?;
    let (max_booking_count, money) = event_defaults(&event)?;
    let slots = event.ticket_slots()?;

    let tickets = slots
        .into_iter()
        .map(|(event_date, event_time)| NewTicket {
            author_id: user.id,
            event_id,
            event_date,
            event_time,
            max_booking_count,
            money,
        })
        .collect();

    let tickets = state.repo.create_missing_tickets(tickets).await?;
    tracing::info!(event_id, created = tickets.len(), "Generated tickets");
    Ok(created(
        GeneratedTickets {
            created: tickets.len(),
            tickets,
        },
        "Tickets generated",
    ))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    AppPath(ticket_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let ticket = state.repo.get_ticket(ticket_id).await?;
    Ok(success(ticket, "Ticket retrieved"))
}

pub async fn delete_ticket(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(ticket_id): AppPath<i64>,
) -> Result<Response, AppError> {
    require_admin(&user)?;
    state.repo.delete_ticket(ticket_id).await?;
    tracing::info!(ticket_id, admin_id = user.id, "Ticket deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn booking_status(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(ticket_id): AppPath<i64>,
) -> Result<Response, AppError> {
    let ticket = state.repo.get_ticket(ticket_id).await?;
    let booking = state.repo.get_booking(ticket_id, user.id).await?;
    Ok(success(
        BookingStatus {
            remaining: ticket.remaining(),
            ticket,
            booking,
        },
        "Booking status retrieved",
    ))
}

/// Books `quantity` seats, or cancels the caller's booking when one exists.
pub async fn toggle_booking(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppPath(ticket_id): AppPath<i64>,
    AppJson(payload): AppJson<BookingRequest>,
) -> Result<Response, AppError> {
    validate_quantity(payload.quantity)?;

    match state
        .repo
        .toggle_booking(ticket_id, user.id, payload.quantity)
        .await?
    {
        BookingOutcome::Booked { ticket, booking } => {
            tracing::info!(
                ticket_id,
                user_id = user.id,
                quantity = booking.quantity,
                current_booking = ticket.current_booking,
                "Ticket booked"
            );
            Ok(created(
                BookingResult {
                    status: "booked",
                    ticket,
                    booking,
                },
                "Booking complete",
            ))
        }
        BookingOutcome::Cancelled { ticket, booking } => {
            tracing::info!(
                ticket_id,
                user_id = user.id,
                quantity = booking.quantity,
                current_booking = ticket.current_booking,
                "Booking cancelled"
            );
            Ok(success(
                BookingResult {
                    status: "cancelled",
                    ticket,
                    booking,
                },
                "Booking cancelled",
            ))
        }
        BookingOutcome::SoldOut { ticket } => Err(AppError::SoldOut(format!(
            "only {} seat(s) left for ticket {}",
            ticket.remaining(),
            ticket.id
        ))),
    }
}

pub async fn my_bookings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response, AppError> {
    let bookings = state.repo.list_user_bookings(user.id).await?;
    Ok(success(bookings, "Bookings retrieved"))
}
