use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: i64,
    pub author_id: i64,
    pub event_id: i64,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub max_booking_count: i32,
    pub current_booking: i32,
    pub money: i32,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub author_id: i64,
    pub event_id: i64,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub max_booking_count: i32,
    pub money: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketBooking {
    pub id: i64,
    pub author_id: i64,
    pub ticket_id: i64,
    pub money: i32,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// A booking joined with the slot it reserves.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookedTicket {
    pub booking_id: i64,
    pub ticket_id: i64,
    pub event_id: i64,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub quantity: i32,
    pub money: i32,
    pub created_at: DateTime<Utc>,
}

/// What a booking toggle request resolves to for a given ticket state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingDecision {
    Cancel { booking_id: i64, quantity: i32 },
    Book { quantity: i32, money: i32 },
    SoldOut,
}

#[derive(Debug, Clone)]
pub enum BookingOutcome {
    Booked {
        ticket: Ticket,
        booking: TicketBooking,
    },
    Cancelled {
        ticket: Ticket,
        booking: TicketBooking,
    },
    SoldOut {
        ticket: Ticket,
    },
}

impl Ticket {
    pub fn remaining(&self) -> i32 {
        (self.max_booking_count - self.current_booking).max(0)
    }

    pub fn can_book(&self, quantity: i32) -> bool {
        quantity >= 1
            && i64::from(self.current_booking) + i64::from(quantity)
                <= i64::from(self.max_booking_count)
    }

    /// Cancels the caller's existing booking, or books `quantity` seats when they fit.
    pub fn decide_booking(
        &self,
        existing: Option<&TicketBooking>,
        quantity: i32,
    ) -> BookingDecision {
        if let Some(booking) = existing {
            return BookingDecision::Cancel {
                booking_id: booking.id,
                quantity: booking.quantity,
            };
        }
        if self.can_book(quantity) {
            BookingDecision::Book {
                quantity,
                money: self.money.saturating_mul(quantity),
            }
        } else {
            BookingDecision::SoldOut
        }
    }
}

pub fn validate_quantity(quantity: i32) -> Result<(), AppError> {
    if quantity < 1 {
        return Err(AppError::ValidationError(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_new_ticket(ticket: &NewTicket) -> Result<(), AppError> {
    if ticket.max_booking_count < 1 {
        return Err(AppError::ValidationError(
            "max_booking_count must be at least 1".to_string(),
        ));
    }
    if ticket.money < 0 {
        return Err(AppError::ValidationError(
            "money must not be negative".to_string(),
        ));
    }
    Ok(())
}
