use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::error::AppError;

pub const CATEGORY_NAME_MAX_LEN: usize = 20;
pub const EVENT_TITLE_MAX_LEN: usize = 50;
pub const REVIEW_CONTENT_MAX_LEN: usize = 50;
pub const LISTING_TITLE_MAX_LEN: usize = 50;
pub const LISTING_IMAGE_MAX_LEN: usize = 500;
pub const CATEGORY_DESCRIPTION_MAX_LEN: usize = 200;
/// Upper bound on the number of days a single ticket generation run may span.
pub const MAX_GENERATED_DAYS: u64 = 366;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub author_id: i64,
    pub category_id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub time_slots: Vec<String>,
    pub max_booking: Option<i32>,
    pub money: Option<i32>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub author_id: i64,
    pub category_id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub time_slots: Vec<String>,
    pub max_booking: Option<i32>,
    pub money: Option<i32>,
    pub tags: Vec<String>,
}

/// Partial update of an event. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPatch {
    pub category_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub image: Option<String>,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub time_slots: Option<Vec<String>>,
    pub max_booking: Option<i32>,
    pub money: Option<i32>,
    pub tags: Option<Vec<String>>,
}

/// Summary row used by the event list.
#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub id: i64,
    pub title: String,
    pub event_start_date: Option<DateTime<Utc>>,
    pub event_end_date: Option<DateTime<Utc>>,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id,
            title: event.title.clone(),
            event_start_date: event.event_start_date,
            event_end_date: event.event_end_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventReview {
    pub id: i64,
    pub author_id: i64,
    pub event_id: i64,
    pub content: String,
    pub review_image: Option<String>,
    pub grade: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEventReview {
    pub author_id: i64,
    pub event_id: i64,
    pub content: String,
    pub review_image: Option<String>,
    pub grade: i32,
}

#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub content: String,
    pub review_image: Option<String>,
    pub grade: i32,
}

/// Externally curated event announcement.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventListing {
    pub id: i64,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEventListing {
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub image: Option<String>,
}

/// A daily performance window such as `10:00-11:30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl FromStr for TimeSlot {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            AppError::ValidationError(format!(
                "time slot '{}' must look like HH:MM-HH:MM",
                value
            ))
        };
        let (start, end) = value.trim().split_once('-').ok_or_else(invalid)?;
        let start = NaiveTime::parse_from_str(start.trim(), "%H:%M").map_err(|_| invalid())?;
        let end = NaiveTime::parse_from_str(end.trim(), "%H:%M").map_err(|_| invalid())?;
        if end <= start {
            return Err(AppError::ValidationError(format!(
                "time slot '{}' must end after it starts",
                value
            )));
        }
        Ok(Self { start, end })
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Parses and canonicalizes a list of time slots, rejecting duplicates.
pub fn normalize_time_slots(raw: &[String]) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let mut slots = Vec::with_capacity(raw.len());
    for value in raw {
        let slot: TimeSlot = value.parse()?;
        if !seen.insert(slot) {
            return Err(AppError::ValidationError(format!(
                "time slot '{}' is listed twice",
                slot
            )));
        }
        slots.push(slot.to_string());
    }
    Ok(slots)
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

fn validate_category_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() || name.chars().count() > CATEGORY_NAME_MAX_LEN {
        return Err(AppError::ValidationError(format!(
            "category name must be 1 to {} characters",
            CATEGORY_NAME_MAX_LEN
        )));
    }
    Ok(())
}

impl NewCategory {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_category_name(&self.name)?;
        if let Some(description) = &self.description {
            if description.chars().count() > CATEGORY_DESCRIPTION_MAX_LEN {
                return Err(AppError::ValidationError(format!(
                    "category description must be at most {} characters",
                    CATEGORY_DESCRIPTION_MAX_LEN
                )));
            }
        }
        Ok(())
    }
}

pub fn validate_grade(grade: i32) -> Result<(), AppError> {
    if !(1..=5).contains(&grade) {
        return Err(AppError::ValidationError(
            "grade must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_review_content(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() || content.chars().count() > REVIEW_CONTENT_MAX_LEN {
        return Err(AppError::ValidationError(format!(
            "review content must be 1 to {} characters",
            REVIEW_CONTENT_MAX_LEN
        )));
    }
    Ok(())
}

pub fn validate_listing(listing: &NewEventListing) -> Result<(), AppError> {
    if listing.title.trim().is_empty() || listing.title.chars().count() > LISTING_TITLE_MAX_LEN {
        return Err(AppError::ValidationError(format!(
            "listing title must be 1 to {} characters",
            LISTING_TITLE_MAX_LEN
        )));
    }
    if let Some(image) = &listing.image {
        if image.chars().count() > LISTING_IMAGE_MAX_LEN {
            return Err(AppError::ValidationError(format!(
                "listing image must be at most {} characters",
                LISTING_IMAGE_MAX_LEN
            )));
        }
    }
    if let (Some(start), Some(end)) = (listing.start_date, listing.end_date) {
        if end < start {
            return Err(AppError::ValidationError(format!(
                "listing '{}' ends before it starts",
                listing.title
            )));
        }
    }
    Ok(())
}

struct EventFields<'a> {
    title: &'a str,
    content: &'a str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    max_booking: Option<i32>,
    money: Option<i32>,
}

fn validate_fields(fields: EventFields<'_>) -> Result<(), AppError> {
    if fields.title.trim().is_empty() || fields.title.chars().count() > EVENT_TITLE_MAX_LEN {
        return Err(AppError::ValidationError(format!(
            "title must be 1 to {} characters",
            EVENT_TITLE_MAX_LEN
        )));
    }
    if fields.content.trim().is_empty() {
        return Err(AppError::ValidationError(
            "content is required".to_string(),
        ));
    }
    if let (Some(start), Some(end)) = (fields.start, fields.end) {
        if end <= start {
            return Err(AppError::ValidationError(
                "event_end_date must be greater than event_start_date".to_string(),
            ));
        }
    }
    if matches!(fields.max_booking, Some(max) if max < 1) {
        return Err(AppError::ValidationError(
            "max_booking must be at least 1".to_string(),
        ));
    }
    if matches!(fields.money, Some(money) if money < 0) {
        return Err(AppError::ValidationError(
            "money must not be negative".to_string(),
        ));
    }
    Ok(())
}

impl NewEvent {
    /// Validates the event and canonicalizes its time slots and tags.
    pub fn normalize(mut self) -> Result<Self, AppError> {
        validate_fields(EventFields {
            title: &self.title,
            content: &self.content,
            start: self.event_start_date,
            end: self.event_end_date,
            max_booking: self.max_booking,
            money: self.money,
        })?;
        self.time_slots = normalize_time_slots(&self.time_slots)?;
        self.tags = normalize_tags(&self.tags);
        Ok(self)
    }
}

impl Event {
    /// Merges `patch` into the event and re-validates the merged result.
    pub fn apply(&mut self, patch: EventPatch) -> Result<(), AppError> {
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(image) = patch.image {
            self.image = Some(image);
        }
        if let Some(start) = patch.event_start_date {
            self.event_start_date = Some(start);
        }
        if let Some(end) = patch.event_end_date {
            self.event_end_date = Some(end);
        }
        if let Some(slots) = patch.time_slots {
            self.time_slots = normalize_time_slots(&slots)?;
        }
        if let Some(max_booking) = patch.max_booking {
            self.max_booking = Some(max_booking);
        }
        if let Some(money) = patch.money {
            self.money = Some(money);
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(&tags);
        }

        validate_fields(EventFields {
            title: &self.title,
            content: &self.content,
            start: self.event_start_date,
            end: self.event_end_date,
            max_booking: self.max_booking,
            money: self.money,
        })
    }

    /// Whether `date` falls inside the event's date range. Open-ended bounds accept.
    pub fn covers_date(&self, date: NaiveDate) -> bool {
        let after_start = self
            .event_start_date
            .map_or(true, |start| start.date_naive() <= date);
        let before_end = self
            .event_end_date
            .map_or(true, |end| date <= end.date_naive());
        after_start && before_end
    }

    /// Whether tickets may be opened at `time`. Events without declared slots accept any time.
    pub fn offers_slot(&self, time: &str) -> bool {
        if self.time_slots.is_empty() {
            return true;
        }
        match time.parse::<TimeSlot>() {
            Ok(slot) => {
                let canonical = slot.to_string();
                self.time_slots.iter().any(|s| *s == canonical)
            }
            Err(_) => false,
        }
    }

    /// Every (date, slot) pair between the start and end dates, inclusive.
    pub fn ticket_slots(&self) -> Result<Vec<(NaiveDate, String)>, AppError> {
        let (Some(start), Some(end)) = (self.event_start_date, self.event_end_date) else {
            return Err(AppError::ValidationError(
                "event needs event_start_date and event_end_date to generate tickets".to_string(),
            ));
        };
        if self.time_slots.is_empty() {
            return Err(AppError::ValidationError(
                "event has no time slots to generate tickets from".to_string(),
            ));
        }

        let first = start.date_naive();
        let last = end.date_naive();
        let span = (last - first).num_days();
        if span < 0 || span as u64 >= MAX_GENERATED_DAYS {
            return Err(AppError::ValidationError(format!(
                "ticket generation spans at most {} days",
                MAX_GENERATED_DAYS
            )));
        }

        let mut slots = Vec::new();
        let mut day = first;
        while day <= last {
            for slot in &self.time_slots {
                slots.push((day, slot.clone()));
            }
            day = match day.checked_add_days(Days::new(1)) {
                Some(next) => next,
                None => break,
            };
        }
        Ok(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(start: (i32, u32, u32), end: (i32, u32, u32), slots: &[&str]) -> Event {
        let now = Utc::now();
        Event {
            id: 1,
            author_id: 1,
            category_id: 1,
            title: "경복궁 야간개장".into(),
            content: "night opening".into(),
            image: None,
            event_start_date: Some(Utc.with_ymd_and_hms(start.0, start.1, start.2, 9, 0, 0).unwrap()),
            event_end_date: Some(Utc.with_ymd_and_hms(end.0, end.1, end.2, 21, 0, 0).unwrap()),
            time_slots: slots.iter().map(|s| s.to_string()).collect(),
            max_booking: Some(10),
            money: Some(3000),
            tags: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_time_slot_parse_and_display() {
        let slot: TimeSlot = " 09:00 - 10:30".parse().unwrap();
        assert_eq!(slot.to_string(), "09:00-10:30");
        assert!("10:00".parse::<TimeSlot>().is_err());
        assert!("11:00-10:00".parse::<TimeSlot>().is_err());
        assert!("25:00-26:00".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn test_normalize_time_slots_rejects_duplicates() {
        let raw = vec!["10:00-11:00".to_string(), "10:00 - 11:00".to_string()];
        assert!(normalize_time_slots(&raw).is_err());

        let raw = vec!["10:00-11:00".to_string(), "14:00-15:30".to_string()];
        assert_eq!(
            normalize_time_slots(&raw).unwrap(),
            vec!["10:00-11:00", "14:00-15:30"]
        );
    }

    #[test]
    fn test_apply_rejects_end_before_start() {
        let mut ev = event((2026, 6, 1), (2026, 6, 3), &[]);
        let patch = EventPatch {
            event_end_date: Some(Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap()),
            ..EventPatch::default()
        };
        assert!(ev.apply(patch).is_err());
    }

    #[test]
    fn test_apply_merges_partial_fields() {
        let mut ev = event((2026, 6, 1), (2026, 6, 3), &[]);
        let patch = EventPatch {
            title: Some("창덕궁 달빛기행".into()),
            tags: Some(vec![" 궁 ".into(), "궁".into(), "".into()]),
            ..EventPatch::default()
        };
        ev.apply(patch).unwrap();
        assert_eq!(ev.title, "창덕궁 달빛기행");
        assert_eq!(ev.tags, vec!["궁"]);
        assert_eq!(ev.money, Some(3000));
    }

    #[test]
    fn test_covers_date_and_offers_slot() {
        let ev = event((2026, 6, 1), (2026, 6, 3), &["10:00-11:00"]);
        assert!(ev.covers_date(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()));
        assert!(ev.covers_date(NaiveDate::from_ymd_opt(2026, 6, 3).unwrap()));
        assert!(!ev.covers_date(NaiveDate::from_ymd_opt(2026, 6, 4).unwrap()));
        assert!(ev.offers_slot("10:00 - 11:00"));
        assert!(!ev.offers_slot("12:00-13:00"));
    }

    #[test]
    fn test_ticket_slots_cross_product() {
        let ev = event((2026, 6, 1), (2026, 6, 3), &["10:00-11:00", "14:00-15:00"]);
        let slots = ev.ticket_slots().unwrap();
        assert_eq!(slots.len(), 6);
        assert_eq!(slots[0].0, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap());
        assert_eq!(slots[5].1, "14:00-15:00");
    }

    #[test]
    fn test_ticket_slots_requires_slots_and_bounded_span() {
        let ev = event((2026, 6, 1), (2026, 6, 3), &[]);
        assert!(ev.ticket_slots().is_err());

        let ev = event((2026, 1, 1), (2027, 6, 1), &["10:00-11:00"]);
        assert!(ev.ticket_slots().is_err());
    }
}
