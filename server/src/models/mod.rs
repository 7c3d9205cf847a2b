use serde::Serialize;

pub mod event;
pub mod purchase;
pub mod store;
pub mod ticket;
pub mod user;

/// Result of flipping a user's membership in a like or bookmark set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Engagement {
    pub likes: i64,
    pub bookmarks: i64,
}
