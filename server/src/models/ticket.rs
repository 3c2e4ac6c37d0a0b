use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub ticket_no: i64,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub valid_upto: DateTime<Utc>,
}

impl Ticket {
    /// A ticket stops being usable at `valid_upto` itself.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.valid_upto
    }
}

/// A ticket as listed to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct TicketStatus {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ticket: Ticket,
    pub redeemed: bool,
}
