//! Persistence seam for the lucky draw.
//!
//! Every invariant that must hold across concurrent requests (one entry per
//! user per raffle, one entry per ticket, one result per raffle) is enforced
//! by the store itself. Callers never take in-process locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Applicant, Entry, NewRaffle, Raffle, RaffleRecord, RaffleResult, Ticket, TicketStatus, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Uniqueness constraints the lucky draw relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueConstraint {
    /// `(raffle_id, user_id)` on entries.
    EntryPerUser,
    /// `ticket_no` on entries.
    EntryTicket,
}

impl UniqueConstraint {
    pub fn name(&self) -> &'static str {
        match self {
            UniqueConstraint::EntryPerUser => "entries_raffle_user_key",
            UniqueConstraint::EntryTicket => "entries_ticket_no_key",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "entries_raffle_user_key" => Some(UniqueConstraint::EntryPerUser),
            "entries_ticket_no_key" => Some(UniqueConstraint::EntryTicket),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {}", .0.name())]
    Duplicate(UniqueConstraint),

    #[error("Raffle {0} is not accepting entries")]
    EntriesClosed(i64),

    /// The result does not name an entry of that raffle.
    #[error("Result for raffle {0} does not match any entry")]
    UnknownEntry(i64),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait RaffleStore: Send + Sync {
    async fn user_by_token(&self, token: Uuid) -> Result<Option<User>, StoreError>;

    async fn insert_ticket(
        &self,
        user_id: Uuid,
        issued_at: DateTime<Utc>,
        valid_upto: DateTime<Utc>,
    ) -> Result<Ticket, StoreError>;

    /// All tickets of a user in issuance order.
    async fn tickets_for_user(&self, user_id: Uuid) -> Result<Vec<TicketStatus>, StoreError>;

    /// Oldest ticket of the user that backs no entry and has not expired at `now`.
    async fn next_redeemable_ticket(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Ticket>, StoreError>;

    async fn insert_raffle(&self, raffle: &NewRaffle) -> Result<i64, StoreError>;

    async fn raffle(&self, raffle_id: i64) -> Result<Option<RaffleRecord>, StoreError>;

    /// Raffles with `start_time > now`, earliest first.
    async fn upcoming_raffles(
        &self,
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<Raffle>, StoreError>;

    /// Raffles with `start_time <= now < closing_time`.
    async fn ongoing_raffles(&self, now: DateTime<Utc>) -> Result<Vec<Raffle>, StoreError>;

    /// Raffles with `closed_after < closing_time <= now`, most recently closed first.
    async fn past_raffles(
        &self,
        now: DateTime<Utc>,
        closed_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<RaffleRecord>, StoreError>;

    async fn applicants(
        &self,
        raffle_id: i64,
        user_id: Option<Uuid>,
    ) -> Result<Vec<Applicant>, StoreError>;

    /// Inserts only while `start_time <= now < closing_time` holds for the
    /// raffle, otherwise fails with [`StoreError::EntriesClosed`]. Fails with
    /// [`StoreError::Duplicate`] when the user already entered the raffle or
    /// the ticket already backs an entry.
    async fn insert_entry(&self, entry: &Entry, now: DateTime<Utc>) -> Result<(), StoreError>;

    /// Ids of raffles closed strictly inside `(from, to)` that have no result.
    async fn unresolved_raffles_closed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<i64>, StoreError>;

    /// Insert-if-absent. Returns `false` when a result already exists for the
    /// raffle, in which case nothing is written. The winning
    /// `(raffle_id, ticket_no, user_id)` must be an entry of that raffle.
    async fn insert_result(&self, result: &RaffleResult) -> Result<bool, StoreError>;
}
