//! In-process store with the same constraint semantics as the Postgres
//! schema. Every mutation happens under a single lock so the uniqueness checks
//! and the write are atomic.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RaffleStore, StoreError, UniqueConstraint};
use crate::models::{
    Applicant, Entry, NewRaffle, Raffle, RaffleRecord, RaffleResult, Ticket, TicketStatus, User,
    Winner,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    tickets: Vec<Ticket>,
    raffles: Vec<Raffle>,
    entries: Vec<Entry>,
    results: Vec<RaffleResult>,
}

impl Tables {
    fn user(&self, user_id: Uuid) -> Option<&User> {
        self.users.iter().find(|user| user.id == user_id)
    }

    fn is_redeemed(&self, ticket_no: i64) -> bool {
        self.entries.iter().any(|entry| entry.ticket_no == ticket_no)
    }

    fn record(&self, raffle: &Raffle) -> RaffleRecord {
        let winner = self
            .results
            .iter()
            .find(|result| result.raffle_id == raffle.id)
            .and_then(|result| {
                self.user(result.user_id).map(|user| Winner {
                    name: user.name.clone(),
                    ticket_no: result.ticket_no,
                    email: Some(user.email.clone()),
                })
            });

        RaffleRecord {
            raffle: raffle.clone(),
            winner,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Registers a user with a fresh auth token.
    pub fn add_user(&self, name: &str, email: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            auth_token: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        self.lock().users.push(user.clone());
        user
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.lock().entries.clone()
    }

    pub fn results(&self) -> Vec<RaffleResult> {
        self.lock().results.clone()
    }

    /// Drops every result row, so the same entrant set can be resolved again.
    pub fn clear_results(&self) {
        self.lock().results.clear();
    }
}

#[async_trait]
impl RaffleStore for MemoryStore {
    async fn user_by_token(&self, token: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|user| user.auth_token == token)
            .cloned())
    }

    async fn insert_ticket(
        &self,
        user_id: Uuid,
        issued_at: DateTime<Utc>,
        valid_upto: DateTime<Utc>,
    ) -> Result<Ticket, StoreError> {
        let mut tables = self.lock();
        let ticket = Ticket {
            ticket_no: tables.tickets.len() as i64 + 1,
            user_id,
            issued_at,
            valid_upto,
        };
        tables.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn tickets_for_user(&self, user_id: Uuid) -> Result<Vec<TicketStatus>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .tickets
            .iter()
            .filter(|ticket| ticket.user_id == user_id)
            .map(|ticket| TicketStatus {
                ticket: ticket.clone(),
                redeemed: tables.is_redeemed(ticket.ticket_no),
            })
            .collect())
    }

    async fn next_redeemable_ticket(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Ticket>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .tickets
            .iter()
            .filter(|ticket| ticket.user_id == user_id)
            .filter(|ticket| !ticket.is_expired(now))
            .filter(|ticket| !tables.is_redeemed(ticket.ticket_no))
            .min_by_key(|ticket| (ticket.issued_at, ticket.ticket_no))
            .cloned())
    }

    async fn insert_raffle(&self, raffle: &NewRaffle) -> Result<i64, StoreError> {
        let mut tables = self.lock();
        let id = tables.raffles.len() as i64 + 1;
        tables.raffles.push(Raffle {
            id,
            title: raffle.title.clone(),
            description: raffle.description.clone(),
            prize: raffle.prize.clone(),
            prize_picture_url: raffle.prize_picture_url.clone(),
            start_time: raffle.start_time,
            closing_time: raffle.closing_time,
        });
        Ok(id)
    }

    async fn raffle(&self, raffle_id: i64) -> Result<Option<RaffleRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .raffles
            .iter()
            .find(|raffle| raffle.id == raffle_id)
            .map(|raffle| tables.record(raffle)))
    }

    async fn upcoming_raffles(
        &self,
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<Raffle>, StoreError> {
        let mut raffles: Vec<Raffle> = self
            .lock()
            .raffles
            .iter()
            .filter(|raffle| raffle.start_time > now)
            .cloned()
            .collect();
        raffles.sort_by_key(|raffle| (raffle.start_time, raffle.id));
        if let Some(limit) = limit {
            raffles.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(raffles)
    }

    async fn ongoing_raffles(&self, now: DateTime<Utc>) -> Result<Vec<Raffle>, StoreError> {
        let mut raffles: Vec<Raffle> = self
            .lock()
            .raffles
            .iter()
            .filter(|raffle| raffle.is_open(now))
            .cloned()
            .collect();
        raffles.sort_by_key(|raffle| (raffle.closing_time, raffle.id));
        Ok(raffles)
    }

    async fn past_raffles(
        &self,
        now: DateTime<Utc>,
        closed_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<RaffleRecord>, StoreError> {
        let tables = self.lock();
        let mut records: Vec<RaffleRecord> = tables
            .raffles
            .iter()
            .filter(|raffle| raffle.closing_time <= now)
            .filter(|raffle| closed_after.map_or(true, |after| raffle.closing_time > after))
            .map(|raffle| tables.record(raffle))
            .collect();
        records.sort_by_key(|record| {
            std::cmp::Reverse((record.raffle.closing_time, record.raffle.id))
        });
        Ok(records)
    }

    async fn applicants(
        &self,
        raffle_id: i64,
        user_id: Option<Uuid>,
    ) -> Result<Vec<Applicant>, StoreError> {
        let tables = self.lock();
        let mut applicants: Vec<Applicant> = tables
            .entries
            .iter()
            .filter(|entry| entry.raffle_id == raffle_id)
            .filter(|entry| user_id.map_or(true, |id| entry.user_id == id))
            .filter_map(|entry| {
                tables.user(entry.user_id).map(|user| Applicant {
                    name: user.name.clone(),
                    email: user.email.clone(),
                    ticket_no: entry.ticket_no,
                    user_id: entry.user_id,
                })
            })
            .collect();
        applicants.sort_by_key(|applicant| applicant.ticket_no);
        Ok(applicants)
    }

    async fn insert_entry(&self, entry: &Entry, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let accepting = tables
            .raffles
            .iter()
            .any(|raffle| raffle.id == entry.raffle_id && raffle.is_open(now));
        if !accepting {
            return Err(StoreError::EntriesClosed(entry.raffle_id));
        }
        if tables
            .entries
            .iter()
            .any(|e| e.raffle_id == entry.raffle_id && e.user_id == entry.user_id)
        {
            return Err(StoreError::Duplicate(UniqueConstraint::EntryPerUser));
        }
        if tables.is_redeemed(entry.ticket_no) {
            return Err(StoreError::Duplicate(UniqueConstraint::EntryTicket));
        }
        tables.entries.push(entry.clone());
        Ok(())
    }

    async fn unresolved_raffles_closed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<i64>, StoreError> {
        let tables = self.lock();
        let mut due: Vec<&Raffle> = tables
            .raffles
            .iter()
            .filter(|raffle| raffle.closing_time > from && raffle.closing_time < to)
            .filter(|raffle| !tables.results.iter().any(|r| r.raffle_id == raffle.id))
            .collect();
        due.sort_by_key(|raffle| (raffle.closing_time, raffle.id));
        Ok(due.into_iter().map(|raffle| raffle.id).collect())
    }

    async fn insert_result(&self, result: &RaffleResult) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        if tables.results.iter().any(|r| r.raffle_id == result.raffle_id) {
            return Ok(false);
        }
        let entered = tables.entries.iter().any(|entry| {
            entry.raffle_id == result.raffle_id
                && entry.ticket_no == result.ticket_no
                && entry.user_id == result.user_id
        });
        if !entered {
            return Err(StoreError::UnknownEntry(result.raffle_id));
        }
        tables.results.push(result.clone());
        Ok(true)
    }
}
