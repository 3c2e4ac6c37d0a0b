//! The lucky draw core: ticket ledger, raffle registry, entry ledger and
//! result engine, plus [`LuckyDraw`] which wires them together behind the
//! operations the HTTP layer and the sweep binary call.

use std::sync::Arc;

use mockable::Clock;
use uuid::Uuid;

use crate::config::LuckyDrawSettings;
use crate::models::{
    Applicant, CreateRaffleRequest, Entry, Raffle, RaffleView, Ticket, TicketStatus, User,
};
use crate::store::RaffleStore;
use crate::utils::error::AppError;

pub mod entries;
pub mod raffles;
pub mod results;
pub mod tickets;

#[cfg(test)]
pub(crate) mod test_support;

pub use entries::EntryLedger;
pub use raffles::RaffleRegistry;
pub use results::{ResolveOutcome, ResultEngine, SweepReport};
pub use tickets::TicketLedger;

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

#[derive(Clone)]
pub struct LuckyDraw {
    tickets: TicketLedger,
    raffles: RaffleRegistry,
    entries: EntryLedger,
    results: ResultEngine,
    clock: SharedClock,
    settings: Arc<LuckyDrawSettings>,
}

impl LuckyDraw {
    pub fn new(
        store: Arc<dyn RaffleStore>,
        clock: SharedClock,
        settings: LuckyDrawSettings,
    ) -> Self {
        let tickets = TicketLedger::new(store.clone(), clock.clone(), settings.ticket_validity);
        let raffles = RaffleRegistry::new(store.clone(), clock.clone());
        let entries = EntryLedger::new(store.clone());
        let results = ResultEngine::new(
            store,
            entries.clone(),
            clock.clone(),
            settings.resolution_window,
        );

        Self {
            tickets,
            raffles,
            entries,
            results,
            clock,
            settings: Arc::new(settings),
        }
    }

    pub fn tickets(&self) -> &TicketLedger {
        &self.tickets
    }

    pub fn raffles(&self) -> &RaffleRegistry {
        &self.raffles
    }

    pub fn entries(&self) -> &EntryLedger {
        &self.entries
    }

    pub fn results(&self) -> &ResultEngine {
        &self.results
    }

    pub fn is_admin(&self, user: &User) -> bool {
        self.settings.is_admin(&user.email)
    }

    pub async fn draw_ticket(&self, user_id: Uuid) -> Result<Ticket, AppError> {
        self.tickets.draw_ticket(user_id).await
    }

    pub async fn list_tickets(&self, user_id: Uuid) -> Result<Vec<TicketStatus>, AppError> {
        self.tickets.list_tickets(user_id).await
    }

    pub async fn list_upcoming_raffles(&self, limit: Option<i64>) -> Result<Vec<Raffle>, AppError> {
        self.raffles.list_upcoming(limit).await
    }

    pub async fn list_ongoing_raffles(&self) -> Result<Vec<Raffle>, AppError> {
        self.raffles.list_ongoing().await
    }

    pub async fn list_past_raffles(
        &self,
        reveal_email: bool,
        since_days: Option<i64>,
    ) -> Result<Vec<RaffleView>, AppError> {
        self.raffles.list_past(reveal_email, since_days).await
    }

    pub async fn get_raffle(
        &self,
        raffle_id: i64,
        reveal_email: bool,
    ) -> Result<Option<RaffleView>, AppError> {
        self.raffles.get_raffle(raffle_id, reveal_email).await
    }

    pub async fn get_applicants(
        &self,
        raffle_id: i64,
        user_id: Option<Uuid>,
    ) -> Result<Vec<Applicant>, AppError> {
        self.entries.get_applicants(raffle_id, user_id).await
    }

    /// Enters the user into an open raffle with their oldest redeemable
    /// ticket.
    pub async fn submit_entry(&self, raffle_id: i64, user_id: Uuid) -> Result<Entry, AppError> {
        let raffle = self
            .raffles
            .find(raffle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("The raffle with id {raffle_id} doesn't exist")))?;

        let now = self.clock.utc();
        if now < raffle.start_time {
            return Err(AppError::ValidationError(format!(
                "Entries for raffle {raffle_id} are not open yet"
            )));
        }
        if !raffle.is_open(now) {
            return Err(AppError::ValidationError(format!(
                "Entries for raffle {raffle_id} are closed"
            )));
        }

        // A repeat entry is a duplicate even when it spent the user's last ticket.
        if !self
            .entries
            .get_applicants(raffle_id, Some(user_id))
            .await?
            .is_empty()
        {
            return Err(AppError::DuplicateEntry(
                "You have already entered this raffle".to_string(),
            ));
        }

        let ticket = self
            .tickets
            .next_redeemable_ticket(user_id)
            .await?
            .ok_or_else(|| AppError::NoTicketAvailable("You don't have any tickets left".to_string()))?;

        self.entries
            .submit_entry(
                Entry {
                    raffle_id,
                    ticket_no: ticket.ticket_no,
                    user_id,
                },
                now,
            )
            .await
    }

    /// Admin only.
    pub async fn create_raffle(
        &self,
        creator: &User,
        request: CreateRaffleRequest,
    ) -> Result<i64, AppError> {
        if !self.is_admin(creator) {
            return Err(AppError::Forbidden(
                "You are not allowed to access admin APIs".to_string(),
            ));
        }
        self.raffles.create_raffle(request).await
    }

    pub async fn run_sweep(&self) -> Result<SweepReport, AppError> {
        self.results.run_sweep().await
    }
}
