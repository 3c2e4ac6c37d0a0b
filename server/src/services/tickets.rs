use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;
use tracing::info;
use uuid::Uuid;

use super::SharedClock;
use crate::models::{Ticket, TicketStatus};
use crate::store::RaffleStore;
use crate::utils::error::AppError;

/// Issues tickets and answers which of them can still be redeemed.
#[derive(Clone)]
pub struct TicketLedger {
    store: Arc<dyn RaffleStore>,
    clock: SharedClock,
    validity: Duration,
}

impl TicketLedger {
    pub fn new(store: Arc<dyn RaffleStore>, clock: SharedClock, validity: Duration) -> Self {
        Self {
            store,
            clock,
            validity,
        }
    }

    pub async fn draw_ticket(&self, user_id: Uuid) -> Result<Ticket, AppError> {
        let issued_at = self.clock.utc();
        let valid_upto = issued_at.checked_add_signed(self.validity).ok_or_else(|| {
            AppError::InternalServerError(format!(
                "Ticket validity of {} overflows the calendar",
                self.validity
            ))
        })?;

        let ticket = self
            .store
            .insert_ticket(user_id, issued_at, valid_upto)
            .await?;

        info!(
            %user_id,
            ticket_no = ticket.ticket_no,
            valid_upto = %ticket.valid_upto,
            "Ticket drawn"
        );
        Ok(ticket)
    }

    pub async fn list_tickets(&self, user_id: Uuid) -> Result<Vec<TicketStatus>, AppError> {
        Ok(self.store.tickets_for_user(user_id).await?)
    }

    /// Oldest ticket that is neither expired nor bound to an entry. `None` is
    /// an ordinary answer.
    pub async fn next_redeemable_ticket(&self, user_id: Uuid) -> Result<Option<Ticket>, AppError> {
        let now = self.clock.utc();
        Ok(self.store.next_redeemable_ticket(user_id, now).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LuckyDrawSettings;
    use crate::services::test_support::Harness;

    #[tokio::test]
    async fn test_ticket_validity_window() {
        let harness = Harness::new();
        let user = harness.store.add_user("Ada", "ada@example.com");

        let drawn_at = harness.now();
        let ticket = harness.lucky_draw.draw_ticket(user.id).await.unwrap();

        assert_eq!(ticket.user_id, user.id);
        assert_eq!(ticket.issued_at, drawn_at);
        assert_eq!(ticket.valid_upto, drawn_at + Duration::days(7));
    }

    #[tokio::test]
    async fn test_users_may_hold_many_tickets() {
        let harness = Harness::new();
        let user = harness.store.add_user("Ada", "ada@example.com");

        for _ in 0..3 {
            harness.lucky_draw.draw_ticket(user.id).await.unwrap();
        }

        let tickets = harness.lucky_draw.list_tickets(user.id).await.unwrap();
        assert_eq!(tickets.len(), 3);
        assert!(tickets.iter().all(|t| !t.redeemed));
    }

    #[tokio::test]
    async fn test_next_redeemable_prefers_oldest_unused() {
        let harness = Harness::new();
        let ledger = harness.lucky_draw.tickets();
        let user = harness.store.add_user("Ada", "ada@example.com");

        let first = ledger.draw_ticket(user.id).await.unwrap();
        harness.clock.advance(Duration::hours(1));
        let second = ledger.draw_ticket(user.id).await.unwrap();

        assert_eq!(
            ledger.next_redeemable_ticket(user.id).await.unwrap(),
            Some(first.clone())
        );

        let raffle_id = harness.raffle("Spend", Duration::zero(), Duration::hours(1)).await;
        let entry = harness.lucky_draw.submit_entry(raffle_id, user.id).await.unwrap();
        assert_eq!(entry.ticket_no, first.ticket_no);

        assert_eq!(
            ledger.next_redeemable_ticket(user.id).await.unwrap(),
            Some(second)
        );

        let listed = ledger.list_tickets(user.id).await.unwrap();
        assert!(listed[0].redeemed);
        assert!(!listed[1].redeemed);
    }

    #[tokio::test]
    async fn test_expired_tickets_are_never_redeemable() {
        let harness = Harness::new();
        let ledger = harness.lucky_draw.tickets();
        let user = harness.store.add_user("Ada", "ada@example.com");
        let ticket = ledger.draw_ticket(user.id).await.unwrap();

        harness.clock.set(ticket.valid_upto - Duration::seconds(1));
        assert!(ledger.next_redeemable_ticket(user.id).await.unwrap().is_some());

        harness.clock.set(ticket.valid_upto);
        assert_eq!(ledger.next_redeemable_ticket(user.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tickets_of_other_users_are_not_offered() {
        let harness = Harness::new();
        let ledger = harness.lucky_draw.tickets();
        let owner = harness.user_with_ticket("Ada").await;
        let other = harness.store.add_user("Bob", "bob@example.com");

        assert!(ledger.next_redeemable_ticket(owner.id).await.unwrap().is_some());
        assert_eq!(ledger.next_redeemable_ticket(other.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overflowing_validity_is_an_error() {
        let harness = Harness::with_settings(LuckyDrawSettings {
            ticket_validity: Duration::days(100_000_000),
            ..LuckyDrawSettings::default()
        });
        let user = harness.store.add_user("Ada", "ada@example.com");

        let err = harness.lucky_draw.draw_ticket(user.id).await.unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
        assert!(harness.lucky_draw.list_tickets(user.id).await.unwrap().is_empty());
    }
}
