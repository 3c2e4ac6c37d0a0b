use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::models::{Applicant, Entry};
use crate::store::RaffleStore;
use crate::utils::error::AppError;

/// Records which ticket a user spent on which raffle.
#[derive(Clone)]
pub struct EntryLedger {
    store: Arc<dyn RaffleStore>,
}

impl EntryLedger {
    pub fn new(store: Arc<dyn RaffleStore>) -> Self {
        Self { store }
    }

    pub async fn get_applicants(
        &self,
        raffle_id: i64,
        user_id: Option<Uuid>,
    ) -> Result<Vec<Applicant>, AppError> {
        Ok(self.store.applicants(raffle_id, user_id).await?)
    }

    /// Atomic insert. The store re-checks the raffle window at `now` and
    /// guards the two uniqueness rules, reporting either violation as
    /// [`AppError::DuplicateEntry`]. Ticket selection is up to the caller.
    pub async fn submit_entry(&self, entry: Entry, now: DateTime<Utc>) -> Result<Entry, AppError> {
        self.store.insert_entry(&entry, now).await?;

        info!(
            raffle_id = entry.raffle_id,
            ticket_no = entry.ticket_no,
            user_id = %entry.user_id,
            "Raffle entry recorded"
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::Harness;
    use chrono::Duration;

    #[tokio::test]
    async fn test_one_entry_per_user_per_raffle() {
        let harness = Harness::new();
        let raffle_id = harness.raffle("Once", Duration::zero(), Duration::hours(1)).await;
        let user = harness.user_with_ticket("Ada").await;
        let second = harness.lucky_draw.draw_ticket(user.id).await.unwrap();
        let ledger = harness.lucky_draw.entries();

        ledger
            .submit_entry(
                Entry {
                    raffle_id,
                    ticket_no: 1,
                    user_id: user.id,
                },
                harness.now(),
            )
            .await
            .unwrap();

        // A different ticket does not allow a second entry.
        let err = ledger
            .submit_entry(
                Entry {
                    raffle_id,
                    ticket_no: second.ticket_no,
                    user_id: user.id,
                },
                harness.now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEntry(_)));
        assert_eq!(harness.store.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_ticket_backs_a_single_entry() {
        let harness = Harness::new();
        let first = harness.raffle("A", Duration::zero(), Duration::hours(1)).await;
        let second = harness.raffle("B", Duration::zero(), Duration::hours(1)).await;
        let user = harness.user_with_ticket("Ada").await;
        let ledger = harness.lucky_draw.entries();

        let entry = Entry {
            raffle_id: first,
            ticket_no: 1,
            user_id: user.id,
        };
        ledger.submit_entry(entry.clone(), harness.now()).await.unwrap();

        let err = ledger
            .submit_entry(
                Entry {
                    raffle_id: second,
                    ..entry
                },
                harness.now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEntry(_)));
    }

    #[tokio::test]
    async fn test_insert_after_close_is_rejected() {
        let harness = Harness::new();
        let raffle_id = harness.raffle("Late", Duration::zero(), Duration::hours(1)).await;
        let user = harness.user_with_ticket("Ada").await;
        harness.clock.advance(Duration::hours(1));

        let err = harness
            .lucky_draw
            .entries()
            .submit_entry(
                Entry {
                    raffle_id,
                    ticket_no: 1,
                    user_id: user.id,
                },
                harness.now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(harness.store.entries().is_empty());
    }

    #[tokio::test]
    async fn test_applicants_can_be_filtered_by_user() {
        let harness = Harness::new();
        let raffle_id = harness.raffle("Crowd", Duration::zero(), Duration::hours(1)).await;
        let ada = harness.user_with_ticket("Ada").await;
        let bob = harness.user_with_ticket("Bob").await;
        harness.lucky_draw.submit_entry(raffle_id, ada.id).await.unwrap();
        harness.lucky_draw.submit_entry(raffle_id, bob.id).await.unwrap();

        let ledger = harness.lucky_draw.entries();
        let everyone = ledger.get_applicants(raffle_id, None).await.unwrap();
        assert_eq!(everyone.len(), 2);

        let only_bob = ledger.get_applicants(raffle_id, Some(bob.id)).await.unwrap();
        assert_eq!(only_bob.len(), 1);
        assert_eq!(only_bob[0].name, "Bob");
        assert_eq!(only_bob[0].email, "bob@example.com");
    }
}
