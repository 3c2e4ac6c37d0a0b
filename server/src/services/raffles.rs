use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;
use tracing::info;

use super::SharedClock;
use crate::models::{CreateRaffleRequest, NewRaffle, Raffle, RaffleView};
use crate::store::RaffleStore;
use crate::utils::error::AppError;

/// Raffle definitions and the time-windowed views over them.
#[derive(Clone)]
pub struct RaffleRegistry {
    store: Arc<dyn RaffleStore>,
    clock: SharedClock,
}

impl RaffleRegistry {
    pub fn new(store: Arc<dyn RaffleStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    pub async fn create_raffle(&self, request: CreateRaffleRequest) -> Result<i64, AppError> {
        let raffle = NewRaffle::try_from(request)?;
        let raffle_id = self.store.insert_raffle(&raffle).await?;

        info!(
            raffle_id,
            title = %raffle.title,
            start_time = %raffle.start_time,
            closing_time = %raffle.closing_time,
            "Raffle created"
        );
        Ok(raffle_id)
    }

    /// Plain raffle row, used for the entry window check.
    pub async fn find(&self, raffle_id: i64) -> Result<Option<Raffle>, AppError> {
        Ok(self.store.raffle(raffle_id).await?.map(|record| record.raffle))
    }

    pub async fn get_raffle(
        &self,
        raffle_id: i64,
        reveal_winner_email: bool,
    ) -> Result<Option<RaffleView>, AppError> {
        let now = self.clock.utc();
        let record = self.store.raffle(raffle_id).await?;
        Ok(record.map(|record| record.into_view(now, reveal_winner_email)))
    }

    pub async fn list_upcoming(&self, limit: Option<i64>) -> Result<Vec<Raffle>, AppError> {
        if limit.is_some_and(|limit| limit < 0) {
            return Err(AppError::ValidationError(
                "Limit must not be negative".to_string(),
            ));
        }
        Ok(self.store.upcoming_raffles(self.clock.utc(), limit).await?)
    }

    pub async fn list_ongoing(&self) -> Result<Vec<Raffle>, AppError> {
        Ok(self.store.ongoing_raffles(self.clock.utc()).await?)
    }

    pub async fn list_past(
        &self,
        reveal_winner_email: bool,
        since_days: Option<i64>,
    ) -> Result<Vec<RaffleView>, AppError> {
        let now = self.clock.utc();
        let closed_after = match since_days {
            Some(days) if days < 0 => {
                return Err(AppError::ValidationError(
                    "since_days must not be negative".to_string(),
                ))
            }
            Some(days) => Some(
                Duration::try_days(days)
                    .and_then(|window| now.checked_sub_signed(window))
                    .ok_or_else(|| {
                        AppError::ValidationError("since_days is out of range".to_string())
                    })?,
            ),
            None => None,
        };

        let records = self.store.past_raffles(now, closed_after).await?;
        Ok(records
            .into_iter()
            .map(|record| record.into_view(now, reveal_winner_email))
            .collect())
    }
}
