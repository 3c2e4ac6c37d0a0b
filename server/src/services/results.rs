//! Winner selection.
//!
//! A raffle is resolved at most once. The store's insert-if-absent on the
//! result row is the only arbiter: overlapping sweeps, in this process or in
//! others, may all pick a winner, but only the first write is kept.

use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::entries::EntryLedger;
use super::SharedClock;
use crate::models::{Applicant, RaffleResult};
use crate::store::RaffleStore;
use crate::utils::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolveOutcome {
    Resolved { ticket_no: i64, user_id: Uuid },
    /// Nobody entered; no result is written.
    NoEntries,
    /// Another resolution already committed a winner.
    AlreadyResolved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub resolved: usize,
    pub no_entries: usize,
    pub already_resolved: usize,
    pub failed: usize,
}

/// Uniform choice over the entrants: each of N applicants wins with
/// probability 1/N.
pub fn pick_winner<'a, R>(applicants: &'a [Applicant], rng: &mut R) -> Option<&'a Applicant>
where
    R: Rng + ?Sized,
{
    applicants.choose(rng)
}

#[derive(Clone)]
pub struct ResultEngine {
    store: Arc<dyn RaffleStore>,
    entries: EntryLedger,
    clock: SharedClock,
    window: Duration,
}

impl ResultEngine {
    pub fn new(
        store: Arc<dyn RaffleStore>,
        entries: EntryLedger,
        clock: SharedClock,
        window: Duration,
    ) -> Self {
        Self {
            store,
            entries,
            clock,
            window,
        }
    }

    /// Unresolved raffles whose closing time lies in `(now - window, now)`.
    /// Anything that closed earlier is no longer picked up here.
    pub async fn due_for_resolution(&self) -> Result<Vec<i64>, AppError> {
        let now = self.clock.utc();
        let from = now.checked_sub_signed(self.window).ok_or_else(|| {
            AppError::InternalServerError(format!(
                "Resolution window of {} overflows the calendar",
                self.window
            ))
        })?;
        Ok(self.store.unresolved_raffles_closed_between(from, now).await?)
    }

    pub async fn resolve(&self, raffle_id: i64) -> Result<ResolveOutcome, AppError> {
        let record = self
            .store
            .raffle(raffle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Raffle {raffle_id} does not exist")))?;

        if self.clock.utc() < record.raffle.closing_time {
            return Err(AppError::ValidationError(format!(
                "Raffle {raffle_id} is still accepting entries"
            )));
        }
        if record.winner.is_some() {
            return Ok(ResolveOutcome::AlreadyResolved);
        }

        let applicants = self.entries.get_applicants(raffle_id, None).await?;
        let winner = pick_winner(&applicants, &mut rand::thread_rng()).cloned();
        let Some(winner) = winner else {
            info!(raffle_id, "Raffle closed without entries, no winner drawn");
            return Ok(ResolveOutcome::NoEntries);
        };

        let result = RaffleResult {
            raffle_id,
            ticket_no: winner.ticket_no,
            user_id: winner.user_id,
        };

        if self.store.insert_result(&result).await? {
            info!(
                raffle_id,
                ticket_no = result.ticket_no,
                user_id = %result.user_id,
                entrants = applicants.len(),
                "Raffle winner drawn"
            );
            Ok(ResolveOutcome::Resolved {
                ticket_no: result.ticket_no,
                user_id: result.user_id,
            })
        } else {
            debug!(raffle_id, "Result already recorded by a concurrent sweep");
            Ok(ResolveOutcome::AlreadyResolved)
        }
    }

    /// Resolves every due raffle independently. One failure never stops the
    /// others; a failed raffle stays due for the next sweep while it is still
    /// inside the window.
    pub async fn run_sweep(&self) -> Result<SweepReport, AppError> {
        let due = self.due_for_resolution().await?;
        let mut report = SweepReport::default();

        for raffle_id in due {
            match self.resolve(raffle_id).await {
                Ok(ResolveOutcome::Resolved { .. }) => report.resolved += 1,
                Ok(ResolveOutcome::NoEntries) => report.no_entries += 1,
                Ok(ResolveOutcome::AlreadyResolved) => report.already_resolved += 1,
                Err(err) => {
                    error!(raffle_id, error = %err, "Failed to resolve raffle");
                    report.failed += 1;
                }
            }
        }

        if report.failed > 0 {
            warn!(?report, "Sweep finished with failures");
        } else {
            info!(?report, "Sweep finished");
        }
        Ok(report)
    }
}
