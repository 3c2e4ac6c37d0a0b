use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{RaffleStore, StoreError, UniqueConstraint};
use crate::models::{
    Applicant, Entry, NewRaffle, Raffle, RaffleRecord, RaffleResult, Ticket, TicketStatus, User,
    Winner,
};

const RAFFLE_WITH_RESULT: &str = r#"
    SELECT raffles.id, raffles.title, raffles.description, raffles.prize,
           raffles.prize_picture_url, raffles.start_time, raffles.closing_time,
           users.name AS winner_name,
           results.ticket_no AS winner_ticket_no,
           users.email AS winner_email
      FROM raffles
 LEFT JOIN results ON results.raffle_id = raffles.id
 LEFT JOIN users ON users.id = results.user_id
"#;

const RESULT_ENTRY_FKEY: &str = "results_entry_fkey";

#[derive(FromRow)]
struct RaffleWithResultRow {
    #[sqlx(flatten)]
    raffle: Raffle,
    winner_name: Option<String>,
    winner_ticket_no: Option<i64>,
    winner_email: Option<String>,
}

impl From<RaffleWithResultRow> for RaffleRecord {
    fn from(row: RaffleWithResultRow) -> Self {
        let winner = match (row.winner_name, row.winner_ticket_no) {
            (Some(name), Some(ticket_no)) => Some(Winner {
                name,
                ticket_no,
                email: row.winner_email,
            }),
            _ => None,
        };

        RaffleRecord {
            raffle: row.raffle,
            winner,
        }
    }
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_insert_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            if let Some(constraint) = db_error.constraint().and_then(UniqueConstraint::from_name) {
                debug!(constraint = constraint.name(), "unique constraint rejected insert");
                return StoreError::Duplicate(constraint);
            }
        }
    }
    StoreError::Database(error)
}

fn map_result_error(raffle_id: i64, error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_foreign_key_violation() && db_error.constraint() == Some(RESULT_ENTRY_FKEY) {
            return StoreError::UnknownEntry(raffle_id);
        }
    }
    StoreError::Database(error)
}

#[async_trait]
impl RaffleStore for PgStore {
    async fn user_by_token(&self, token: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, auth_token, created_at FROM users WHERE auth_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_ticket(
        &self,
        user_id: Uuid,
        issued_at: DateTime<Utc>,
        valid_upto: DateTime<Utc>,
    ) -> Result<Ticket, StoreError> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (user_id, issued_at, valid_upto)
                 VALUES ($1, $2, $3)
              RETURNING ticket_no, user_id, issued_at, valid_upto
            "#,
        )
        .bind(user_id)
        .bind(issued_at)
        .bind(valid_upto)
        .fetch_one(&self.pool)
        .await?;
        Ok(ticket)
    }

    async fn tickets_for_user(&self, user_id: Uuid) -> Result<Vec<TicketStatus>, StoreError> {
        let tickets = sqlx::query_as::<_, TicketStatus>(
            r#"
            SELECT tickets.ticket_no, tickets.user_id, tickets.issued_at, tickets.valid_upto,
                   EXISTS (SELECT 1 FROM entries WHERE entries.ticket_no = tickets.ticket_no)
                       AS redeemed
              FROM tickets
             WHERE tickets.user_id = $1
          ORDER BY tickets.issued_at, tickets.ticket_no
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }

    async fn next_redeemable_ticket(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<Ticket>, StoreError> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT ticket_no, user_id, issued_at, valid_upto
              FROM tickets
             WHERE user_id = $1
               AND valid_upto > $2
               AND NOT EXISTS (SELECT 1 FROM entries WHERE entries.ticket_no = tickets.ticket_no)
          ORDER BY issued_at, ticket_no
             LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(ticket)
    }

    async fn insert_raffle(&self, raffle: &NewRaffle) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO raffles (title, description, prize, prize_picture_url, start_time, closing_time)
                 VALUES ($1, $2, $3, $4, $5, $6)
              RETURNING id
            "#,
        )
        .bind(&raffle.title)
        .bind(&raffle.description)
        .bind(&raffle.prize)
        .bind(&raffle.prize_picture_url)
        .bind(raffle.start_time)
        .bind(raffle.closing_time)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn raffle(&self, raffle_id: i64) -> Result<Option<RaffleRecord>, StoreError> {
        let query = format!("{RAFFLE_WITH_RESULT} WHERE raffles.id = $1");
        let row = sqlx::query_as::<_, RaffleWithResultRow>(&query)
            .bind(raffle_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RaffleRecord::from))
    }

    async fn upcoming_raffles(
        &self,
        now: DateTime<Utc>,
        limit: Option<i64>,
    ) -> Result<Vec<Raffle>, StoreError> {
        // A NULL limit returns every row.
        let raffles = sqlx::query_as::<_, Raffle>(
            r#"
            SELECT id, title, description, prize, prize_picture_url, start_time, closing_time
              FROM raffles
             WHERE start_time > $1
          ORDER BY start_time, id
             LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(raffles)
    }

    async fn ongoing_raffles(&self, now: DateTime<Utc>) -> Result<Vec<Raffle>, StoreError> {
        let raffles = sqlx::query_as::<_, Raffle>(
            r#"
            SELECT id, title, description, prize, prize_picture_url, start_time, closing_time
              FROM raffles
             WHERE start_time <= $1
               AND closing_time > $1
          ORDER BY closing_time, id
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(raffles)
    }

    async fn past_raffles(
        &self,
        now: DateTime<Utc>,
        closed_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<RaffleRecord>, StoreError> {
        let query = format!(
            "{RAFFLE_WITH_RESULT}
             WHERE raffles.closing_time <= $1
               AND ($2::timestamptz IS NULL OR raffles.closing_time > $2)
          ORDER BY raffles.closing_time DESC, raffles.id DESC"
        );
        let rows = sqlx::query_as::<_, RaffleWithResultRow>(&query)
            .bind(now)
            .bind(closed_after)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RaffleRecord::from).collect())
    }

    async fn applicants(
        &self,
        raffle_id: i64,
        user_id: Option<Uuid>,
    ) -> Result<Vec<Applicant>, StoreError> {
        let applicants = sqlx::query_as::<_, Applicant>(
            r#"
            SELECT users.name, users.email, entries.ticket_no, entries.user_id
              FROM entries
              JOIN users ON users.id = entries.user_id
             WHERE entries.raffle_id = $1
               AND ($2::uuid IS NULL OR entries.user_id = $2)
          ORDER BY entries.ticket_no
            "#,
        )
        .bind(raffle_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(applicants)
    }

    async fn insert_entry(&self, entry: &Entry, now: DateTime<Utc>) -> Result<(), StoreError> {
        // The window is re-checked in the same statement as the insert.
        let outcome = sqlx::query(
            r#"
            INSERT INTO entries (raffle_id, ticket_no, user_id)
                 SELECT raffles.id, $2, $3
                   FROM raffles
                  WHERE raffles.id = $1
                    AND raffles.start_time <= $4
                    AND raffles.closing_time > $4
            "#,
        )
        .bind(entry.raffle_id)
        .bind(entry.ticket_no)
        .bind(entry.user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_insert_error)?;

        if outcome.rows_affected() == 0 {
            return Err(StoreError::EntriesClosed(entry.raffle_id));
        }
        Ok(())
    }

    async fn unresolved_raffles_closed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<i64>, StoreError> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT raffles.id
              FROM raffles
             WHERE raffles.closing_time > $1
               AND raffles.closing_time < $2
               AND NOT EXISTS (SELECT 1 FROM results WHERE results.raffle_id = raffles.id)
          ORDER BY raffles.closing_time, raffles.id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    async fn insert_result(&self, result: &RaffleResult) -> Result<bool, StoreError> {
        let outcome = sqlx::query(
            r#"
            INSERT INTO results (raffle_id, ticket_no, user_id)
                 VALUES ($1, $2, $3)
            ON CONFLICT (raffle_id) DO NOTHING
            "#,
        )
        .bind(result.raffle_id)
        .bind(result.ticket_no)
        .bind(result.user_id)
        .execute(&self.pool)
        .await
        .map_err(|error| map_result_error(result.raffle_id, error))?;
        Ok(outcome.rows_affected() == 1)
    }
}
