use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The winning ticket of a raffle. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RaffleResult {
    pub raffle_id: i64,
    pub ticket_no: i64,
    pub user_id: Uuid,
}
