use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Binding of one ticket to one raffle for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub raffle_id: i64,
    pub ticket_no: i64,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Applicant {
    pub name: String,
    pub email: String,
    pub ticket_no: i64,
    pub user_id: Uuid,
}
