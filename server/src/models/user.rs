use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered participant. Accounts are provisioned outside this service;
/// the lucky draw only needs the id, the display name and the email.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub auth_token: Uuid,
    pub created_at: DateTime<Utc>,
}
