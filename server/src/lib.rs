pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod sweeper;
pub mod utils;

use std::sync::Arc;

use mockable::DefaultClock;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::services::LuckyDraw;
use crate::state::AppState;
use crate::store::{PgStore, RaffleStore};

pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

/// Wires the Postgres store and the system clock into the lucky draw core.
pub fn build_state(pool: PgPool, config: &Config) -> AppState {
    let store: Arc<dyn RaffleStore> = Arc::new(PgStore::new(pool));
    let lucky_draw = LuckyDraw::new(
        store.clone(),
        Arc::new(DefaultClock),
        config.lucky_draw.clone(),
    );
    AppState::new(lucky_draw, store)
}
