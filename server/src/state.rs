use std::sync::Arc;

use crate::services::LuckyDraw;
use crate::store::RaffleStore;

#[derive(Clone)]
pub struct AppState {
    pub lucky_draw: LuckyDraw,
    /// Used for token lookups only; everything else goes through `lucky_draw`.
    pub store: Arc<dyn RaffleStore>,
}

impl AppState {
    pub fn new(lucky_draw: LuckyDraw, store: Arc<dyn RaffleStore>) -> Self {
        Self { lucky_draw, store }
    }
}
