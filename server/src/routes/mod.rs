use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::security::SecurityHeaders;
use crate::handlers::{health_check, raffles, tickets};
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/tickets",
            post(tickets::draw_ticket).get(tickets::list_tickets),
        )
        .route("/raffles", post(raffles::create_raffle))
        .route("/raffles/upcoming", get(raffles::list_upcoming))
        .route("/raffles/ongoing", get(raffles::list_ongoing))
        .route("/raffles/past", get(raffles::list_past))
        .route("/raffles/:raffle_id", get(raffles::get_raffle))
        .route("/raffles/:raffle_id/entries", post(raffles::enter_raffle))
        .with_state(state)
}

fn with_layers(router: Router, security: SecurityHeaders, cors: CorsLayer) -> Router {
    security
        .apply(router)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub fn create_routes(state: AppState, security: SecurityHeaders, cors: CorsLayer) -> Router {
    with_layers(api_router(state), security, cors)
}
