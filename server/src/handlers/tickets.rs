use axum::extract::State;
use axum::response::Response;

use crate::state::AppState;
use crate::utils::auth::AuthUser;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn draw_ticket(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response, AppError> {
    let ticket = state.lucky_draw.draw_ticket(user.id).await?;
    Ok(created(ticket, "Ticket drawn"))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response, AppError> {
    let tickets = state.lucky_draw.list_tickets(user.id).await?;
    Ok(success(tickets, "Tickets retrieved"))
}
