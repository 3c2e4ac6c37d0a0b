use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::models::CreateRaffleRequest;
use crate::state::AppState;
use crate::utils::auth::{AuthUser, MaybeAuthUser};
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PastQuery {
    pub since_days: Option<i64>,
}

#[derive(Serialize)]
struct CreatedRaffle {
    raffle_id: i64,
}

pub async fn list_upcoming(
    State(state): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> Result<Response, AppError> {
    let raffles = state.lucky_draw.list_upcoming_raffles(query.limit).await?;
    Ok(success(raffles, "Upcoming raffles retrieved"))
}

pub async fn list_ongoing(State(state): State<AppState>) -> Result<Response, AppError> {
    let raffles = state.lucky_draw.list_ongoing_raffles().await?;
    Ok(success(raffles, "Ongoing raffles retrieved"))
}

pub async fn list_past(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(query): Query<PastQuery>,
) -> Result<Response, AppError> {
    let reveal_email = viewer.is_some_and(|user| state.lucky_draw.is_admin(&user));
    let raffles = state
        .lucky_draw
        .list_past_raffles(reveal_email, query.since_days)
        .await?;
    Ok(success(raffles, "Past raffles retrieved"))
}

/// Admins also get the winner's email and the applicant list.
pub async fn get_raffle(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(raffle_id): Path<i64>,
) -> Result<Response, AppError> {
    let is_admin = viewer.is_some_and(|user| state.lucky_draw.is_admin(&user));

    let mut raffle = state
        .lucky_draw
        .get_raffle(raffle_id, is_admin)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("The raffle with id {raffle_id} doesn't exist")))?;

    if is_admin {
        raffle.applicants = Some(state.lucky_draw.get_applicants(raffle_id, None).await?);
    }

    Ok(success(raffle, "Raffle retrieved"))
}

pub async fn create_raffle(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateRaffleRequest>,
) -> Result<Response, AppError> {
    let raffle_id = state.lucky_draw.create_raffle(&user, request).await?;
    Ok(created(CreatedRaffle { raffle_id }, "Raffle created"))
}

pub async fn enter_raffle(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(raffle_id): Path<i64>,
) -> Result<Response, AppError> {
    let entry = state.lucky_draw.submit_entry(raffle_id, user.id).await?;
    Ok(created(entry, "Raffle entry recorded"))
}
