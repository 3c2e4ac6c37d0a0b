use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Applicant;
use crate::utils::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Raffle {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub prize: String,
    pub prize_picture_url: Option<String>,
    pub start_time: DateTime<Utc>,
    pub closing_time: DateTime<Utc>,
}

impl Raffle {
    /// Entries are accepted in `[start_time, closing_time)`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.closing_time
    }

    pub fn state(&self, now: DateTime<Utc>, has_result: bool) -> RaffleState {
        RaffleState::derive(now, self.start_time, self.closing_time, has_result)
    }
}

/// Lifecycle of a raffle. Never stored: always recomputed from the clock and
/// the presence of a result row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RaffleState {
    Upcoming,
    Open,
    ClosedUnresolved,
    Resolved,
}

impl RaffleState {
    pub fn derive(
        now: DateTime<Utc>,
        start_time: DateTime<Utc>,
        closing_time: DateTime<Utc>,
        has_result: bool,
    ) -> Self {
        if now < start_time {
            RaffleState::Upcoming
        } else if now < closing_time {
            RaffleState::Open
        } else if has_result {
            RaffleState::Resolved
        } else {
            RaffleState::ClosedUnresolved
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Winner {
    pub name: String,
    pub ticket_no: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A raffle joined with its result, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaffleRecord {
    pub raffle: Raffle,
    pub winner: Option<Winner>,
}

impl RaffleRecord {
    pub fn into_view(self, now: DateTime<Utc>, reveal_winner_email: bool) -> RaffleView {
        let state = self.raffle.state(now, self.winner.is_some());
        let winner = self.winner.map(|winner| Winner {
            email: winner.email.filter(|_| reveal_winner_email),
            ..winner
        });

        RaffleView {
            raffle: self.raffle,
            state,
            winner,
            applicants: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RaffleView {
    #[serde(flatten)]
    pub raffle: Raffle,
    pub state: RaffleState,
    pub winner: Option<Winner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicants: Option<Vec<Applicant>>,
}

/// Admin input for a new raffle, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRaffleRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub prize: Option<String>,
    pub prize_picture_url: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub closing_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRaffle {
    pub title: String,
    pub description: Option<String>,
    pub prize: String,
    pub prize_picture_url: Option<String>,
    pub start_time: DateTime<Utc>,
    pub closing_time: DateTime<Utc>,
}

impl TryFrom<CreateRaffleRequest> for NewRaffle {
    type Error = AppError;

    fn try_from(request: CreateRaffleRequest) -> Result<Self, Self::Error> {
        let title = non_blank(request.title);
        let prize = non_blank(request.prize);

        let (Some(title), Some(prize), Some(start_time), Some(closing_time)) =
            (title, prize, request.start_time, request.closing_time)
        else {
            return Err(AppError::ValidationError(
                "Title, prize, start time and closing time are required".to_string(),
            ));
        };

        if start_time >= closing_time {
            return Err(AppError::ValidationError(
                "Start time must be before closing time".to_string(),
            ));
        }

        Ok(Self {
            title,
            description: non_blank(request.description),
            prize,
            prize_picture_url: non_blank(request.prize_picture_url),
            start_time,
            closing_time,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn complete_request() -> CreateRaffleRequest {
        CreateRaffleRequest {
            title: Some("Summer draw".to_string()),
            description: Some("  ".to_string()),
            prize: Some("Bicycle".to_string()),
            prize_picture_url: None,
            start_time: Some(at(10)),
            closing_time: Some(at(12)),
        }
    }

    #[rstest]
    #[case(at(9), false, RaffleState::Upcoming)]
    #[case(at(10), false, RaffleState::Open)]
    #[case(at(11), false, RaffleState::Open)]
    #[case(at(12), false, RaffleState::ClosedUnresolved)]
    #[case(at(13), true, RaffleState::Resolved)]
    fn test_state_is_derived_from_clock_and_result(
        #[case] now: DateTime<Utc>,
        #[case] has_result: bool,
        #[case] expected: RaffleState,
    ) {
        assert_eq!(RaffleState::derive(now, at(10), at(12), has_result), expected);
    }

    #[test]
    fn test_closing_instant_is_not_open() {
        let raffle = Raffle {
            id: 1,
            title: "t".to_string(),
            description: None,
            prize: "p".to_string(),
            prize_picture_url: None,
            start_time: at(10),
            closing_time: at(12),
        };
        assert!(raffle.is_open(at(10)));
        assert!(raffle.is_open(at(12) - Duration::seconds(1)));
        assert!(!raffle.is_open(at(12)));
    }

    #[test]
    fn test_valid_request_is_normalised() {
        let raffle = NewRaffle::try_from(complete_request()).unwrap();
        assert_eq!(raffle.title, "Summer draw");
        assert_eq!(raffle.description, None);
    }

    #[rstest]
    #[case::missing_title(CreateRaffleRequest { title: None, ..complete_request() })]
    #[case::blank_prize(CreateRaffleRequest { prize: Some(" ".to_string()), ..complete_request() })]
    #[case::missing_start(CreateRaffleRequest { start_time: None, ..complete_request() })]
    #[case::missing_close(CreateRaffleRequest { closing_time: None, ..complete_request() })]
    #[case::inverted_window(CreateRaffleRequest { start_time: Some(at(12)), closing_time: Some(at(10)), ..complete_request() })]
    #[case::empty_window(CreateRaffleRequest { start_time: Some(at(12)), closing_time: Some(at(12)), ..complete_request() })]
    fn test_invalid_requests_are_rejected(#[case] request: CreateRaffleRequest) {
        assert!(matches!(
            NewRaffle::try_from(request),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_winner_email_hidden_unless_revealed() {
        let record = RaffleRecord {
            raffle: Raffle {
                id: 7,
                title: "t".to_string(),
                description: None,
                prize: "p".to_string(),
                prize_picture_url: None,
                start_time: at(10),
                closing_time: at(12),
            },
            winner: Some(Winner {
                name: "Ada".to_string(),
                ticket_no: 3,
                email: Some("ada@example.com".to_string()),
            }),
        };

        let public = record.clone().into_view(at(13), false);
        assert_eq!(public.state, RaffleState::Resolved);
        assert_eq!(public.winner.as_ref().unwrap().email, None);

        let admin = record.into_view(at(13), true);
        assert_eq!(
            admin.winner.unwrap().email.as_deref(),
            Some("ada@example.com")
        );
    }
}
