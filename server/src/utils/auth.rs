use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::models::User;
use crate::state::AppState;
use crate::utils::error::AppError;

const TOKEN_SCHEME: &str = "Token";

/// The caller identified by an `Authorization: Token <uuid>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Like [`AuthUser`] but anonymous requests are allowed. A header that is
/// present but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<User>);

fn parse_token(value: &str) -> Result<Uuid, AppError> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case(TOKEN_SCHEME) => token
            .parse()
            .map_err(|_| AppError::AuthError("Provided Authorization header is invalid".to_string())),
        _ => Err(AppError::AuthError(
            "Provided Authorization header is invalid".to_string(),
        )),
    }
}

async fn lookup(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| AppError::AuthError("Provided Authorization header is invalid".to_string()))?;
    let token = parse_token(header)?;

    match state.store.user_by_token(token).await? {
        Some(user) => Ok(Some(user)),
        None => Err(AppError::AuthError("Invalid authorization token".to_string())),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        lookup(parts, &state).await?.map(AuthUser).ok_or_else(|| {
            AppError::AuthError("You need to provide an Authorization header".to_string())
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(MaybeAuthUser(lookup(parts, &state).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token() {
        let token = Uuid::new_v4();
        assert_eq!(parse_token(&format!("Token {token}")).unwrap(), token);
        assert_eq!(parse_token(&format!("token  {token}")).unwrap(), token);
        assert!(parse_token("Token").is_err());
        assert!(parse_token("Bearer abc").is_err());
        assert!(parse_token("Token not-a-uuid").is_err());
        assert!(parse_token(&format!("Token {token} extra")).is_err());
    }
}
