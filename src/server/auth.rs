use crate::domain::model::UserId;
use crate::server::error::ErrorBody;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;

pub const USER_HEADER: &str = "x-user-id";

/// Usuário autenticado, lido do cabeçalho `X-User-Id` que o proxy de
/// autenticação injeta na requisição.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

fn parse_user_id(raw: &str) -> Option<UserId> {
    raw.trim().parse::<UserId>().ok().filter(|id| *id > 0)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_user_id);

        match user_id {
            Some(id) => Ok(CurrentUser(id)),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorBody::new("Faça login para continuar.")),
            )),
        }
    }
}
