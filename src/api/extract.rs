use crate::error::AppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Requesting user, taken from `X-User-ID`.
#[derive(Debug, Clone)]
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, USER_ID_HEADER)
            .map(|id| UserId(id.to_string()))
            .ok_or_else(|| AppError::Validation {
                details: vec!["header X-User-ID should be provided".to_string()],
            })
    }
}

/// Caller role from `X-User-Role`; anything but `admin` is a regular user.
#[derive(Debug, Clone, Copy)]
pub struct UserRole {
    pub admin: bool,
}

impl UserRole {
    pub fn require_admin(self) -> Result<(), AppError> {
        if self.admin {
            Ok(())
        } else {
            Err(AppError::AdminRequired)
        }
    }
}

impl<S> FromRequestParts<S> for UserRole
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = header_value(parts, USER_ROLE_HEADER)
            .is_some_and(|role| role.eq_ignore_ascii_case("admin"));
        Ok(UserRole { admin })
    }
}
