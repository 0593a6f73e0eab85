//! Who a request comes from.
//!
//! Authentication and sessions are handled in front of this service; it only
//! reads what the upstream provider forwards in headers.

use crate::error::ApiError;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use shop_commerce::cart::CartIdentity;
use shop_commerce::{SessionKey, UserId};
use std::convert::Infallible;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const SESSION_KEY_HEADER: &str = "x-session-key";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Identity headers of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_id: Option<UserId>,
    pub session_key: Option<SessionKey>,
    /// First hop of `x-forwarded-for`.
    pub client_ip: Option<String>,
}

impl RequestIdentity {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let client_ip = header_str(headers, FORWARDED_FOR_HEADER)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string);

        Self {
            user_id: header_str(headers, USER_ID_HEADER).map(UserId::new),
            session_key: header_str(headers, SESSION_KEY_HEADER).map(SessionKey::new),
            client_ip,
        }
    }

    pub fn cart_identity(&self) -> CartIdentity {
        CartIdentity {
            user_id: self.user_id.clone(),
            session_key: self.session_key.clone(),
        }
    }

    /// The authenticated user, or 401.
    pub fn require_user(&self) -> Result<&UserId, ApiError> {
        self.user_id
            .as_ref()
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided."))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Attach a newly allocated session key to a response.
pub fn with_session(session: Option<SessionKey>, body: impl IntoResponse) -> Response {
    let mut response = body.into_response();
    if let Some(key) = session {
        if let Ok(value) = HeaderValue::from_str(key.as_str()) {
            response.headers_mut().insert(SESSION_KEY_HEADER, value);
        }
    }
    response
}
