//! Caller identity, as forwarded by the upstream auth gateway.
use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use meme_arena_engine::Caller;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// The caller of a request, or `None` for anonymous requests.
///
/// Extraction never fails; operations that need an identity reject
/// anonymous callers themselves.
#[derive(Debug, Clone)]
pub struct Identity(pub Option<Caller>);

impl Identity {
    pub fn caller(&self) -> Option<&Caller> {
        self.0.as_ref()
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = header_value(&parts.headers, USER_ID_HEADER)
            .and_then(|user_id| Caller::from_parts(user_id, header_value(&parts.headers, USER_NAME_HEADER)));
        Ok(Identity(caller))
    }
}
