use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::authenticator::{Authenticator, Identity};
use crate::errors::ApiError;

/// Authenticates the request with Basic credentials, yielding the caller's
/// identity. Handlers taking this never run for unauthenticated requests.
pub struct AuthUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Authenticator: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Authenticator::from_ref(state);
        let identity = authenticator.authenticate(&parts.headers).await?;
        parts.extensions.insert(identity.clone());
        Ok(AuthUser(identity))
    }
}
