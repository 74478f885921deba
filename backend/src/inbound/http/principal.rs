//! Extractor resolving the signed-in caller.
//!
//! The session only carries a user id; the user, group and permissions are
//! reloaded on every request so role or module changes apply immediately.

use std::ops::Deref;

use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, Principal};

use super::session::SessionContext;
use super::state::HttpState;

/// The authenticated caller. Rejects with `401` when no live user is bound
/// to the session.
pub struct CurrentUser(pub Principal);

impl Deref for CurrentUser {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = SessionContext::from_request(req, payload);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let session = session.await?;
            let state = state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let user_id = session.require_user_id()?;
            let principal = state.auth.principal(&user_id).await?;
            Ok(Self(principal))
        })
    }
}
