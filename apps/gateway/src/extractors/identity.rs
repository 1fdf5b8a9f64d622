use std::future::{ready, Ready};
use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpMessage, HttpRequest};

use crate::auth::IdentityClaim;
use crate::error::{AppError, AuthFailure};

/// Verified caller identity stored by `AuthGate`.
///
/// Fails with 401 when the route did not (or could not) authenticate.
#[derive(Debug, Clone)]
pub struct Identity(pub IdentityClaim);

impl Deref for Identity {
    type Target = IdentityClaim;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<IdentityClaim>()
                .cloned()
                .map(Identity)
                .ok_or_else(|| AppError::unauthorized(AuthFailure::MissingToken)),
        )
    }
}

/// Identity on optional-auth routes; never fails.
#[derive(Debug, Clone, Default)]
pub struct MaybeIdentity(pub Option<IdentityClaim>);

impl MaybeIdentity {
    pub fn claim(&self) -> Option<&IdentityClaim> {
        self.0.as_ref()
    }
}

impl FromRequest for MaybeIdentity {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(MaybeIdentity(
            req.extensions().get::<IdentityClaim>().cloned(),
        )))
    }
}
