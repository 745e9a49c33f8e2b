use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::error::AppError;

/// The authenticated caller, as established by `AuthMiddleware`.
///
/// Services take the id from here and never from request bodies or paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
}

impl FromRequest for Principal {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Principal>().copied() {
            Some(principal) => ready(Ok(principal)),
            // Route mounted outside the authenticated scopes.
            None => ready(Err(AppError::Unauthorized("Unauthorized".into()).into())),
        }
    }
}
