use actix_cors::Cors;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::error::AppError;

/// Origins allowed to call the API, parsed from `CORS_ORIGIN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<String>),
}

impl AllowedOrigins {
    /// `*` allows everything; anything else is a comma-separated list.
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "*" {
            return AllowedOrigins::Any;
        }
        AllowedOrigins::List(
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    /// Requests without an `Origin` header (curl, server-to-server) are always allowed.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (_, None) | (AllowedOrigins::Any, _) => true,
            (AllowedOrigins::List(list), Some(origin)) => list.iter().any(|o| o == origin),
        }
    }
}

/// Builds the `actix-cors` layer. Credentials are enabled for the refresh cookie.
pub fn build(origins: &AllowedOrigins) -> Cors {
    let origins = origins.clone();
    Cors::default()
        .allowed_origin_fn(move |origin, _| origins.is_allowed(origin.to_str().ok()))
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600)
}

/// Rejects requests from disallowed origins with `403 CORS_FORBIDDEN`.
///
/// Registered outside of [`build`] so the rejection uses the API error envelope.
pub struct CorsGuard {
    origins: Rc<AllowedOrigins>,
}

impl CorsGuard {
    pub fn new(origins: AllowedOrigins) -> Self {
        Self {
            origins: Rc::new(origins),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CorsGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsGuardService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsGuardService {
            service,
            origins: Rc::clone(&self.origins),
        }))
    }
}

pub struct CorsGuardService<S> {
    service: S,
    origins: Rc<AllowedOrigins>,
}

impl<S, B> Service<ServiceRequest> for CorsGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let origin = req
            .headers()
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok());

        if !self.origins.is_allowed(origin) {
            log::warn!("Rejected request from origin {:?}", origin);
            let res = req.error_response(AppError::CorsForbidden);
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
