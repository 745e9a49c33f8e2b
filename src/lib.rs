#![doc = "The `devbase` library crate."]
#![doc = ""]
#![doc = "Domain models, authentication, persistence, routing and error handling for the"]
#![doc = "devbase projects-and-tasks API. The binary (`main.rs`) only wires these together."]

pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod security;
pub mod services;
pub mod state;

use actix_web::web;

pub use error::AppError;
pub use state::AppState;

/// Everything mounted on the `App` apart from middleware: shared state, `/health`,
/// the `/api` tree built by [`routes::api`] and the 404 fallback.
///
/// Middleware stays with the caller because `App::wrap` changes the app's type.
pub fn configure_app<F>(state: AppState, api: F) -> impl FnOnce(&mut web::ServiceConfig)
where
    F: FnOnce(&mut web::ServiceConfig),
{
    move |cfg| {
        state.configure(cfg);
        cfg.service(routes::health::health);
        api(cfg);
        cfg.default_service(web::to(routes::not_found));
    }
}
