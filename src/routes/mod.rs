pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;

use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::AuthMiddleware;
use crate::config::{ConfigError, RateLimitSettings};
use crate::error::{json_error_handler, path_error_handler, query_error_handler, AppError};

/// Builds the `/api` tree behind its request quotas.
///
/// The limiters are created here, once. Every clone of the returned closure shares their
/// counters, so all server workers draw from the same quota.
pub fn api(
    limits: &RateLimitSettings,
) -> Result<impl Fn(&mut web::ServiceConfig) + Clone + Send + 'static, ConfigError> {
    let api_quota = GovernorConfigBuilder::default()
        .period(limits.api.replenish_period())
        .burst_size(limits.api.max_requests)
        .finish()
        .ok_or_else(|| ConfigError::Invalid {
            name: "RATE_LIMIT_API_WINDOW",
            value: limits.api.window.to_string(),
        })?;
    let login_quota = GovernorConfigBuilder::default()
        .period(limits.login.replenish_period())
        .burst_size(limits.login.max_requests)
        .finish()
        .ok_or_else(|| ConfigError::Invalid {
            name: "RATE_LIMIT_LOGIN_WINDOW",
            value: limits.login.window.to_string(),
        })?;

    Ok(move |cfg: &mut web::ServiceConfig| {
        cfg.service(
            web::scope("/api")
                .wrap(Governor::new(&api_quota))
                // must precede the `/auth` scope, which would otherwise claim the path
                .service(
                    web::scope("/auth/login")
                        .wrap(Governor::new(&login_quota))
                        .service(auth::login),
                )
                .configure(config),
        );
    })
}

/// Registers the `/api` routes. Everything except `/auth` requires a bearer token.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(
            web::scope("/auth")
                .service(auth::register)
                .service(auth::refresh)
                .service(auth::logout),
        )
        .service(
            web::scope("/projects")
                .wrap(AuthMiddleware)
                .service(projects::list_projects)
                .service(projects::create_project)
                .service(projects::get_project)
                .service(projects::update_project)
                .service(projects::delete_project),
        )
        .service(
            web::scope("/tasks")
                .wrap(AuthMiddleware)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound(format!(
        "Route not found: {} {}",
        req.method(),
        req.path()
    )))
}
