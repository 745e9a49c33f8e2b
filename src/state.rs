use std::sync::Arc;

use actix_web::web;

use crate::auth::{AuthService, PasswordHasher, TokenService};
use crate::config::Config;
use crate::repository::Repositories;
use crate::services::{ProjectService, TaskService};

/// Attributes of the `refreshToken` cookie that depend on the environment.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

/// What `/health` reports about the running service.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub env: String,
}

impl ServiceInfo {
    pub fn new(env: impl Into<String>) -> Self {
        Self {
            name: "devbase-api",
            env: env.into(),
        }
    }
}

/// Everything the handlers need, built once and cloned into each worker.
#[derive(Clone)]
pub struct AppState {
    pub tokens: web::Data<TokenService>,
    pub auth: web::Data<AuthService>,
    pub projects: web::Data<ProjectService>,
    pub tasks: web::Data<TaskService>,
    pub cookies: web::Data<CookieSettings>,
    pub info: web::Data<ServiceInfo>,
}

impl AppState {
    pub fn new(config: &Config, repos: Repositories) -> Self {
        let tokens = Arc::new(TokenService::new(&config.jwt));
        let auth = AuthService::new(
            repos.users,
            Arc::clone(&tokens),
            PasswordHasher::new(config.bcrypt_cost),
        );

        Self {
            tokens: web::Data::from(tokens),
            auth: web::Data::new(auth),
            projects: web::Data::new(ProjectService::new(Arc::clone(&repos.projects))),
            tasks: web::Data::new(TaskService::new(repos.tasks, repos.projects)),
            cookies: web::Data::new(CookieSettings {
                secure: config.is_production(),
            }),
            info: web::Data::new(ServiceInfo::new(config.app_env.clone())),
        }
    }

    /// Registers the shared state as app data.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.tokens.clone())
            .app_data(self.auth.clone())
            .app_data(self.projects.clone())
            .app_data(self.tasks.clone())
            .app_data(self.cookies.clone())
            .app_data(self.info.clone());
    }
}
