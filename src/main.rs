use actix_web::{middleware::Logger, App, HttpServer};
use log::{error, info};
use sqlx::postgres::PgPoolOptions;

use devbase::config::Config;
use devbase::cors::{self, CorsGuard};
use devbase::repository::Repositories;
use devbase::security::security_headers;
use devbase::{configure_app, routes, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let api = match routes::api(&config.rate_limits) {
        Ok(api) => api,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let state = AppState::new(&config, Repositories::postgres(pool));
    let origins = config.cors_origin.clone();

    info!(
        "Starting devbase server at {} ({})",
        config.server_url(),
        config.app_env
    );
    HttpServer::new(move || {
        App::new()
            .wrap(cors::build(&origins))
            .wrap(CorsGuard::new(origins.clone()))
            .wrap(security_headers())
            .wrap(Logger::default())
            .configure(configure_app(state.clone(), api.clone()))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
