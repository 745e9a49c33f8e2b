#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;

use actix_http::Request;
use actix_web::{
    body::MessageBody,
    cookie::Cookie,
    dev::{Service, ServiceResponse},
    http::{header, StatusCode},
    test, App, Error,
};
use serde_json::{json, Value};

use devbase::config::Config;
use devbase::cors::{self, CorsGuard};
use devbase::repository::Repositories;
use devbase::security::security_headers;
use devbase::{configure_app, routes, AppState};

pub const PASSWORD: &str = "password123";

/// Configuration for tests: fast bcrypt, fixed secrets, optional overrides.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "postgres://unused"),
        ("JWT_ACCESS_SECRET", "test-access-secret"),
        ("JWT_REFRESH_SECRET", "test-refresh-secret"),
        ("BCRYPT_COST", "4"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_vars(|name| vars.get(name).cloned()).expect("test config must be valid")
}

/// The full application over in-memory repositories, wired like `main`.
pub async fn spawn_app_with(
    config: Config,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    let api = routes::api(&config.rate_limits).expect("quotas must be valid");
    let state = AppState::new(&config, Repositories::in_memory());
    test::init_service(
        App::new()
            .wrap(cors::build(&config.cors_origin))
            .wrap(CorsGuard::new(config.cors_origin.clone()))
            .wrap(security_headers())
            .configure(configure_app(state, api)),
    )
    .await
}

pub async fn spawn_app(
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    spawn_app_with(test_config(&[])).await
}

/// Result of a successful registration.
pub struct Session {
    pub access_token: String,
    pub refresh_cookie: Cookie<'static>,
    pub user: Value,
}

impl Session {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.access_token))
    }

    pub fn user_id(&self) -> String {
        self.user["id"].as_str().unwrap_or_default().to_string()
    }
}

/// Address every test client connects from. Quotas are counted per peer IP.
pub fn client_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40000))
}

/// Finishes a test request the way a real connection would arrive.
pub fn request(req: test::TestRequest) -> Request {
    req.peer_addr(client_addr()).to_request()
}

pub fn refresh_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "refreshToken")
        .map(|c| c.into_owned())
}

pub async fn register<S, B>(app: &S, email: &str) -> Session
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({ "email": email, "password": PASSWORD }));
    let resp = test::call_service(app, request(req)).await;
    assert_eq!(resp.status(), StatusCode::CREATED, "registration failed");

    let refresh_cookie = refresh_cookie(&resp).expect("register sets the refresh cookie");
    let body: Value = test::read_body_json(resp).await;
    Session {
        access_token: body["accessToken"]
            .as_str()
            .expect("accessToken in body")
            .to_string(),
        refresh_cookie,
        user: body["user"].clone(),
    }
}

/// Sends a JSON request and returns the status with the parsed body (`Null` when empty
/// or not JSON). A middleware error is reported by its status.
pub async fn send<S, B>(app: &S, req: test::TestRequest) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let resp = match test::try_call_service(app, request(req)).await {
        Ok(resp) => resp,
        Err(e) => return (e.error_response().status(), Value::Null),
    };
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

pub async fn create_project<S, B>(app: &S, session: &Session, name: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/projects")
        .insert_header(session.bearer())
        .set_json(json!({ "name": name }));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "project creation failed: {}", body);
    body["project"].clone()
}

pub async fn create_task<S, B>(app: &S, session: &Session, project_id: &str, title: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(session.bearer())
        .set_json(json!({ "projectId": project_id, "title": title }));
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "task creation failed: {}", body);
    body
}
