use crate::{
    auth::{AuthResponse, AuthService, AuthSession, LoginRequest, RefreshResponse, RegisterRequest},
    error::AppError,
    state::CookieSettings,
};
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    post, web, HttpRequest, HttpResponse, Responder,
};
use serde_json::json;
use validator::Validate;

pub const REFRESH_COOKIE: &str = "refreshToken";
const REFRESH_COOKIE_PATH: &str = "/api/auth";
const REFRESH_COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

fn refresh_cookie(token: String, settings: &CookieSettings) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token)
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure)
        .max_age(CookieDuration::seconds(REFRESH_COOKIE_MAX_AGE_SECS))
        .finish()
}

/// Session response: access token in the body, refresh token in the cookie only.
fn session_response(
    mut builder: actix_web::HttpResponseBuilder,
    session: AuthSession,
    settings: &CookieSettings,
) -> HttpResponse {
    builder
        .cookie(refresh_cookie(session.refresh_token, settings))
        .json(AuthResponse {
            access_token: session.access_token,
            user: session.user,
        })
}

/// Register a new user
///
/// Creates the account and opens a session.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let request = body.into_inner().normalized();
    request.validate()?;

    let session = auth.register(request).await?;
    Ok(session_response(HttpResponse::Created(), session, &cookies))
}

/// Login user. Mounted at `/api/auth/login` behind its own quota.
#[post("")]
pub async fn login(
    auth: web::Data<AuthService>,
    cookies: web::Data<CookieSettings>,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let request = body.into_inner().normalized();
    request.validate()?;

    let session = auth.login(request).await?;
    Ok(session_response(HttpResponse::Ok(), session, &cookies))
}

/// Exchange the refresh cookie for a new access token.
#[post("/refresh")]
pub async fn refresh(
    auth: web::Data<AuthService>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let cookie = req
        .cookie(REFRESH_COOKIE)
        .ok_or_else(|| AppError::Unauthorized("Missing refresh token cookie".into()))?;

    let access_token = auth.refresh_access_token(cookie.value()).await?;
    Ok(HttpResponse::Ok().json(RefreshResponse { access_token }))
}

/// Clears the refresh cookie. Succeeds whether or not a session exists.
#[post("/logout")]
pub async fn logout(cookies: web::Data<CookieSettings>) -> impl Responder {
    let mut removal = refresh_cookie(String::new(), &cookies);
    removal.make_removal();
    HttpResponse::Ok().cookie(removal).json(json!({ "ok": true }))
}
