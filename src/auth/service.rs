use std::sync::Arc;

use log::{info, warn};

use super::{LoginRequest, PasswordHasher, RegisterRequest, TokenService};
use crate::error::AppError;
use crate::models::{NewUser, PublicUser};
use crate::repository::UserRepository;

/// Outcome of a successful register or login.
#[derive(Debug)]
pub struct AuthSession {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Registration, login and access-token refresh.
///
/// Stateless apart from the user store: no session or revocation list is kept.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<TokenService>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
        }
    }

    /// Expects an already validated and normalized request.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AppError> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::EmailAlreadyInUse);
        }

        let password_hash = self.hash_password(request.password).await?;
        let user = self
            .users
            .create(NewUser {
                email: request.email,
                password_hash,
                name: request.name,
            })
            .await?;
        info!("Registered user {}", user.id);

        self.open_session(user)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AppError> {
        let user = match self.users.find_by_email(&request.email).await? {
            Some(user) => user,
            None => {
                warn!("Failed login: unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self
            .verify_password(request.password, user.password_hash.clone())
            .await?
        {
            warn!("Failed login for user {}", user.id);
            return Err(AppError::InvalidCredentials);
        }

        self.open_session(user.into())
    }

    /// Issues a new access token. The refresh token itself is not rotated.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;
        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;
        self.tokens.sign_access(user.id)
    }

    fn open_session(&self, user: PublicUser) -> Result<AuthSession, AppError> {
        let access_token = self.tokens.sign_access(user.id)?;
        let refresh_token = self.tokens.sign_refresh(user.id)?;
        Ok(AuthSession {
            user,
            access_token,
            refresh_token,
        })
    }

    // bcrypt is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, password: String, digest: String) -> Result<bool, AppError> {
        let hasher = self.hasher;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AppError::InternalServerError(format!("Verification task failed: {}", e)))
    }
}
