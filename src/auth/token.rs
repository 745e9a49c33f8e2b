use crate::config::JwtSettings;
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the claims encoded within both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Signing material and lifetime for one class of token.
struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn sign(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user_id,
            iat,
            exp: iat + self.ttl.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to sign token: {}", e)))
    }

    /// Signature, shape and expiry all collapse into `InvalidToken`.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        // Expiry is checked below against the caller's clock, without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)?;

        if now.timestamp() >= claims.exp {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }
}

/// Issues and verifies access and refresh tokens.
///
/// The two classes are signed with distinct secrets, so a refresh token never passes the
/// access verifier and vice versa. Built once at startup and shared read-only between
/// workers.
pub struct TokenService {
    access: TokenKeys,
    refresh: TokenKeys,
}

impl TokenService {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            access: TokenKeys::new(&settings.access_secret, settings.access_ttl),
            refresh: TokenKeys::new(&settings.refresh_secret, settings.refresh_ttl),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access.ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh.ttl
    }

    pub fn sign_access(&self, user_id: Uuid) -> Result<String, AppError> {
        self.sign_access_at(user_id, Utc::now())
    }

    pub fn sign_access_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        self.access.sign(user_id, now)
    }

    pub fn sign_refresh(&self, user_id: Uuid) -> Result<String, AppError> {
        self.sign_refresh_at(user_id, Utc::now())
    }

    pub fn sign_refresh_at(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<String, AppError> {
        self.refresh.sign(user_id, now)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_access_at(token, Utc::now())
    }

    pub fn verify_access_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        self.access.verify(token, now)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AppError> {
        self.verify_refresh_at(token, Utc::now())
    }

    pub fn verify_refresh_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AppError> {
        self.refresh.verify(token, now)
    }
}
