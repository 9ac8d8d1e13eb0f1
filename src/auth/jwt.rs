//! JWT token generation and validation
//! Implements access token + refresh token pattern

use crate::{
    auth::clock::{Clock, SystemClock},
    config::SecurityConfig,
    error::AppError,
};
use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Minimum HS256 secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Token kind, carried in every token so access and refresh tokens
/// cannot stand in for each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// Token type (access or refresh)
    pub token_type: TokenKind,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::InvalidToken)
    }
}

/// Token pair response
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    /// Create JWT service with an explicit secret, TTLs and clock
    pub fn new(
        secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(format!(
                "JWT secret too short (min {} chars)",
                MIN_SECRET_LEN
            )));
        }

        // Expiry is checked against the injected clock in validate_token
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
            clock,
        })
    }

    /// Create JWT service from config, using the system clock
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    pub fn from_config_with_clock(
        config: &SecurityConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppError> {
        Self::new(
            config.jwt_secret.expose_secret(),
            ttl_from_secs("access_token_exp_secs", config.access_token_exp_secs)?,
            ttl_from_secs("refresh_token_exp_secs", config.refresh_token_exp_secs)?,
            clock,
        )
    }

    fn generate(&self, user_id: &Uuid, kind: TokenKind) -> Result<String, AppError> {
        let now = self.clock.now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };

        let claims = Claims {
            sub: user_id.to_string(),
            token_type: kind,
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(ttl)
                .ok_or_else(|| AppError::Internal(format!("{:?} token expiry overflows", kind)))?
                .timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(?kind, "Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode token: {}", e))
        })
    }

    /// Generate access token
    pub fn generate_access_token(&self, user_id: &Uuid) -> Result<String, AppError> {
        self.generate(user_id, TokenKind::Access)
    }

    /// Generate refresh token
    pub fn generate_refresh_token(&self, user_id: &Uuid) -> Result<String, AppError> {
        self.generate(user_id, TokenKind::Refresh)
    }

    /// Generate token pair
    pub fn generate_token_pair(&self, user_id: &Uuid) -> Result<TokenPair, AppError> {
        let access_token = self.generate_access_token(user_id)?;

        let refresh_token = self.generate_refresh_token(user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validate signature, structure and expiry
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {:?}", e);
                AppError::InvalidToken
            })?
            .claims;

        if claims.exp <= self.clock.now().timestamp() {
            tracing::debug!(sub = %claims.sub, exp = claims.exp, "Token expired");
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }

    fn validate_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, AppError> {
        let claims = self.validate_token(token)?;

        if claims.token_type != expected {
            tracing::debug!(
                ?expected,
                actual = ?claims.token_type,
                "Token type mismatch"
            );
            return Err(AppError::InvalidToken);
        }

        Ok(claims)
    }

    /// Validate access token specifically
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.validate_kind(token, TokenKind::Access)
    }

    /// Validate refresh token specifically
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.validate_kind(token, TokenKind::Refresh)
    }
}

/// Convert a configured TTL in seconds, rejecting values chrono cannot hold
fn ttl_from_secs(name: &str, secs: u64) -> Result<Duration, AppError> {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| AppError::Config(format!("{} out of range: {}", name, secs)))
}
