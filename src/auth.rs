//! Admin authentication: HS256 bearer tokens and the [`AdminUser`] extractor.
//!
//! There is a single admin account, configured at startup. `POST
//! /api/auth/login` trades its credentials for a token; every admin route
//! takes an [`AdminUser`] parameter, which rejects the request with 401
//! unless a valid admin token is presented.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::errors::AppError;

pub const ADMIN_ROLE: &str = "admin";

/// JWT claims carried by admin tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// A freshly signed token and the moment it stops being accepted.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    ttl: Duration,
}

impl AuthKeys {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
            ttl,
        }
    }

    /// Sign a token for `subject` with the given role.
    pub fn sign(&self, subject: &str, role: &str) -> Result<IssuedToken, AppError> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::internal("token expiry out of range"))?;
        let claims = Claims {
            sub: subject.to_owned(),
            role: role.to_owned(),
            exp: expires_at.timestamp().max(0) as usize,
        };
        let token =
            encode(&Header::default(), &claims, &self.encoding).map_err(AppError::internal)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default()).map(|data| data.claims)
    }
}

/// The configured admin account.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Compare both fields in constant time; both are always compared.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = constant_time_eq(&self.username, username);
        let pass_ok = constant_time_eq(&self.password, password);
        user_ok & pass_ok
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// An authenticated admin, extracted from `Authorization: Bearer <token>`.
#[derive(Debug)]
pub struct AdminUser {
    pub username: String,
}

impl<S> FromRequestParts<S> for AdminUser
where
    AuthKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(AppError::unauthorized)?;

        let keys = AuthKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            AppError::unauthorized()
        })?;

        if claims.role != ADMIN_ROLE {
            return Err(AppError::unauthorized());
        }

        Ok(AdminUser {
            username: claims.sub,
        })
    }
}
