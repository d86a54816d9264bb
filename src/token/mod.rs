//! Signed bearer tokens.
//!
//! Tokens are compact HS256 JWTs. The codec is stateless: whether a refresh
//! token is still honoured is decided by the session whitelist, not here.

use crate::error::TokenError;
use crate::db::UserId;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    Refresh,
}

impl fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenPurpose::Access => f.write_str("access"),
            TokenPurpose::Refresh => f.write_str("refresh"),
        }
    }
}

/// Identity carried by a token, independent of its timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub user_name: String,
    pub role_id: i64,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: UserId,
    pub user_name: String,
    pub role_id: i64,
    pub jti: String,
    #[serde(rename = "typ")]
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub,
            user_name: self.user_name.clone(),
            role_id: self.role_id,
            jti: self.jti.clone(),
        }
    }
}

pub fn issue(
    identity: &Identity,
    issuer: &str,
    secret: &str,
    ttl: Duration,
    purpose: TokenPurpose,
) -> Result<String, TokenError> {
    let now = Utc::now();
    let claims = Claims {
        iss: issuer.to_string(),
        sub: identity.user_id,
        user_name: identity.user_name.clone(),
        role_id: identity.role_id,
        jti: identity.jti.clone(),
        purpose,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn verify(
    token: &str,
    secret: &str,
    issuer: &str,
    purpose: TokenPurpose,
) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    if data.claims.purpose != purpose {
        return Err(TokenError::PurposeMismatch);
    }

    Ok(data.claims)
}

/// Access and refresh tokens minted together for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub jti: String,
}

/// Deployment-wide signing parameters.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: String, issuer: String, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            secret,
            issuer,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        let access_token = issue(identity, &self.issuer, &self.secret, self.access_ttl, TokenPurpose::Access)?;
        let refresh_token = issue(identity, &self.issuer, &self.secret, self.refresh_ttl, TokenPurpose::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            jti: identity.jti.clone(),
        })
    }

    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        verify(token, &self.secret, &self.issuer, purpose)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
