use crate::db::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: String,
    /// Channel used to confirm the registration: `phone` or `email`.
    pub confirm_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub id: UserId,
    pub name: String,
    pub role_name: String,
    pub otp_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub id: UserId,
    pub name: String,
    pub role_id: i64,
    pub role_name: String,
    pub access_token: String,
    pub refresh_token: String,
    pub jti: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendVerifyResponse {
    pub otp_expires_at: DateTime<Utc>,
}

/// One row of a "manage my devices" view.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub jti: String,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_phone_number: Option<String>,
    pub role_id: i64,
    pub user_agent: String,
    pub ip: String,
    pub created_at: DateTime<Utc>,
}

/// Caller identity established from a valid access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    pub user_name: String,
    pub role_id: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub role_name: String,
}
