use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type UserId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: i64,
    pub phone_verified_at: Option<DateTime<Utc>>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Row data for a user that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub role_id: i64,
}

impl NewUser {
    pub fn into_user(self, id: UserId) -> User {
        let now = Utc::now();
        User {
            id,
            phone_number: self.phone_number,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            role_id: self.role_id,
            phone_verified_at: None,
            email_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
