//! One-time passcodes for proving control of a phone number or email address.

use crate::cache::Expiring;
use crate::db::UserId;
use crate::error::{AuthError, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

pub const CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Phone,
    Email,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Phone => "phone",
            OtpPurpose::Email => "email",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phone" => Ok(OtpPurpose::Phone),
            "email" => Ok(OtpPurpose::Email),
            other => Err(AuthError::UnsupportedPurpose(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub code: String,
    pub purpose: OtpPurpose,
    pub address: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Fresh record with a newly generated code.
    pub fn generate(purpose: OtpPurpose, address: &str, user_id: UserId, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            code: generate_code(),
            purpose,
            address: address.to_string(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Constant-time comparison against a submitted code.
    pub fn matches(&self, candidate: &str) -> bool {
        self.code.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

/// `CODE_LENGTH` decimal digits drawn from the operating system's CSPRNG.
pub fn generate_code() -> String {
    let n: u32 = OsRng.gen_range(0..10u32.pow(CODE_LENGTH as u32));
    format!("{:0width$}", n, width = CODE_LENGTH)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Set-if-absent: fails with [`StoreError::AlreadyExists`] while a live
    /// record exists for the same purpose and address.
    async fn save(&self, record: OtpRecord, ttl: Duration) -> Result<(), StoreError>;

    async fn get(&self, purpose: OtpPurpose, address: &str) -> Result<OtpRecord, StoreError>;

    /// Idempotent.
    async fn delete(&self, purpose: OtpPurpose, address: &str) -> Result<(), StoreError>;

    async fn purge_expired(&self) -> Result<usize, StoreError>;
}

type OtpKey = (OtpPurpose, String);

#[derive(Debug, Clone, Default)]
pub struct InMemoryOtpStore {
    records: Arc<RwLock<HashMap<OtpKey, Expiring<OtpRecord>>>>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for InMemoryOtpStore {
    async fn save(&self, record: OtpRecord, ttl: Duration) -> Result<(), StoreError> {
        let key = (record.purpose, record.address.clone());
        let mut records = self.records.write().await;

        if records.get(&key).and_then(Expiring::live).is_some() {
            return Err(StoreError::AlreadyExists);
        }
        records.insert(key, Expiring::new(record, ttl));
        Ok(())
    }

    async fn get(&self, purpose: OtpPurpose, address: &str) -> Result<OtpRecord, StoreError> {
        let records = self.records.read().await;
        records
            .get(&(purpose, address.to_string()))
            .and_then(Expiring::live)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, purpose: OtpPurpose, address: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .await
            .remove(&(purpose, address.to_string()));
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired());
        Ok(before - records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio::time::{sleep, Duration as TokioDuration};

    fn record(address: &str) -> OtpRecord {
        OtpRecord::generate(OtpPurpose::Phone, address, 1, Duration::minutes(5))
    }

    #[test]
    fn test_code_format() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_codes_are_not_repeated_in_sequence() {
        let codes: HashSet<String> = (0..50).map(|_| generate_code()).collect();
        assert!(codes.len() > 40);
    }

    #[test]
    fn test_purpose_parsing() {
        assert_eq!("phone".parse::<OtpPurpose>().unwrap(), OtpPurpose::Phone);
        assert_eq!("email".parse::<OtpPurpose>().unwrap(), OtpPurpose::Email);
        assert!(matches!(
            "telegram".parse::<OtpPurpose>(),
            Err(AuthError::UnsupportedPurpose(p)) if p == "telegram"
        ));
    }

    #[test]
    fn test_matches() {
        let mut rec = record("77011234567");
        rec.code = "004211".to_string();
        assert!(rec.matches("004211"));
        assert!(!rec.matches("4211"));
        assert!(!rec.matches("004212"));
    }

    #[tokio::test]
    async fn test_second_save_rejected_while_live() {
        let store = InMemoryOtpStore::new();
        store.save(record("77011234567"), Duration::minutes(5)).await.unwrap();

        assert_eq!(
            store.save(record("77011234567"), Duration::minutes(5)).await.unwrap_err(),
            StoreError::AlreadyExists
        );
        // other keys are independent
        store.save(record("77019876543"), Duration::minutes(5)).await.unwrap();
        let mut email = record("77011234567");
        email.purpose = OtpPurpose::Email;
        store.save(email, Duration::minutes(5)).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_allows_resend() {
        let store = InMemoryOtpStore::new();
        let first = record("77011234567");
        store.save(first.clone(), Duration::minutes(5)).await.unwrap();

        store.delete(OtpPurpose::Phone, "77011234567").await.unwrap();
        store.delete(OtpPurpose::Phone, "77011234567").await.unwrap();
        assert_eq!(
            store.get(OtpPurpose::Phone, "77011234567").await.unwrap_err(),
            StoreError::NotFound
        );

        let second = record("77011234567");
        store.save(second.clone(), Duration::minutes(5)).await.unwrap();
        assert_eq!(store.get(OtpPurpose::Phone, "77011234567").await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_expired_record_can_be_replaced() {
        let store = InMemoryOtpStore::new();
        store.save(record("77011234567"), Duration::milliseconds(50)).await.unwrap();

        sleep(TokioDuration::from_millis(100)).await;

        assert_eq!(
            store.get(OtpPurpose::Phone, "77011234567").await.unwrap_err(),
            StoreError::NotFound
        );
        store.save(record("77011234567"), Duration::minutes(5)).await.unwrap();
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_saves_have_one_winner() {
        let store = InMemoryOtpStore::new();
        let (a, b) = tokio::join!(
            store.save(record("77011234567"), Duration::minutes(5)),
            store.save(record("77011234567"), Duration::minutes(5)),
        );
        assert!(a.is_ok() ^ b.is_ok());
    }
}
