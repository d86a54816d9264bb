//! Server-side whitelist of refresh sessions.
//!
//! A bearer JWT cannot be revoked before it expires, so every refresh token is
//! backed by a session record keyed by its `jti`. A secondary index maps each
//! user to the set of their `jti`s; it may briefly reference expired records,
//! which reads prune.

use crate::cache::Expiring;
use crate::db::UserId;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub jti: String,
    pub user_id: UserId,
    pub role_id: i64,
    pub user_agent: String,
    pub ip: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, role_id: i64, user_agent: String, ip: String) -> Self {
        Self {
            jti: String::new(),
            user_id,
            role_id,
            user_agent,
            ip,
            created_at: Utc::now(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Writes the record and its index membership as one unit.
    async fn create(&self, jti: &str, session: Session, ttl: Duration) -> Result<(), StoreError>;

    async fn get_by_jti(&self, jti: &str) -> Result<Session, StoreError>;

    /// Live sessions of a user. Index members that no longer resolve are
    /// dropped from the index and skipped.
    async fn get_all_by_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError>;

    /// Removes the record and its index membership as one unit.
    async fn delete(&self, jti: &str) -> Result<(), StoreError>;

    /// Evicts expired records and stale index members, returning how many
    /// records were evicted.
    async fn purge_expired(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
struct SessionTable {
    records: HashMap<String, Expiring<Session>>,
    index: HashMap<UserId, HashSet<String>>,
}

impl SessionTable {
    fn unindex(&mut self, user_id: UserId, jti: &str) {
        if let Some(members) = self.index.get_mut(&user_id) {
            members.remove(jti);
            if members.is_empty() {
                self.index.remove(&user_id);
            }
        }
    }
}

/// Session whitelist held in process memory. Each operation runs under a
/// single lock acquisition, so paired record/index writes never interleave.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    table: Arc<RwLock<SessionTable>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, jti: &str, mut session: Session, ttl: Duration) -> Result<(), StoreError> {
        if jti.is_empty() {
            return Err(StoreError::Internal("empty session key".to_string()));
        }
        session.jti = jti.to_string();
        let user_id = session.user_id;

        let mut table = self.table.write().await;
        if let Some(previous) = table.records.remove(jti) {
            let owner = previous.value.user_id;
            table.unindex(owner, jti);
        }
        table.records.insert(jti.to_string(), Expiring::new(session, ttl));
        table.index.entry(user_id).or_default().insert(jti.to_string());

        Ok(())
    }

    async fn get_by_jti(&self, jti: &str) -> Result<Session, StoreError> {
        let table = self.table.read().await;
        table
            .records
            .get(jti)
            .and_then(Expiring::live)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_all_by_user(&self, user_id: UserId) -> Result<Vec<Session>, StoreError> {
        let mut table = self.table.write().await;

        let members: Vec<String> = match table.index.get(&user_id) {
            Some(members) => members.iter().cloned().collect(),
            None => return Ok(Vec::new()),
        };

        let mut sessions = Vec::with_capacity(members.len());
        for jti in members {
            let live = table.records.get(&jti).and_then(Expiring::live).cloned();
            match live {
                Some(session) => sessions.push(session),
                None => {
                    debug!("Pruning stale session {} from index of user {}", jti, user_id);
                    table.records.remove(&jti);
                    table.unindex(user_id, &jti);
                }
            }
        }

        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sessions)
    }

    async fn delete(&self, jti: &str) -> Result<(), StoreError> {
        let mut table = self.table.write().await;

        let record = table.records.remove(jti).ok_or(StoreError::NotFound)?;
        let owner = record.value.user_id;
        table.unindex(owner, jti);

        if record.is_expired() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut table = self.table.write().await;

        let before = table.records.len();
        table.records.retain(|_, record| !record.is_expired());
        let purged = before - table.records.len();

        let SessionTable { records, index } = &mut *table;
        index.retain(|_, members| {
            members.retain(|jti| records.contains_key(jti));
            !members.is_empty()
        });

        Ok(purged)
    }
}
