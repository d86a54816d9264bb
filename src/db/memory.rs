use crate::db::models::{NewUser, Role, User, UserId};
use crate::db::UserRepository;
use crate::error::RepoError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct UserTable {
    users: HashMap<UserId, User>,
    next_id: UserId,
}

impl UserTable {
    fn by<F>(&self, predicate: F) -> Result<User, RepoError>
    where
        F: Fn(&User) -> bool,
    {
        self.users
            .values()
            .find(|u| predicate(u))
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    fn get_mut(&mut self, id: UserId) -> Result<&mut User, RepoError> {
        self.users.get_mut(&id).ok_or(RepoError::NotFound)
    }
}

/// Process-local user repository with the same uniqueness rules as the
/// PostgreSQL schema.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    table: Arc<RwLock<UserTable>>,
    roles: Arc<HashMap<i64, Role>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        let roles = [(1, "admin"), (2, "manager"), (3, "user")]
            .into_iter()
            .map(|(id, name)| {
                (
                    id,
                    Role {
                        id,
                        name: name.to_string(),
                        description: None,
                    },
                )
            })
            .collect();

        Self {
            table: Arc::new(RwLock::new(UserTable {
                users: HashMap::new(),
                next_id: 1,
            })),
            roles: Arc::new(roles),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<User, RepoError> {
        self.table
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError> {
        self.table.read().await.by(|u| u.email.as_deref() == Some(email))
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<User, RepoError> {
        self.table
            .read()
            .await
            .by(|u| u.phone_number.as_deref() == Some(phone_number))
    }

    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        if !self.roles.contains_key(&user.role_id) {
            return Err(RepoError::Internal(format!("role {} does not exist", user.role_id)));
        }

        let mut table = self.table.write().await;

        for existing in table.users.values() {
            if user.email.is_some() && existing.email == user.email {
                return Err(RepoError::UniqueViolation("users_email_key".to_string()));
            }
            if user.phone_number.is_some() && existing.phone_number == user.phone_number {
                return Err(RepoError::UniqueViolation("users_phone_number_key".to_string()));
            }
        }

        let id = table.next_id;
        table.next_id += 1;

        let created = user.into_user(id);
        table.users.insert(id, created.clone());
        Ok(created)
    }

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<(), RepoError> {
        let mut table = self.table.write().await;
        let user = table.get_mut(id)?;
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_email_verified(&self, id: UserId) -> Result<(), RepoError> {
        let mut table = self.table.write().await;
        let user = table.get_mut(id)?;
        let now = Utc::now();
        user.email_verified_at = Some(now);
        user.updated_at = now;
        Ok(())
    }

    async fn mark_phone_verified(&self, id: UserId) -> Result<(), RepoError> {
        let mut table = self.table.write().await;
        let user = table.get_mut(id)?;
        let now = Utc::now();
        user.phone_verified_at = Some(now);
        user.updated_at = now;
        Ok(())
    }

    async fn get_role(&self, id: i64) -> Result<Role, RepoError> {
        self.roles.get(&id).cloned().ok_or(RepoError::NotFound)
    }
}
