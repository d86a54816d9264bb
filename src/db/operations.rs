use crate::db::models::{NewUser, Role, User, UserId};
use crate::db::UserRepository;
use crate::error::RepoError;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

const USER_COLUMNS: &str = "id, phone_number, email, name, password_hash, role_id, \
                            phone_verified_at, email_verified_at, created_at, updated_at";

pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, RepoError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub fn pool(&self) -> &Arc<PgPool> {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), RepoError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| RepoError::Internal(e.to_string()))
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<User, RepoError> {
        debug!("Looking up user by {}", column);
        let query = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);

        sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| {
                error!("Failed to load user by {}: {}", column, e);
                RepoError::from(e)
            })?
            .ok_or(RepoError::NotFound)
    }

    async fn touch_verified(&self, column: &str, id: UserId) -> Result<(), RepoError> {
        let query = format!(
            "UPDATE users SET {} = NOW(), updated_at = NOW() WHERE id = $1",
            column
        );

        let result = sqlx::query(&query)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<User, RepoError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError> {
        self.find_one("email", email).await
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<User, RepoError> {
        self.find_one("phone_number", phone_number).await
    }

    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let query = format!(
            r#"
            INSERT INTO users (name, phone_number, email, password_hash, role_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let mut transaction = self.pool.as_ref().begin().await?;

        let result = sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(&user.phone_number)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role_id)
            .fetch_one(&mut *transaction)
            .await;

        match result {
            Ok(user) => {
                transaction.commit().await?;
                Ok(user)
            }
            Err(e) => {
                transaction.rollback().await?;
                Err(e.into())
            }
        }
    }

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn mark_email_verified(&self, id: UserId) -> Result<(), RepoError> {
        self.touch_verified("email_verified_at", id).await
    }

    async fn mark_phone_verified(&self, id: UserId) -> Result<(), RepoError> {
        self.touch_verified("phone_verified_at", id).await
    }

    async fn get_role(&self, id: i64) -> Result<Role, RepoError> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(RepoError::NotFound)
    }
}
