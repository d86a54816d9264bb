//! User repository.
//!
//! The engine reads identities and writes verification/password changes
//! through [`UserRepository`]; PostgreSQL and in-memory backends are provided.

pub mod memory;
pub mod models;
pub mod operations;

pub use memory::InMemoryUserRepository;
pub use models::{NewUser, Role, User, UserId};
pub use operations::PgUserRepository;

use crate::error::RepoError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<User, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<User, RepoError>;

    async fn find_by_phone(&self, phone_number: &str) -> Result<User, RepoError>;

    /// Fails with [`RepoError::UniqueViolation`] when the phone or email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<(), RepoError>;

    async fn mark_email_verified(&self, id: UserId) -> Result<(), RepoError>;

    async fn mark_phone_verified(&self, id: UserId) -> Result<(), RepoError>;

    async fn get_role(&self, id: i64) -> Result<Role, RepoError>;
}
