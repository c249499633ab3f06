use async_trait::async_trait;

use crate::domain::errors::DomainError;
use crate::domain::models::user::User;

/// Repository for user records
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id
    async fn find_by_id(&self, id: &str) -> Result<User, DomainError>;

    /// Persist a user record
    async fn save(&self, user: &User) -> Result<(), DomainError>;
}
