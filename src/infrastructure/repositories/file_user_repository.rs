use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::errors::DomainError;
use crate::domain::models::user::User;
use crate::domain::repositories::user_repository::UserRepository;
use crate::infrastructure::persistence::file_system::{read_json_file, write_json_file};

/// File-based implementation of UserRepository: one JSON document per user.
pub struct FileUserRepository {
    users_dir: PathBuf,
    cache: Arc<Mutex<Vec<User>>>,
}

impl FileUserRepository {
    pub fn new(users_dir: PathBuf) -> Self {
        Self {
            users_dir,
            cache: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn user_path(&self, id: &str) -> PathBuf {
        self.users_dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl UserRepository for FileUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<User, DomainError> {
        {
            let cache = self.cache.lock().await;
            if let Some(user) = cache.iter().find(|u| u.id == id) {
                return Ok(user.clone());
            }
        }

        let file_path = self.user_path(id);
        if !file_path.exists() {
            return Err(DomainError::NotFound(format!("User not found: {}", id)));
        }

        let user = read_json_file::<User>(&file_path).await?;

        let mut cache = self.cache.lock().await;
        if !cache.iter().any(|u| u.id == user.id) {
            cache.push(user.clone());
        }

        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), DomainError> {
        let file_path = self.user_path(&user.id);
        write_json_file(&file_path, user).await?;

        let mut cache = self.cache.lock().await;
        if let Some(index) = cache.iter().position(|u| u.id == user.id) {
            cache[index] = user.clone();
        } else {
            cache.push(user.clone());
        }

        tracing::debug!("Saved user: {}", user.id);
        Ok(())
    }
}
