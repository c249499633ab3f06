use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// URL of the current profile picture in the remote asset store.
    /// Written only by the avatar service; `None` when the user has never
    /// uploaded one.
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(first_name: String, last_name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email,
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Placeholder shown in place of an avatar, e.g. "JD" for Jane Doe.
    pub fn initials(&self) -> String {
        let mut initials = String::new();
        if let Some(first) = self.first_name.chars().next() {
            initials.extend(first.to_uppercase());
        }
        if let Some(last) = self.last_name.chars().next() {
            initials.extend(last.to_uppercase());
        }
        initials
    }
}
