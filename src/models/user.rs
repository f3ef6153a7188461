use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An account. The password hash stays in the database and is never
/// loaded into this struct, so a `User` is safe to keep in the session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn new(username: String, email: String, first_name: String, last_name: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email: email.trim().to_lowercase(),
            first_name,
            last_name,
            is_staff: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}
