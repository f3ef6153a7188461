use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: String,
    pub owner_id: String,
    pub housing_id: String,
    pub rating: i64,
    pub text: String,
    pub created_at: String,
}

impl Review {
    pub fn new(owner_id: String, housing_id: String, rating: i64, text: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            housing_id,
            rating,
            text,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}
