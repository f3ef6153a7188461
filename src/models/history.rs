use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SearchHistory {
    pub user_id: String,
    pub keyword: String,
    pub count: i64,
    pub last_searched_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ViewHistory {
    pub user_id: String,
    pub housing_id: String,
    pub count: i64,
    pub last_viewed_at: String,
}
