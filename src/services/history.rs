use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::models::SearchHistory;

#[derive(Debug, Clone, FromRow)]
pub struct ViewedHousing {
    pub housing_id: String,
    pub housing_name: String,
    pub count: i64,
    pub last_viewed_at: String,
}

/// Count one more search for `keyword`. Blank keywords are not recorded.
pub async fn record_search(db: &SqlitePool, user_id: &str, keyword: &str) -> Result<(), sqlx::Error> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO search_history (user_id, keyword, count, last_searched_at)
        VALUES (?, ?, 1, ?)
        ON CONFLICT (user_id, keyword)
        DO UPDATE SET count = count + 1, last_searched_at = excluded.last_searched_at
        "#,
    )
    .bind(user_id)
    .bind(&keyword)
    .bind(Utc::now().to_rfc3339())
    .execute(db)
    .await?;
    Ok(())
}

/// Bump the housing's view counter, and the viewer's own history when the
/// viewer is logged in.
pub async fn record_view(
    db: &SqlitePool,
    user_id: Option<&str>,
    housing_id: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;

    sqlx::query("UPDATE housings SET view_count = view_count + 1 WHERE id = ?")
        .bind(housing_id)
        .execute(&mut *tx)
        .await?;

    if let Some(user_id) = user_id {
        sqlx::query(
            r#"
            INSERT INTO view_history (user_id, housing_id, count, last_viewed_at)
            VALUES (?, ?, 1, ?)
            ON CONFLICT (user_id, housing_id)
            DO UPDATE SET count = count + 1, last_viewed_at = excluded.last_viewed_at
            "#,
        )
        .bind(user_id)
        .bind(housing_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn searches(db: &SqlitePool, user_id: &str) -> Result<Vec<SearchHistory>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM search_history WHERE user_id = ? ORDER BY count DESC, last_searched_at DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn views(db: &SqlitePool, user_id: &str) -> Result<Vec<ViewedHousing>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT v.housing_id, h.name AS housing_name, v.count, v.last_viewed_at
        FROM view_history v JOIN housings h ON h.id = v.housing_id
        WHERE v.user_id = ?
        ORDER BY v.last_viewed_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}
