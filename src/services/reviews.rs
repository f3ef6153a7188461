use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;

use crate::models::{Review, User};
use crate::policy::{check_review_eligibility, ReviewRejection};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Rejected(#[from] ReviewRejection),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReviewWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub author: String,
}

/// Store a review if the user booked the housing (any booking that was not
/// cancelled) and has not reviewed it before.
pub async fn create(
    db: &SqlitePool,
    user: &User,
    housing_id: &str,
    rating: i64,
    text: String,
) -> Result<Review, ReviewError> {
    let mut tx = db.begin().await?;

    let (bookings,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM bookings WHERE owner_id = ? AND housing_id = ? AND status != 'CANCELED'",
    )
    .bind(&user.id)
    .bind(housing_id)
    .fetch_one(&mut *tx)
    .await?;

    let (reviews,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE owner_id = ? AND housing_id = ?")
            .bind(&user.id)
            .bind(housing_id)
            .fetch_one(&mut *tx)
            .await?;

    check_review_eligibility(bookings > 0, reviews > 0).inspect_err(|reason| {
        tracing::info!(%housing_id, user_id = %user.id, %reason, "review rejected");
    })?;

    let review = Review::new(user.id.clone(), housing_id.to_string(), rating, text);
    sqlx::query(
        "INSERT INTO reviews (id, owner_id, housing_id, rating, text, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&review.id)
    .bind(&review.owner_id)
    .bind(&review.housing_id)
    .bind(review.rating)
    .bind(&review.text)
    .bind(&review.created_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(review_id = %review.id, %housing_id, rating, "review created");
    Ok(review)
}

pub async fn for_housing(
    db: &SqlitePool,
    housing_id: &str,
) -> Result<Vec<ReviewWithAuthor>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT r.*, u.username AS author
        FROM reviews r JOIN users u ON u.id = r.owner_id
        WHERE r.housing_id = ?
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(housing_id)
    .fetch_all(db)
    .await
}

/// Reviews of the housings `viewer` may read: visible ones, their own, or
/// all of them for staff.
pub async fn list(
    db: &SqlitePool,
    viewer: &User,
    housing_id: Option<&str>,
) -> Result<Vec<Review>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT r.* FROM reviews r JOIN housings h ON h.id = r.housing_id WHERE 1 = 1",
    );
    if !viewer.is_staff {
        query
            .push(" AND (h.is_visible = 1 OR h.owner_id = ")
            .push_bind(viewer.id.clone())
            .push(")");
    }
    if let Some(housing_id) = housing_id {
        query.push(" AND r.housing_id = ").push_bind(housing_id.to_string());
    }
    query.push(" ORDER BY r.created_at DESC, r.id");

    query.build_query_as().fetch_all(db).await
}

pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM reviews WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn update(db: &SqlitePool, id: &str, rating: i64, text: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE reviews SET rating = ?, text = ? WHERE id = ?")
        .bind(rating)
        .bind(text)
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM reviews WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
