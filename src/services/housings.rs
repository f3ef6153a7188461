use serde::Serialize;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::filters::Criteria;
use crate::models::{Housing, HousingDraft, User};

/// Housing row with the mean of its review ratings (0 without reviews).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HousingWithRating {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub housing: Housing,
    pub average_rating: f64,
    pub review_count: i64,
}

/// Whose eyes a listing query is for.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Anonymous,
    User(&'a User),
}

const SELECT_WITH_RATING: &str = r#"
    SELECT h.*,
        COALESCE((SELECT AVG(r.rating) FROM reviews r WHERE r.housing_id = h.id), 0.0) AS average_rating,
        (SELECT COUNT(*) FROM reviews r WHERE r.housing_id = h.id) AS review_count
    FROM housings h
    WHERE 1 = 1
"#;

pub async fn search(
    db: &SqlitePool,
    criteria: &Criteria,
    scope: Scope<'_>,
) -> Result<Vec<HousingWithRating>, sqlx::Error> {
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_WITH_RATING);

    match scope {
        Scope::Anonymous => {
            query.push(" AND h.is_visible = 1");
        }
        Scope::User(user) if user.is_staff => {}
        Scope::User(user) => {
            query
                .push(" AND (h.is_visible = 1 OR h.owner_id = ")
                .push_bind(user.id.clone())
                .push(")");
        }
    }

    if let Some(kind) = criteria.kind {
        query.push(" AND h.type = ").push_bind(kind.as_str());
    }
    if let Some(min) = criteria.price_min {
        query
            .push(" AND CAST(h.price AS REAL) >= CAST(")
            .push_bind(min.to_string())
            .push(" AS REAL)");
    }
    if let Some(max) = criteria.price_max {
        query
            .push(" AND CAST(h.price AS REAL) <= CAST(")
            .push_bind(max.to_string())
            .push(" AS REAL)");
    }
    if let Some(rooms) = criteria.rooms {
        query.push(" AND h.rooms = ").push_bind(rooms);
    }
    if let Some(keyword) = &criteria.keyword {
        query
            .push(" AND h.search_text LIKE ")
            .push_bind(like_pattern(keyword))
            .push(" ESCAPE '\\'");
    }

    query.push(" ORDER BY ").push(criteria.ordering.to_sql());

    query
        .build_query_as::<HousingWithRating>()
        .fetch_all(db)
        .await
}

/// `%keyword%` with the LIKE wildcards in the keyword taken literally.
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// What the keyword filter matches: the text fields, lowercased here since
/// SQLite's `LOWER` only folds ASCII.
fn search_text(fields: &[&str]) -> String {
    fields.join("\n").to_lowercase()
}

pub async fn find(db: &SqlitePool, id: &str) -> Result<Option<Housing>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM housings WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn find_with_rating(
    db: &SqlitePool,
    id: &str,
) -> Result<Option<HousingWithRating>, sqlx::Error> {
    let sql = format!("{SELECT_WITH_RATING} AND h.id = ?");
    sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Visible housings, newest first.
pub async fn latest_visible(db: &SqlitePool, limit: i64) -> Result<Vec<Housing>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM housings WHERE is_visible = 1 ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn insert(db: &SqlitePool, housing: &Housing) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO housings (id, owner_id, name, type, country, post_code, city, street,
            house_number, rooms, description, price, is_visible, view_count, search_text, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&housing.id)
    .bind(&housing.owner_id)
    .bind(&housing.name)
    .bind(housing.kind)
    .bind(&housing.country)
    .bind(&housing.post_code)
    .bind(&housing.city)
    .bind(&housing.street)
    .bind(&housing.house_number)
    .bind(housing.rooms)
    .bind(&housing.description)
    .bind(&housing.price)
    .bind(housing.is_visible)
    .bind(housing.view_count)
    .bind(search_text(&[
        housing.name.as_str(),
        housing.description.as_str(),
        housing.country.as_str(),
        housing.city.as_str(),
        housing.street.as_deref().unwrap_or_default(),
        housing.post_code.as_str(),
    ]))
    .bind(&housing.created_at)
    .execute(db)
    .await?;

    tracing::info!(housing_id = %housing.id, owner_id = %housing.owner_id, "housing created");
    Ok(())
}

pub async fn update(db: &SqlitePool, id: &str, draft: &HousingDraft) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE housings
        SET name = ?, type = ?, country = ?, post_code = ?, city = ?, street = ?,
            house_number = ?, rooms = ?, description = ?, price = ?, is_visible = ?,
            search_text = ?
        WHERE id = ?
        "#,
    )
    .bind(&draft.name)
    .bind(draft.kind)
    .bind(&draft.country)
    .bind(&draft.post_code)
    .bind(&draft.city)
    .bind(&draft.street)
    .bind(&draft.house_number)
    .bind(draft.rooms)
    .bind(&draft.description)
    .bind(&draft.price)
    .bind(draft.is_visible)
    .bind(search_text(&[
        draft.name.as_str(),
        draft.description.as_str(),
        draft.country.as_str(),
        draft.city.as_str(),
        draft.street.as_deref().unwrap_or_default(),
        draft.post_code.as_str(),
    ]))
    .bind(id)
    .execute(db)
    .await?;
    Ok(())
}

/// Bookings, reviews and view history go with it.
pub async fn delete(db: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM housings WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    tracing::info!(housing_id = %id, "housing deleted");
    Ok(())
}

impl From<Housing> for HousingDraft {
    fn from(h: Housing) -> Self {
        Self {
            name: h.name,
            kind: h.kind,
            country: h.country,
            post_code: h.post_code,
            city: h.city,
            street: h.street,
            house_number: h.house_number,
            rooms: h.rooms,
            description: h.description,
            price: h.price,
            is_visible: h.is_visible,
        }
    }
}
