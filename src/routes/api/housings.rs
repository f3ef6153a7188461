use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::auth::ApiUser;
use crate::error::ApiError;
use crate::filters::HousingFilter;
use crate::forms::{normalize_price, validate_housing, FieldErrors};
use crate::models::{Housing, HousingDraft, HousingType, User};
use crate::policy::{can_read_housing, is_owner_or_admin};
use crate::services::housings::{self, HousingWithRating, Scope};
use crate::services::history;
use crate::AppState;

/// Create/update body. On create every required field must be present; on
/// update absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct HousingPayload {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    country: Option<String>,
    post_code: Option<String>,
    city: Option<String>,
    street: Option<String>,
    house_number: Option<String>,
    rooms: Option<i64>,
    description: Option<String>,
    price: Option<Decimal>,
    is_visible: Option<bool>,
}

impl HousingPayload {
    fn into_draft(self, base: Option<HousingDraft>) -> Result<HousingDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let creating = base.is_none();

        let mut take = |field: &str, value: Option<String>, current: Option<String>| -> String {
            match value.or(current) {
                Some(v) => v.trim().to_string(),
                None => {
                    errors.insert(field.to_string(), "This field is required.".to_string());
                    String::new()
                }
            }
        };

        let base_ref = base.as_ref();
        let name = take("name", self.name, base_ref.map(|b| b.name.clone()));
        let country = take("country", self.country, base_ref.map(|b| b.country.clone()));
        let post_code = take("post_code", self.post_code, base_ref.map(|b| b.post_code.clone()));
        let city = take("city", self.city, base_ref.map(|b| b.city.clone()));
        let description = take(
            "description",
            self.description,
            base_ref.map(|b| b.description.clone()),
        );
        let price = take(
            "price",
            self.price.map(|p| p.to_string()),
            base_ref.map(|b| b.price.clone()),
        );

        let rooms = match self.rooms.or(base_ref.map(|b| b.rooms)) {
            Some(rooms) => rooms,
            None => {
                errors.insert("rooms".to_string(), "This field is required.".to_string());
                1
            }
        };

        let kind = match self.kind {
            Some(raw) => HousingType::parse(&raw).unwrap_or_else(|| {
                errors.insert("type".to_string(), format!("\"{raw}\" is not a valid choice."));
                HousingType::default()
            }),
            None => base_ref.map(|b| b.kind).unwrap_or_default(),
        };

        let keep = |value: Option<String>, current: Option<Option<String>>| {
            value
                .map(|v| v.trim().to_string())
                .or(current.flatten())
                .filter(|v| !v.is_empty())
        };

        let draft = HousingDraft {
            name,
            kind,
            country,
            post_code,
            city,
            street: keep(self.street, base_ref.map(|b| b.street.clone())),
            house_number: keep(self.house_number, base_ref.map(|b| b.house_number.clone())),
            rooms,
            description,
            price,
            is_visible: self
                .is_visible
                .or(base_ref.map(|b| b.is_visible))
                .unwrap_or(creating),
        };

        for (field, message) in validate_housing(&draft) {
            errors.entry(field).or_insert(message);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let price = normalize_price(&draft.price)
            .map_err(|e| FieldErrors::from([("price".to_string(), e)]))?;
        Ok(HousingDraft { price, ..draft })
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/housings", get(list).post(create))
        .route(
            "/housings/{id}",
            get(retrieve).put(update).patch(update).delete(destroy),
        )
}

async fn list(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Query(filter): Query<HousingFilter>,
) -> Result<Json<Vec<HousingWithRating>>, ApiError> {
    let Some(criteria) = filter.criteria() else {
        return Ok(Json(Vec::new()));
    };

    if let Some(keyword) = filter.search_keyword() {
        history::record_search(&state.db, &user.id, &keyword).await?;
    }

    let housings = housings::search(&state.db, &criteria, Scope::User(&user)).await?;
    Ok(Json(housings))
}

async fn create(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Json(payload): Json<HousingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = payload.into_draft(None).map_err(ApiError::Validation)?;

    let housing = Housing::new(user.id, draft);
    housings::insert(&state.db, &housing).await?;

    let created = housings::find_with_rating(&state.db, &housing.id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Load a housing the caller may read, 404 otherwise.
async fn readable(state: &AppState, user: &User, id: &str) -> Result<Housing, ApiError> {
    let housing = housings::find(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    if !can_read_housing(Some(user), &housing) {
        return Err(ApiError::NotFound);
    }
    Ok(housing)
}

async fn retrieve(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<Json<HousingWithRating>, ApiError> {
    readable(&state, &user, &id).await?;
    let item = housings::find_with_rating(&state.db, &id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(item))
}

async fn update(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
    Json(payload): Json<HousingPayload>,
) -> Result<Json<HousingWithRating>, ApiError> {
    let housing = readable(&state, &user, &id).await?;
    if !is_owner_or_admin(&user, &housing.owner_id) {
        return Err(ApiError::Forbidden);
    }

    let draft = payload
        .into_draft(Some(HousingDraft::from(housing)))
        .map_err(ApiError::Validation)?;
    housings::update(&state.db, &id, &draft).await?;

    let item = housings::find_with_rating(&state.db, &id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(item))
}

async fn destroy(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let housing = readable(&state, &user, &id).await?;
    if !is_owner_or_admin(&user, &housing.owner_id) {
        return Err(ApiError::Forbidden);
    }
    housings::delete(&state.db, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> HousingPayload {
        HousingPayload {
            name: Some("Castle".into()),
            kind: Some("castle".into()),
            country: Some("France".into()),
            post_code: Some("75001".into()),
            city: Some("Paris".into()),
            rooms: Some(12),
            description: Some("Towers".into()),
            price: Some(Decimal::new(99950, 2)),
            ..HousingPayload::default()
        }
    }

    #[test]
    fn create_requires_fields() {
        let errors = HousingPayload::default().into_draft(None).unwrap_err();
        for field in ["name", "country", "post_code", "city", "rooms", "description", "price"] {
            assert!(errors.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn create_defaults_visible() {
        let draft = full().into_draft(None).unwrap();
        assert!(draft.is_visible);
        assert_eq!(draft.kind, HousingType::Castle);
        assert_eq!(draft.price, "999.50");
    }

    #[test]
    fn partial_update_keeps_stored_values() {
        let base = full().into_draft(None).unwrap();
        let patch = HousingPayload {
            rooms: Some(3),
            is_visible: Some(false),
            ..HousingPayload::default()
        };
        let draft = patch.into_draft(Some(base)).unwrap();
        assert_eq!(draft.rooms, 3);
        assert_eq!(draft.name, "Castle");
        assert!(!draft.is_visible);
    }

    #[test]
    fn unknown_type_is_a_field_error() {
        let payload = HousingPayload {
            kind: Some("tent".into()),
            ..full()
        };
        assert!(payload.into_draft(None).unwrap_err().contains_key("type"));
    }
}
