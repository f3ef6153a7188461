use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
pub enum HousingType {
    #[default]
    Apartment,
    House,
    Studio,
    Castle,
    Hotel,
    Villa,
    Cottage,
}

impl HousingType {
    pub const ALL: [HousingType; 7] = [
        HousingType::Apartment,
        HousingType::House,
        HousingType::Studio,
        HousingType::Castle,
        HousingType::Hotel,
        HousingType::Villa,
        HousingType::Cottage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HousingType::Apartment => "APARTMENT",
            HousingType::House => "HOUSE",
            HousingType::Studio => "STUDIO",
            HousingType::Castle => "CASTLE",
            HousingType::Hotel => "HOTEL",
            HousingType::Villa => "VILLA",
            HousingType::Cottage => "COTTAGE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HousingType::Apartment => "Apartment",
            HousingType::House => "House",
            HousingType::Studio => "Studio",
            HousingType::Castle => "Castle",
            HousingType::Hotel => "Hotel",
            HousingType::Villa => "Villa",
            HousingType::Cottage => "Cottage",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for HousingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Housing {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: HousingType,
    pub country: String,
    pub post_code: String,
    pub city: String,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub rooms: i64,
    pub description: String,
    /// Decimal with two fractional digits, kept as text so no precision is lost.
    pub price: String,
    pub is_visible: bool,
    pub view_count: i64,
    pub created_at: String,
}

/// Validated field values for creating or updating a housing.
#[derive(Debug, Clone)]
pub struct HousingDraft {
    pub name: String,
    pub kind: HousingType,
    pub country: String,
    pub post_code: String,
    pub city: String,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub rooms: i64,
    pub description: String,
    pub price: String,
    pub is_visible: bool,
}

impl Housing {
    pub fn new(owner_id: String, draft: HousingDraft) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            name: draft.name,
            kind: draft.kind,
            country: draft.country,
            post_code: draft.post_code,
            city: draft.city,
            street: draft.street,
            house_number: draft.house_number,
            rooms: draft.rooms,
            description: draft.description,
            price: draft.price,
            is_visible: draft.is_visible,
            view_count: 0,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn address(&self) -> String {
        let mut parts = Vec::new();
        match (&self.street, &self.house_number) {
            (Some(street), Some(number)) => parts.push(format!("{street} {number}")),
            (Some(street), None) => parts.push(street.clone()),
            _ => {}
        }
        parts.push(format!("{} {}", self.post_code, self.city));
        parts.push(self.country.clone());
        parts.join(", ")
    }
}
