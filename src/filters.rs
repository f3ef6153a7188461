use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::models::HousingType;

/// Query-string filters for the housing list, shared by the HTML page and
/// the API. Everything arrives as text so a bad value narrows the result to
/// nothing instead of failing the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HousingFilter {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub price_range: Option<String>,
    pub rooms: Option<String>,
    pub keyword: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Type,
    Price,
    Rooms,
    CreatedAt,
    ViewCount,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Name => "h.name",
            SortField::Type => "h.type",
            SortField::Price => "CAST(h.price AS REAL)",
            SortField::Rooms => "h.rooms",
            SortField::CreatedAt => "h.created_at",
            SortField::ViewCount => "h.view_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: SortField,
    pub descending: bool,
}

impl Default for Ordering {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            descending: true,
        }
    }
}

impl Ordering {
    /// `price`, `-price`, ... Unknown fields give the default ordering.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let (descending, name) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let field = match name {
            "name" => SortField::Name,
            "type" => SortField::Type,
            "price" => SortField::Price,
            "rooms" => SortField::Rooms,
            "created_at" => SortField::CreatedAt,
            "view_count" => SortField::ViewCount,
            _ => return Self::default(),
        };
        Self { field, descending }
    }

    pub fn to_sql(&self) -> String {
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{} {direction}, h.id {direction}", self.field.column())
    }
}

/// Parsed, typed filter values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub kind: Option<HousingType>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub rooms: Option<i64>,
    pub keyword: Option<String>,
    pub ordering: Ordering,
}

impl HousingFilter {
    /// `None` when any supplied value is unparseable: such a filter matches nothing.
    pub fn criteria(&self) -> Option<Criteria> {
        let mut criteria = Criteria {
            kind: match present(&self.kind) {
                Some(kind) => Some(HousingType::parse(kind)?),
                None => None,
            },
            price_min: parse_opt::<Decimal>(&self.price_min)?,
            price_max: parse_opt::<Decimal>(&self.price_max)?,
            rooms: parse_opt::<i64>(&self.rooms)?,
            keyword: present(&self.keyword).map(|k| k.to_lowercase()),
            ordering: present(&self.ordering)
                .map(Ordering::parse)
                .unwrap_or_default(),
        };

        if let Some(range) = present(&self.price_range) {
            let (min, max) = parse_price_range(range)?;
            criteria.price_min = Some(criteria.price_min.map_or(min, |m| m.max(min)));
            criteria.price_max = Some(criteria.price_max.map_or(max, |m| m.min(max)));
        }

        Some(criteria)
    }

    /// The keyword worth remembering in the user's search history.
    pub fn search_keyword(&self) -> Option<String> {
        present(&self.keyword).map(|k| k.to_lowercase())
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_opt<T: FromStr>(value: &Option<String>) -> Option<Option<T>> {
    match present(value) {
        Some(raw) => raw.parse().ok().map(Some),
        None => Some(None),
    }
}

/// `"min,max"`, both parts required.
fn parse_price_range(value: &str) -> Option<(Decimal, Decimal)> {
    let (min, max) = value.split_once(',')?;
    Some((min.trim().parse().ok()?, max.trim().parse().ok()?))
}
