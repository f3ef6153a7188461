//! Form payloads and their validation. Each validator returns a map of
//! field name to message; an empty map means the input is acceptable.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

use crate::models::{HousingDraft, HousingType};

pub type FieldErrors = HashMap<String, String>;

const REQUIRED: &str = "This field is required.";

fn required(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), REQUIRED.to_string());
    }
}

fn max_len(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors
            .entry(field.to_string())
            .or_insert_with(|| format!("Ensure this value has at most {max} characters."));
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a price with at most 10 digits, 2 of them after the point, and
/// normalize it to exactly two decimal places.
pub fn normalize_price(raw: &str) -> Result<String, String> {
    let price = Decimal::from_str_exact(raw.trim()).map_err(|_| "Enter a number.".to_string())?;
    if price.is_sign_negative() {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }
    if price.normalize().scale() > 2 {
        return Err("Ensure that there are no more than 2 decimal places.".to_string());
    }
    let mut price = price.normalize();
    price.rescale(2);
    let digits = price.mantissa().unsigned_abs().to_string().len();
    if digits > 10 {
        return Err("Ensure that there are no more than 10 digits in total.".to_string());
    }
    Ok(price.to_string())
}

/// Length and range rules on an already typed housing.
pub fn validate_housing(draft: &HousingDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    required(&mut errors, "name", &draft.name);
    max_len(&mut errors, "name", &draft.name, 100);
    required(&mut errors, "country", &draft.country);
    max_len(&mut errors, "country", &draft.country, 50);
    required(&mut errors, "post_code", &draft.post_code);
    max_len(&mut errors, "post_code", &draft.post_code, 10);
    required(&mut errors, "city", &draft.city);
    max_len(&mut errors, "city", &draft.city, 50);
    if let Some(street) = &draft.street {
        max_len(&mut errors, "street", street, 50);
    }
    if let Some(number) = &draft.house_number {
        max_len(&mut errors, "house_number", number, 50);
    }
    required(&mut errors, "description", &draft.description);

    if draft.rooms < 1 {
        errors.insert("rooms".to_string(), "Number of rooms must be at least 1.".to_string());
    }

    if let Err(e) = normalize_price(&draft.price) {
        errors.insert("price".to_string(), e);
    }

    errors
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HousingForm {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    pub street: Option<String>,
    pub house_number: Option<String>,
    #[serde(default)]
    pub post_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub rooms: String,
    #[serde(default)]
    pub price: String,
    /// Checkbox: present when ticked.
    pub is_visible: Option<String>,
}

impl HousingForm {
    pub fn from_housing(h: &crate::models::Housing) -> Self {
        Self {
            name: h.name.clone(),
            kind: h.kind.as_str().to_string(),
            description: h.description.clone(),
            street: h.street.clone(),
            house_number: h.house_number.clone(),
            post_code: h.post_code.clone(),
            city: h.city.clone(),
            country: h.country.clone(),
            rooms: h.rooms.to_string(),
            price: h.price.clone(),
            is_visible: h.is_visible.then(|| "on".to_string()),
        }
    }

    pub fn visible(&self) -> bool {
        self.is_visible.is_some()
    }

    pub fn street_value(&self) -> &str {
        self.street.as_deref().unwrap_or_default()
    }

    pub fn house_number_value(&self) -> &str {
        self.house_number.as_deref().unwrap_or_default()
    }

    pub fn into_draft(self) -> Result<HousingDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let kind = if self.kind.trim().is_empty() {
            HousingType::default()
        } else {
            HousingType::parse(&self.kind).unwrap_or_else(|| {
                errors.insert("type".to_string(), "Select a valid choice.".to_string());
                HousingType::default()
            })
        };

        let rooms = match self.rooms.trim().parse::<i64>() {
            Ok(rooms) => rooms,
            Err(_) => {
                errors.insert("rooms".to_string(), "Enter a whole number.".to_string());
                1
            }
        };

        let draft = HousingDraft {
            name: self.name.trim().to_string(),
            kind,
            country: self.country.trim().to_string(),
            post_code: self.post_code.trim().to_string(),
            city: self.city.trim().to_string(),
            street: optional(self.street),
            house_number: optional(self.house_number),
            rooms,
            description: self.description.trim().to_string(),
            price: self.price.trim().to_string(),
            is_visible: self.is_visible.is_some(),
        };

        for (field, message) in validate_housing(&draft) {
            errors.entry(field).or_insert(message);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let price = normalize_price(&draft.price).map_err(|e| {
            FieldErrors::from([("price".to_string(), e)])
        })?;
        Ok(HousingDraft { price, ..draft })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn is_well_formed(&self) -> bool {
        is_email(&self.email) && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    /// Shape checks only; uniqueness is checked against the database.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        required(&mut errors, "username", &self.username);
        max_len(&mut errors, "username", &self.username, 150);
        if !self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.entry("username".to_string()).or_insert_with(|| {
                "Letters, digits and @/./+/-/_ only.".to_string()
            });
        }
        required(&mut errors, "first_name", &self.first_name);
        max_len(&mut errors, "first_name", &self.first_name, 30);
        required(&mut errors, "last_name", &self.last_name);
        max_len(&mut errors, "last_name", &self.last_name, 30);

        if !is_email(&self.email) {
            errors.insert("email".to_string(), "Enter a valid email address.".to_string());
        }

        if let Some(message) = password_problem(&self.password1) {
            errors.insert("password1".to_string(), message);
        }
        if self.password1 != self.password2 {
            errors.insert(
                "password2".to_string(),
                "The two password fields didn't match.".to_string(),
            );
        }

        errors
    }
}

pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn password_problem(password: &str) -> Option<String> {
    if password.chars().count() < 8 {
        return Some("This password is too short. It must contain at least 8 characters.".to_string());
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Some("This password is entirely numeric.".to_string());
    }
    None
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingForm {
    #[serde(default)]
    pub date_from: String,
    #[serde(default)]
    pub date_to: String,
}

impl BookingForm {
    /// Blank dates come back as `None`; the availability rules decide about
    /// those. Only malformed dates are form errors.
    pub fn dates(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>), FieldErrors> {
        let mut errors = FieldErrors::new();
        let date_from = parse_date(&mut errors, "date_from", &self.date_from);
        let date_to = parse_date(&mut errors, "date_to", &self.date_to);
        if errors.is_empty() {
            Ok((date_from, date_to))
        } else {
            Err(errors)
        }
    }
}

fn parse_date(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.insert(field.to_string(), "Enter a valid date.".to_string());
            None
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub text: String,
}

impl ReviewForm {
    pub fn parse(&self) -> Result<(i64, String), FieldErrors> {
        let rating = self.rating.trim().parse::<i64>().unwrap_or(0);
        let errors = validate_review(rating, &self.text);
        if errors.is_empty() {
            Ok((rating, self.text.trim().to_string()))
        } else {
            Err(errors)
        }
    }
}

pub fn validate_review(rating: i64, text: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if !(1..=5).contains(&rating) {
        errors.insert("rating".to_string(), "Rating must be between 1 and 5.".to_string());
    }
    required(&mut errors, "text", text);
    errors
}
