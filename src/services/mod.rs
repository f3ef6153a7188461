//! Database-backed operations shared by the HTML pages and the JSON API.

pub mod bookings;
pub mod history;
pub mod housings;
pub mod reviews;
pub mod users;

use chrono::{NaiveDate, Utc};

/// The calendar day bookings are judged against.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
