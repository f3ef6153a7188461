use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

use crate::policy::availability::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
pub enum BookingStatus {
    #[default]
    Unconfirmed,
    Pending,
    Confirmed,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot change booking status from {from} to {to}")]
pub struct TransitionError {
    pub from: BookingStatus,
    pub to: BookingStatus,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Unconfirmed => "UNCONFIRMED",
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Canceled => "CANCELED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingStatus::Unconfirmed => "Unconfirmed",
            BookingStatus::Pending => "Pending confirmation",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Canceled => "Canceled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "UNCONFIRMED" => Some(BookingStatus::Unconfirmed),
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "CANCELED" => Some(BookingStatus::Canceled),
            _ => None,
        }
    }

    /// Active bookings block their dates for everyone else.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Canceled)
    }

    /// unconfirmed -> pending -> confirmed, and any non-terminal state -> canceled.
    pub fn transition(self, to: BookingStatus) -> Result<BookingStatus, TransitionError> {
        let allowed = match (self, to) {
            (BookingStatus::Unconfirmed, BookingStatus::Pending) => true,
            (BookingStatus::Pending, BookingStatus::Confirmed) => true,
            (from, BookingStatus::Canceled) => !from.is_terminal(),
            _ => false,
        };

        if allowed {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }

    /// Statuses reachable from this one, in lifecycle order.
    pub fn next_statuses(&self) -> Vec<BookingStatus> {
        [BookingStatus::Pending, BookingStatus::Confirmed, BookingStatus::Canceled]
            .into_iter()
            .filter(|to| self.transition(*to).is_ok())
            .collect()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: String,
    pub owner_id: String,
    pub housing_id: String,
    pub status: BookingStatus,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub created_at: String,
}

impl Booking {
    pub fn new(owner_id: String, housing_id: String, range: DateRange) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id,
            housing_id,
            status: BookingStatus::Unconfirmed,
            date_from: range.start(),
            date_to: range.end(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn range(&self) -> Option<DateRange> {
        DateRange::new(self.date_from, self.date_to)
    }
}
