use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Inclusive calendar range with `from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    pub fn start(&self) -> NaiveDate {
        self.from
    }

    pub fn end(&self) -> NaiveDate {
        self.to
    }

    /// Two inclusive ranges share at least one day.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Both booking dates are required.")]
    MissingDates,
    #[error("Booking start date cannot be after the end date.")]
    StartAfterEnd,
    #[error("Booking dates cannot be in the past.")]
    InPast,
    #[error("These dates overlap an existing booking from {0} to {1}.")]
    Overlap(NaiveDate, NaiveDate),
    #[error("You cannot book your own housing.")]
    OwnHousing,
}

#[derive(Debug, Clone, Copy)]
pub struct BookingRequest<'a> {
    pub requester_id: &'a str,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Decide whether `request` may be booked on a housing owned by `owner_id`.
///
/// `active` holds the ranges of the housing's pending and confirmed
/// bookings; when re-checking an existing booking the caller leaves that
/// booking out. Rules are applied in order and the first failure wins.
pub fn check_availability(
    request: &BookingRequest<'_>,
    owner_id: &str,
    today: NaiveDate,
    active: &[DateRange],
) -> Result<DateRange, Rejection> {
    let (Some(from), Some(to)) = (request.date_from, request.date_to) else {
        return Err(Rejection::MissingDates);
    };
    let range = DateRange::new(from, to).ok_or(Rejection::StartAfterEnd)?;

    if range.from < today || range.to < today {
        return Err(Rejection::InPast);
    }

    if let Some(taken) = active.iter().find(|taken| taken.overlaps(&range)) {
        return Err(Rejection::Overlap(taken.from, taken.to));
    }

    if request.requester_id == owner_id {
        return Err(Rejection::OwnHousing);
    }

    Ok(range)
}
