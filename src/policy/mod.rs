//! Business rules that decide whether an action is allowed. Everything in
//! here is pure: callers load the rows, these functions only judge them.

pub mod availability;
pub mod permissions;
pub mod review;

pub use availability::{check_availability, BookingRequest, DateRange, Rejection};
pub use permissions::{can_read_housing, is_owner_or_admin};
pub use review::{check_review_eligibility, ReviewRejection};
