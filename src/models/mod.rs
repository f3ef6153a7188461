pub mod user;
pub mod housing;
pub mod booking;
pub mod review;
pub mod history;

pub use user::User;
pub use housing::{Housing, HousingDraft, HousingType};
pub use booking::{Booking, BookingStatus, TransitionError};
pub use review::Review;
pub use history::{SearchHistory, ViewHistory};
