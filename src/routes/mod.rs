pub mod api;
pub mod auth;
pub mod bookings;
pub mod history;
pub mod housings;
pub mod pages;
pub mod reviews;
