pub mod auth;
pub mod request;
pub mod reservation;
pub mod review;
pub mod shop;
