pub mod user;
pub mod shop;
pub mod request;
pub mod reservation;
pub mod review;
