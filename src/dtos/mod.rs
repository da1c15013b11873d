pub mod envelope;
pub mod user;
pub mod request;
pub mod shop;
pub mod reservation;
pub mod review;

pub use envelope::{ApiResponse, AppJson, Pagination};
