//! Business rules, independent of HTTP and of the storage backend.
pub mod accounts;
pub mod provisioning;
pub mod reservations;
pub mod reviews;
pub mod shops;
pub mod workflow;

pub use accounts::AccountService;
pub use reservations::ReservationService;
pub use reviews::ReviewService;
pub use shops::ShopService;
pub use workflow::RequestWorkflow;
