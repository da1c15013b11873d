//! Persistence seam shared by the Postgres store and the in-memory store.
pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::request::{NewRequest, Request, RequestFilter, RequestListing, RequestStatus};
use crate::models::reservation::{NewReservation, Reservation, ReservationFilter};
use crate::models::review::{NewReview, Review, ReviewListing};
use crate::models::shop::{Shop, ShopDraft};
use crate::models::user::{NewUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit.filter(|l| *l > 0).unwrap_or(default_limit).min(MAX_PAGE_LIMIT),
        }
    }

    /// Saturates instead of overflowing on absurd page numbers.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShopSort {
    Name,
    NameDesc,
    CreatedAt,
    #[default]
    CreatedAtDesc,
    Rating,
    RatingDesc,
}

impl ShopSort {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "name" => Some(ShopSort::Name),
            "-name" => Some(ShopSort::NameDesc),
            "createdAt" => Some(ShopSort::CreatedAt),
            "-createdAt" => Some(ShopSort::CreatedAtDesc),
            "averageRating" => Some(ShopSort::Rating),
            "-averageRating" => Some(ShopSort::RatingDesc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShopQuery {
    pub province: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub sort: ShopSort,
    pub page: Page,
}

impl ShopQuery {
    pub fn matches(&self, shop: &Shop) -> bool {
        fn eq(filter: &Option<String>, value: &Option<String>) -> bool {
            filter.as_ref().map_or(true, |f| value.as_ref() == Some(f))
        }
        eq(&self.province, &shop.province) && eq(&self.region, &shop.region) && eq(&self.district, &shop.district)
    }
}

/// Multi-write boundary. Dropping it without `commit` discards every staged write.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn insert_shop(&mut self, draft: &ShopDraft) -> StoreResult<Shop>;

    /// Moves a request from `from` to `to`; `false` when it was not in `from`.
    async fn transition_request(&mut self, id: i64, from: RequestStatus, to: RequestStatus) -> StoreResult<bool>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;

    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_shop(&self, id: i64) -> StoreResult<Option<Shop>>;
    /// Returns one page of matching shops and the total number of matches.
    async fn list_shops(&self, query: &ShopQuery) -> StoreResult<(Vec<Shop>, i64)>;
    async fn update_shop(&self, shop: &Shop) -> StoreResult<Shop>;
    /// Removes the shop together with its reservations and reviews.
    async fn delete_shop(&self, id: i64) -> StoreResult<bool>;
    async fn set_shop_rating(&self, id: i64, num_of_reviews: i64, average_rating: f64) -> StoreResult<()>;

    async fn insert_request(&self, request: NewRequest) -> StoreResult<Request>;
    async fn find_request(&self, id: i64) -> StoreResult<Option<Request>>;
    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<RequestListing>>;
    /// Persists payload, status, reason and edit stamp, provided the stored
    /// status is still `expected`; `None` otherwise.
    async fn save_request(&self, request: &Request, expected: RequestStatus) -> StoreResult<Option<Request>>;
    /// Removes a pending or rejected request. Approved requests are kept.
    async fn delete_request(&self, id: i64) -> StoreResult<bool>;

    async fn insert_reservation(&self, reservation: NewReservation) -> StoreResult<Reservation>;
    async fn find_reservation(&self, id: i64) -> StoreResult<Option<Reservation>>;
    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>>;
    async fn count_reservations(&self, user_id: i64) -> StoreResult<i64>;
    async fn has_reservation(&self, user_id: i64, shop_id: i64) -> StoreResult<bool>;
    async fn update_reservation(&self, reservation: &Reservation) -> StoreResult<Reservation>;
    async fn delete_reservation(&self, id: i64) -> StoreResult<bool>;

    async fn insert_review(&self, review: NewReview) -> StoreResult<Review>;
    async fn find_review(&self, id: i64) -> StoreResult<Option<Review>>;
    /// Newest first.
    async fn list_reviews(&self, shop_id: i64, page: Page) -> StoreResult<(Vec<ReviewListing>, i64)>;
    async fn update_review(&self, review: &Review) -> StoreResult<Review>;
    async fn delete_review(&self, id: i64) -> StoreResult<bool>;
    async fn shop_ratings(&self, shop_id: i64) -> StoreResult<Vec<i32>>;
}
