//! In-process store with the same contract as `PgStore`, including the
//! unique constraints and the all-or-nothing unit of work.
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::models::request::{
    NewRequest, Request, RequestFilter, RequestListing, RequestStatus, SubmitterRef,
};
use crate::models::reservation::{NewReservation, Reservation, ReservationFilter};
use crate::models::review::{NewReview, Review, ReviewAuthor, ReviewListing};
use crate::models::shop::{Shop, ShopDraft};
use crate::models::user::{NewUser, User};
use crate::store::{Page, ShopQuery, ShopSort, Store, StoreError, StoreResult, UnitOfWork};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    shops: BTreeMap<i64, Shop>,
    requests: BTreeMap<i64, Request>,
    reservations: BTreeMap<i64, Reservation>,
    reviews: BTreeMap<i64, Review>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn shop_conflict<'a>(shops: impl IntoIterator<Item = &'a Shop>, name: &str, tel: &str, skip: Option<i64>) -> Option<StoreError> {
        for shop in shops {
            if Some(shop.id) == skip {
                continue;
            }
            if shop.name == name {
                return Some(StoreError::Conflict("Shop name already exists".into()));
            }
            if shop.tel == tel {
                return Some(StoreError::Conflict("Shop phone number already exists".into()));
            }
        }
        None
    }

    fn user_name(&self, id: i64) -> String {
        self.users.get(&id).map(|u| u.name.clone()).unwrap_or_default()
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct MemoryUnitOfWork {
    tables: Arc<Mutex<Tables>>,
    shops: Vec<Shop>,
    transitions: Vec<(i64, RequestStatus, RequestStatus)>,
}

impl MemoryUnitOfWork {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn staged_status(&self, tables: &Tables, id: i64) -> Option<RequestStatus> {
        let committed = tables.requests.get(&id).map(|r| r.status)?;
        Some(
            self.transitions
                .iter()
                .rev()
                .find(|(rid, _, _)| *rid == id)
                .map(|(_, _, to)| *to)
                .unwrap_or(committed),
        )
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn insert_shop(&mut self, draft: &ShopDraft) -> StoreResult<Shop> {
        let mut tables = self.lock();
        let existing = tables.shops.values().chain(self.shops.iter());
        if let Some(err) = Tables::shop_conflict(existing, &draft.name, &draft.tel, None) {
            return Err(err);
        }
        let shop = Shop {
            id: tables.next_id(),
            name: draft.name.clone(),
            address: draft.address.clone(),
            district: draft.district.clone(),
            province: draft.province.clone(),
            postalcode: draft.postalcode.clone(),
            tel: draft.tel.clone(),
            region: draft.region.clone(),
            open_time: draft.open_time.clone(),
            close_time: draft.close_time.clone(),
            picture: draft.picture.clone(),
            services: draft.services.clone(),
            description: draft.description.clone(),
            num_of_reviews: 0,
            average_rating: 0.0,
            created_at: Utc::now(),
        };
        drop(tables);
        self.shops.push(shop.clone());
        Ok(shop)
    }

    async fn transition_request(&mut self, id: i64, from: RequestStatus, to: RequestStatus) -> StoreResult<bool> {
        let tables = self.lock();
        let current = self.staged_status(&tables, id);
        drop(tables);
        if current != Some(from) {
            return Ok(false);
        }
        self.transitions.push((id, from, to));
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut tables = self.lock();

        // Re-check against writes committed by others since staging.
        for (i, shop) in self.shops.iter().enumerate() {
            let others = tables.shops.values().chain(self.shops[..i].iter());
            if let Some(err) = Tables::shop_conflict(others, &shop.name, &shop.tel, None) {
                return Err(err);
            }
        }
        let mut expected: BTreeMap<i64, RequestStatus> = BTreeMap::new();
        for (id, from, to) in &self.transitions {
            let current = match expected.get(id) {
                Some(status) => Some(*status),
                None => tables.requests.get(id).map(|r| r.status),
            };
            if current != Some(*from) {
                return Err(StoreError::Conflict(format!("Request {id} changed concurrently")));
            }
            expected.insert(*id, *to);
        }

        for shop in &self.shops {
            tables.shops.insert(shop.id, shop.clone());
        }
        for (id, status) in expected {
            if let Some(request) = tables.requests.get_mut(&id) {
                request.status = status;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        Ok(Box::new(MemoryUnitOfWork {
            tables: Arc::clone(&self.tables),
            shops: Vec::new(),
            transitions: Vec::new(),
        }))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.lock();
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email already exists".into()));
        }
        if tables.users.values().any(|u| u.tel == user.tel) {
            return Err(StoreError::Conflict("Phone number already exists".into()));
        }
        let user = User {
            id: tables.next_id(),
            name: user.name,
            email: user.email,
            tel: user.tel,
            role: user.role,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_shop(&self, id: i64) -> StoreResult<Option<Shop>> {
        Ok(self.lock().shops.get(&id).cloned())
    }

    async fn list_shops(&self, query: &ShopQuery) -> StoreResult<(Vec<Shop>, i64)> {
        let tables = self.lock();
        let mut shops: Vec<Shop> = tables.shops.values().filter(|s| query.matches(s)).cloned().collect();
        let total = shops.len() as i64;

        shops.sort_by(|a, b| {
            let ord = match query.sort {
                ShopSort::Name | ShopSort::NameDesc => a.name.cmp(&b.name),
                ShopSort::CreatedAt | ShopSort::CreatedAtDesc => a.created_at.cmp(&b.created_at),
                ShopSort::Rating | ShopSort::RatingDesc => a.average_rating.total_cmp(&b.average_rating),
            }
            .then(a.id.cmp(&b.id));
            match query.sort {
                ShopSort::NameDesc | ShopSort::CreatedAtDesc | ShopSort::RatingDesc => ord.reverse(),
                _ => ord,
            }
        });

        let page = shops
            .into_iter()
            .skip(usize::try_from(query.page.offset()).unwrap_or(usize::MAX))
            .take(query.page.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn update_shop(&self, shop: &Shop) -> StoreResult<Shop> {
        let mut tables = self.lock();
        if let Some(err) = Tables::shop_conflict(tables.shops.values(), &shop.name, &shop.tel, Some(shop.id)) {
            return Err(err);
        }
        let stored = tables
            .shops
            .get_mut(&shop.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        let (num_of_reviews, average_rating, created_at) = (stored.num_of_reviews, stored.average_rating, stored.created_at);
        *stored = Shop { num_of_reviews, average_rating, created_at, ..shop.clone() };
        Ok(stored.clone())
    }

    async fn delete_shop(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock();
        tables.reservations.retain(|_, r| r.shop_id != id);
        tables.reviews.retain(|_, r| r.shop_id != id);
        Ok(tables.shops.remove(&id).is_some())
    }

    async fn set_shop_rating(&self, id: i64, num_of_reviews: i64, average_rating: f64) -> StoreResult<()> {
        if let Some(shop) = self.lock().shops.get_mut(&id) {
            shop.num_of_reviews = num_of_reviews;
            shop.average_rating = average_rating;
        }
        Ok(())
    }

    async fn insert_request(&self, request: NewRequest) -> StoreResult<Request> {
        let mut tables = self.lock();
        let request = Request {
            id: tables.next_id(),
            submitter_id: request.submitter_id,
            payload: request.payload,
            request_type: request.request_type,
            status: RequestStatus::Pending,
            reason: None,
            created_at: Utc::now(),
            edited: None,
        };
        tables.requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn find_request(&self, id: i64) -> StoreResult<Option<Request>> {
        Ok(self.lock().requests.get(&id).cloned())
    }

    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<RequestListing>> {
        let tables = self.lock();
        Ok(tables
            .requests
            .values()
            .filter(|r| filter.submitter_id.map_or(true, |id| r.submitter_id == id))
            .filter(|r| filter.status.map_or(true, |status| r.status == status))
            .map(|r| RequestListing {
                id: r.id,
                created_at: r.created_at,
                submitter: SubmitterRef { id: r.submitter_id, name: tables.user_name(r.submitter_id) },
                reason: r.reason.clone(),
                shop: r.payload.clone(),
                status: r.status,
            })
            .collect())
    }

    async fn save_request(&self, request: &Request, expected: RequestStatus) -> StoreResult<Option<Request>> {
        let mut tables = self.lock();
        let Some(stored) = tables.requests.get_mut(&request.id).filter(|r| r.status == expected) else {
            return Ok(None);
        };
        stored.payload = request.payload.clone();
        stored.status = request.status;
        stored.reason = request.reason.clone();
        stored.edited = request.edited;
        Ok(Some(stored.clone()))
    }

    async fn delete_request(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock();
        match tables.requests.get(&id) {
            Some(r) if r.status != RequestStatus::Approved => Ok(tables.requests.remove(&id).is_some()),
            _ => Ok(false),
        }
    }

    async fn insert_reservation(&self, reservation: NewReservation) -> StoreResult<Reservation> {
        let mut tables = self.lock();
        let reservation = Reservation {
            id: tables.next_id(),
            user_id: reservation.user_id,
            shop_id: reservation.shop_id,
            appt_date: reservation.appt_date,
            created_at: Utc::now(),
        };
        tables.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn find_reservation(&self, id: i64) -> StoreResult<Option<Reservation>> {
        Ok(self.lock().reservations.get(&id).cloned())
    }

    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        Ok(self
            .lock()
            .reservations
            .values()
            .filter(|r| filter.user_id.map_or(true, |id| r.user_id == id))
            .filter(|r| filter.shop_id.map_or(true, |id| r.shop_id == id))
            .cloned()
            .collect())
    }

    async fn count_reservations(&self, user_id: i64) -> StoreResult<i64> {
        Ok(self.lock().reservations.values().filter(|r| r.user_id == user_id).count() as i64)
    }

    async fn has_reservation(&self, user_id: i64, shop_id: i64) -> StoreResult<bool> {
        Ok(self
            .lock()
            .reservations
            .values()
            .any(|r| r.user_id == user_id && r.shop_id == shop_id))
    }

    async fn update_reservation(&self, reservation: &Reservation) -> StoreResult<Reservation> {
        let mut tables = self.lock();
        let stored = tables
            .reservations
            .get_mut(&reservation.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        stored.appt_date = reservation.appt_date;
        Ok(stored.clone())
    }

    async fn delete_reservation(&self, id: i64) -> StoreResult<bool> {
        Ok(self.lock().reservations.remove(&id).is_some())
    }

    async fn insert_review(&self, review: NewReview) -> StoreResult<Review> {
        let mut tables = self.lock();
        if tables
            .reviews
            .values()
            .any(|r| r.shop_id == review.shop_id && r.user_id == review.user_id)
        {
            return Err(StoreError::Conflict("User has already reviewed this shop".into()));
        }
        let review = Review {
            id: tables.next_id(),
            header: review.header,
            comment: review.comment,
            rating: review.rating,
            shop_id: review.shop_id,
            user_id: review.user_id,
            created_at: Utc::now(),
        };
        tables.reviews.insert(review.id, review.clone());
        Ok(review)
    }

    async fn find_review(&self, id: i64) -> StoreResult<Option<Review>> {
        Ok(self.lock().reviews.get(&id).cloned())
    }

    async fn list_reviews(&self, shop_id: i64, page: Page) -> StoreResult<(Vec<ReviewListing>, i64)> {
        let tables = self.lock();
        let mut reviews: Vec<&Review> = tables.reviews.values().filter(|r| r.shop_id == shop_id).collect();
        let total = reviews.len() as i64;
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let listings = reviews
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(page.limit as usize)
            .map(|r| ReviewListing {
                id: r.id,
                header: r.header.clone(),
                comment: r.comment.clone(),
                rating: r.rating,
                shop: r.shop_id,
                user: ReviewAuthor { id: r.user_id, name: tables.user_name(r.user_id) },
                created_at: r.created_at,
            })
            .collect();
        Ok((listings, total))
    }

    async fn update_review(&self, review: &Review) -> StoreResult<Review> {
        let mut tables = self.lock();
        let stored = tables
            .reviews
            .get_mut(&review.id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        stored.header = review.header.clone();
        stored.comment = review.comment.clone();
        stored.rating = review.rating;
        Ok(stored.clone())
    }

    async fn delete_review(&self, id: i64) -> StoreResult<bool> {
        Ok(self.lock().reviews.remove(&id).is_some())
    }

    async fn shop_ratings(&self, shop_id: i64) -> StoreResult<Vec<i32>> {
        Ok(self
            .lock()
            .reviews
            .values()
            .filter(|r| r.shop_id == shop_id)
            .map(|r| r.rating)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, tel: &str) -> ShopDraft {
        ShopDraft {
            name: name.into(),
            tel: tel.into(),
            open_time: "09:00".into(),
            close_time: "18:00".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn dropped_unit_of_work_leaves_no_trace() {
        let store = MemoryStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_shop(&draft("A", "0211122222")).await.unwrap();
        }
        let (shops, total) = store
            .list_shops(&ShopQuery {
                province: None,
                region: None,
                district: None,
                sort: ShopSort::default(),
                page: Page::new(None, None, 25),
            })
            .await
            .unwrap();
        assert!(shops.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn commit_rejects_shop_committed_by_someone_else() {
        let store = MemoryStore::new();
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();
        first.insert_shop(&draft("A", "0211122222")).await.unwrap();
        second.insert_shop(&draft("A", "0211133333")).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
