use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Transaction};

use crate::models::request::{
    NewRequest, Request, RequestFilter, RequestListing, RequestStatus, SubmitterRef,
};
use crate::models::reservation::{NewReservation, Reservation, ReservationFilter};
use crate::models::review::{NewReview, Review, ReviewAuthor, ReviewListing};
use crate::models::shop::{Shop, ShopDraft};
use crate::models::user::{NewUser, User};
use crate::store::{Page, ShopQuery, ShopSort, Store, StoreError, StoreResult, UnitOfWork};

const SHOP_COLUMNS: &str = "id, name, address, district, province, postalcode, tel, region, \
    open_time, close_time, picture, services, description, num_of_reviews, average_rating, created_at";
const USER_COLUMNS: &str = "id, name, email, tel, role, password_hash, created_at";
const REQUEST_COLUMNS: &str = "id, submitter_id, payload, request_type, status, reason, created_at, edited";
const RESERVATION_COLUMNS: &str = "id, user_id, shop_id, appt_date, created_at";
const REVIEW_COLUMNS: &str = "id, header, comment, rating, shop_id, user_id, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps unique violations to `Conflict` using the constraint names from the migrations.
fn map_write_err(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        if db.code().as_deref() == Some("23505") {
            let msg = match db.constraint() {
                Some("shops_name_key") => "Shop name already exists",
                Some("shops_tel_key") => "Shop phone number already exists",
                Some("users_email_key") => "Email already exists",
                Some("users_tel_key") => "Phone number already exists",
                Some("reviews_shop_user_key") => "User has already reviewed this shop",
                _ => "Duplicate value violates a unique constraint",
            };
            return StoreError::Conflict(msg.to_string());
        }
    }
    StoreError::Database(e)
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    tel: String,
    role: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            tel: row.tel,
            role: row.role.parse().map_err(StoreError::Corrupt)?,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RequestRow {
    id: i64,
    submitter_id: i64,
    payload: Json<ShopDraft>,
    request_type: String,
    status: String,
    reason: Option<String>,
    created_at: DateTime<Utc>,
    edited: Option<DateTime<Utc>>,
}

impl TryFrom<RequestRow> for Request {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(Request {
            id: row.id,
            submitter_id: row.submitter_id,
            payload: row.payload.0,
            request_type: row.request_type.parse().map_err(StoreError::Corrupt)?,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            reason: row.reason,
            created_at: row.created_at,
            edited: row.edited,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RequestListingRow {
    id: i64,
    created_at: DateTime<Utc>,
    submitter_id: i64,
    submitter_name: String,
    reason: Option<String>,
    payload: Json<ShopDraft>,
    status: String,
}

#[derive(sqlx::FromRow)]
struct ReviewListingRow {
    id: i64,
    header: String,
    comment: String,
    rating: i32,
    shop_id: i64,
    user_id: i64,
    user_name: String,
    created_at: DateTime<Utc>,
}

fn sort_clause(sort: ShopSort) -> &'static str {
    match sort {
        ShopSort::Name => "name ASC, id ASC",
        ShopSort::NameDesc => "name DESC, id DESC",
        ShopSort::CreatedAt => "created_at ASC, id ASC",
        ShopSort::CreatedAtDesc => "created_at DESC, id DESC",
        ShopSort::Rating => "average_rating ASC, id ASC",
        ShopSort::RatingDesc => "average_rating DESC, id DESC",
    }
}

fn push_shop_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ShopQuery) {
    for (column, value) in [
        ("province", &query.province),
        ("region", &query.region),
        ("district", &query.district),
    ] {
        if let Some(v) = value {
            qb.push(format!(" AND {column} = ")).push_bind(v.clone());
        }
    }
}

async fn insert_shop_with(conn: &mut PgConnection, draft: &ShopDraft) -> StoreResult<Shop> {
    let sql = format!(
        "INSERT INTO shops (name, address, district, province, postalcode, tel, region, \
         open_time, close_time, picture, services, description) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         RETURNING {SHOP_COLUMNS}"
    );
    sqlx::query_as::<_, Shop>(&sql)
        .bind(&draft.name)
        .bind(&draft.address)
        .bind(&draft.district)
        .bind(&draft.province)
        .bind(&draft.postalcode)
        .bind(&draft.tel)
        .bind(&draft.region)
        .bind(&draft.open_time)
        .bind(&draft.close_time)
        .bind(&draft.picture)
        .bind(&draft.services)
        .bind(&draft.description)
        .fetch_one(conn)
        .await
        .map_err(map_write_err)
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_shop(&mut self, draft: &ShopDraft) -> StoreResult<Shop> {
        insert_shop_with(&mut *self.tx, draft).await
    }

    async fn transition_request(&mut self, id: i64, from: RequestStatus, to: RequestStatus) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE requests SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, tel, role, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.tel)
            .bind(user.role.as_str())
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_err)?;
        row.try_into()
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_shop(&self, id: i64) -> StoreResult<Option<Shop>> {
        let sql = format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1");
        Ok(sqlx::query_as::<_, Shop>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_shops(&self, query: &ShopQuery) -> StoreResult<(Vec<Shop>, i64)> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shops WHERE TRUE");
        push_shop_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {SHOP_COLUMNS} FROM shops WHERE TRUE"));
        push_shop_filters(&mut select, query);
        select
            .push(" ORDER BY ")
            .push(sort_clause(query.sort))
            .push(" LIMIT ")
            .push_bind(query.page.limit)
            .push(" OFFSET ")
            .push_bind(query.page.offset());
        let shops = select.build_query_as::<Shop>().fetch_all(&self.pool).await?;

        Ok((shops, total))
    }

    async fn update_shop(&self, shop: &Shop) -> StoreResult<Shop> {
        let sql = format!(
            "UPDATE shops SET name = $2, address = $3, district = $4, province = $5, postalcode = $6, \
             tel = $7, region = $8, open_time = $9, close_time = $10, picture = $11, services = $12, \
             description = $13 WHERE id = $1 RETURNING {SHOP_COLUMNS}"
        );
        sqlx::query_as::<_, Shop>(&sql)
            .bind(shop.id)
            .bind(&shop.name)
            .bind(&shop.address)
            .bind(&shop.district)
            .bind(&shop.province)
            .bind(&shop.postalcode)
            .bind(&shop.tel)
            .bind(&shop.region)
            .bind(&shop.open_time)
            .bind(&shop.close_time)
            .bind(&shop.picture)
            .bind(&shop.services)
            .bind(&shop.description)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_err)
    }

    async fn delete_shop(&self, id: i64) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reservations WHERE shop_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM reviews WHERE shop_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM shops WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_shop_rating(&self, id: i64, num_of_reviews: i64, average_rating: f64) -> StoreResult<()> {
        sqlx::query("UPDATE shops SET num_of_reviews = $2, average_rating = $3 WHERE id = $1")
            .bind(id)
            .bind(num_of_reviews)
            .bind(average_rating)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_request(&self, request: NewRequest) -> StoreResult<Request> {
        let sql = format!(
            "INSERT INTO requests (submitter_id, payload, request_type) \
             VALUES ($1, $2, $3) RETURNING {REQUEST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(request.submitter_id)
            .bind(Json(&request.payload))
            .bind(request.request_type.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_err)?;
        row.try_into()
    }

    async fn find_request(&self, id: i64) -> StoreResult<Option<Request>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1");
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Request::try_from).transpose()
    }

    async fn list_requests(&self, filter: &RequestFilter) -> StoreResult<Vec<RequestListing>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT r.id, r.created_at, r.submitter_id, u.name AS submitter_name, r.reason, r.payload, r.status \
             FROM requests r JOIN users u ON u.id = r.submitter_id WHERE TRUE",
        );
        if let Some(submitter) = filter.submitter_id {
            qb.push(" AND r.submitter_id = ").push_bind(submitter);
        }
        if let Some(status) = filter.status {
            qb.push(" AND r.status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY r.id");

        let rows = qb.build_query_as::<RequestListingRow>().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| {
                Ok(RequestListing {
                    id: row.id,
                    created_at: row.created_at,
                    submitter: SubmitterRef { id: row.submitter_id, name: row.submitter_name },
                    reason: row.reason,
                    shop: row.payload.0,
                    status: row.status.parse().map_err(StoreError::Corrupt)?,
                })
            })
            .collect()
    }

    async fn save_request(&self, request: &Request, expected: RequestStatus) -> StoreResult<Option<Request>> {
        let sql = format!(
            "UPDATE requests SET payload = $3, status = $4, reason = $5, edited = $6 \
             WHERE id = $1 AND status = $2 RETURNING {REQUEST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(request.id)
            .bind(expected.as_str())
            .bind(Json(&request.payload))
            .bind(request.status.as_str())
            .bind(&request.reason)
            .bind(request.edited)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Request::try_from).transpose()
    }

    async fn delete_request(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM requests WHERE id = $1 AND status <> 'approved'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_reservation(&self, reservation: NewReservation) -> StoreResult<Reservation> {
        let sql = format!(
            "INSERT INTO reservations (user_id, shop_id, appt_date) VALUES ($1, $2, $3) \
             RETURNING {RESERVATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(reservation.user_id)
            .bind(reservation.shop_id)
            .bind(reservation.appt_date)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_reservation(&self, id: i64) -> StoreResult<Option<Reservation>> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1");
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE TRUE"));
        if let Some(user_id) = filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(shop_id) = filter.shop_id {
            qb.push(" AND shop_id = ").push_bind(shop_id);
        }
        qb.push(" ORDER BY id");
        Ok(qb.build_query_as::<Reservation>().fetch_all(&self.pool).await?)
    }

    async fn count_reservations(&self, user_id: i64) -> StoreResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn has_reservation(&self, user_id: i64, shop_id: i64) -> StoreResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE user_id = $1 AND shop_id = $2)",
        )
        .bind(user_id)
        .bind(shop_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_reservation(&self, reservation: &Reservation) -> StoreResult<Reservation> {
        let sql = format!(
            "UPDATE reservations SET appt_date = $2 WHERE id = $1 RETURNING {RESERVATION_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(reservation.id)
            .bind(reservation.appt_date)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn delete_reservation(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_review(&self, review: NewReview) -> StoreResult<Review> {
        let sql = format!(
            "INSERT INTO reviews (header, comment, rating, shop_id, user_id) VALUES ($1, $2, $3, $4, $5) \
             RETURNING {REVIEW_COLUMNS}"
        );
        sqlx::query_as::<_, Review>(&sql)
            .bind(&review.header)
            .bind(&review.comment)
            .bind(review.rating)
            .bind(review.shop_id)
            .bind(review.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_err)
    }

    async fn find_review(&self, id: i64) -> StoreResult<Option<Review>> {
        let sql = format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1");
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_reviews(&self, shop_id: i64, page: Page) -> StoreResult<(Vec<ReviewListing>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE shop_id = $1")
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ReviewListingRow>(
            "SELECT r.id, r.header, r.comment, r.rating, r.shop_id, r.user_id, u.name AS user_name, r.created_at \
             FROM reviews r JOIN users u ON u.id = r.user_id \
             WHERE r.shop_id = $1 ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3",
        )
        .bind(shop_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let reviews = rows
            .into_iter()
            .map(|row| ReviewListing {
                id: row.id,
                header: row.header,
                comment: row.comment,
                rating: row.rating,
                shop: row.shop_id,
                user: ReviewAuthor { id: row.user_id, name: row.user_name },
                created_at: row.created_at,
            })
            .collect();
        Ok((reviews, total))
    }

    async fn update_review(&self, review: &Review) -> StoreResult<Review> {
        let sql = format!(
            "UPDATE reviews SET header = $2, comment = $3, rating = $4 WHERE id = $1 RETURNING {REVIEW_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Review>(&sql)
            .bind(review.id)
            .bind(&review.header)
            .bind(&review.comment)
            .bind(review.rating)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn delete_review(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn shop_ratings(&self, shop_id: i64) -> StoreResult<Vec<i32>> {
        Ok(sqlx::query_scalar::<_, i32>("SELECT rating FROM reviews WHERE shop_id = $1")
            .bind(shop_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
