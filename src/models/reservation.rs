use serde::Serialize;
use chrono::{DateTime, NaiveDateTime, Utc};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    #[serde(rename = "user")]
    pub user_id: i64,
    #[serde(rename = "shop")]
    pub shop_id: i64,
    /// Wall-clock appointment time as the customer wrote it.
    pub appt_date: NaiveDateTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: i64,
    pub shop_id: i64,
    pub appt_date: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct ReservationFilter {
    pub user_id: Option<i64>,
    pub shop_id: Option<i64>,
}
