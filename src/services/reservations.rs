use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::auth::policy::{allowed, has_role};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::reservation::{NewReservation, Reservation, ReservationFilter};
use crate::models::shop::Shop;
use crate::models::user::Role;
use crate::store::Store;

#[derive(Clone)]
pub struct ReservationService {
    store: Arc<dyn Store>,
    max_reservations: i64,
}

impl ReservationService {
    pub fn new(store: Arc<dyn Store>, max_reservations: i64) -> Self {
        Self { store, max_reservations }
    }

    /// Admins see everything, optionally narrowed to one shop; everyone else
    /// sees only their own.
    pub async fn list(&self, caller: &AuthContext, shop_id: Option<i64>) -> Result<Vec<Reservation>, AppError> {
        if let Some(id) = shop_id {
            self.shop(id).await?;
        }
        let user_id = (caller.role != Role::Admin).then_some(caller.user_id);
        Ok(self.store.list_reservations(&ReservationFilter { user_id, shop_id }).await?)
    }

    pub async fn get(&self, caller: &AuthContext, id: i64) -> Result<Reservation, AppError> {
        let reservation = self.load(id).await?;
        ensure_owner(caller, &reservation)?;
        Ok(reservation)
    }

    pub async fn create(
        &self,
        caller: &AuthContext,
        shop_id: i64,
        appt_date: NaiveDateTime,
    ) -> Result<Reservation, AppError> {
        if !has_role(caller.role, &[Role::User, Role::Admin]) {
            return Err(AppError::forbidden(format!(
                "User role {} is not authorized to make reservations",
                caller.role
            )));
        }

        let shop = self.shop(shop_id).await?;

        if caller.role != Role::Admin {
            let held = self.store.count_reservations(caller.user_id).await?;
            if held >= self.max_reservations {
                return Err(AppError::invalid_state(format!(
                    "The user with ID {} has already made {} reservations",
                    caller.user_id, self.max_reservations
                )));
            }
        }

        ensure_open(&shop, appt_date)?;

        let reservation = self
            .store
            .insert_reservation(NewReservation { user_id: caller.user_id, shop_id, appt_date })
            .await?;

        tracing::info!(reservation_id = reservation.id, shop_id, user = caller.user_id, "Reservation created");
        Ok(reservation)
    }

    pub async fn update(&self, caller: &AuthContext, id: i64, appt_date: NaiveDateTime) -> Result<Reservation, AppError> {
        let mut reservation = self.load(id).await?;
        ensure_owner(caller, &reservation)?;

        let shop = self.shop(reservation.shop_id).await?;
        ensure_open(&shop, appt_date)?;

        reservation.appt_date = appt_date;
        let reservation = self.store.update_reservation(&reservation).await?;

        tracing::info!(reservation_id = id, user = caller.user_id, "Reservation updated");
        Ok(reservation)
    }

    pub async fn delete(&self, caller: &AuthContext, id: i64) -> Result<(), AppError> {
        let reservation = self.load(id).await?;
        ensure_owner(caller, &reservation)?;

        self.store.delete_reservation(id).await?;
        tracing::info!(reservation_id = id, user = caller.user_id, "Reservation deleted");
        Ok(())
    }

    async fn load(&self, id: i64) -> Result<Reservation, AppError> {
        self.store
            .find_reservation(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No reservation with the id of {id}")))
    }

    async fn shop(&self, id: i64) -> Result<Shop, AppError> {
        self.store
            .find_shop(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No shop with the id of {id}")))
    }
}

fn ensure_owner(caller: &AuthContext, reservation: &Reservation) -> Result<(), AppError> {
    if allowed(caller.role, reservation.user_id, caller.user_id) {
        Ok(())
    } else {
        Err(AppError::unauthorized(format!(
            "User {} is not authorized to access reservation {}",
            caller.user_id, reservation.id
        )))
    }
}

fn ensure_open(shop: &Shop, appt_date: NaiveDateTime) -> Result<(), AppError> {
    let hours = shop
        .hours()
        .ok_or_else(|| AppError::internal(format!("Shop {} has unreadable opening hours", shop.id)))?;
    if !hours.contains(appt_date.time()) {
        return Err(AppError::invalid_argument("Reservation time is outside of business hours."));
    }
    Ok(())
}
