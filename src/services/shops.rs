use std::sync::Arc;

use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::shop::{Shop, ShopDraft, ShopDraftPatch};
use crate::models::user::Role;
use crate::services::provisioning::provision;
use crate::store::{ShopQuery, Store};

#[derive(Clone)]
pub struct ShopService {
    store: Arc<dyn Store>,
}

impl ShopService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, query: &ShopQuery) -> Result<(Vec<Shop>, i64), AppError> {
        Ok(self.store.list_shops(query).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Shop, AppError> {
        self.store
            .find_shop(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Shop not found with id of {id}")))
    }

    /// Admin-only direct creation, bypassing the request workflow.
    pub async fn create(&self, caller: &AuthContext, draft: ShopDraft) -> Result<Shop, AppError> {
        require_admin(caller, "create shops")?;

        let mut uow = self.store.begin().await?;
        let shop = provision(uow.as_mut(), &draft).await?;
        uow.commit().await?;

        tracing::info!(shop_id = shop.id, admin = caller.user_id, "Shop created");
        Ok(shop)
    }

    pub async fn update(&self, caller: &AuthContext, id: i64, patch: ShopDraftPatch) -> Result<Shop, AppError> {
        require_admin(caller, "update shops")?;

        let mut shop = self.get(id).await?;
        let mut draft = shop.draft();
        draft.merge(patch);
        let draft = draft.normalized();
        AppError::check(draft.validate())?;

        shop.apply(draft);
        let shop = self.store.update_shop(&shop).await?;

        tracing::info!(shop_id = id, admin = caller.user_id, "Shop updated");
        Ok(shop)
    }

    /// Removes the shop along with its reservations and reviews.
    pub async fn delete(&self, caller: &AuthContext, id: i64) -> Result<Shop, AppError> {
        require_admin(caller, "delete shops")?;

        let shop = self.get(id).await?;
        if !self.store.delete_shop(id).await? {
            return Err(AppError::not_found(format!("Shop not found with id of {id}")));
        }

        tracing::info!(shop_id = id, admin = caller.user_id, "Shop deleted");
        Ok(shop)
    }
}

fn require_admin(caller: &AuthContext, action: &str) -> Result<(), AppError> {
    if caller.role == Role::Admin {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("User role {} is not authorized to {action}", caller.role)))
    }
}
