use crate::error::AppError;
use crate::models::shop::{Shop, ShopDraft};
use crate::store::UnitOfWork;

/// Materializes a shop inside the caller's unit of work. Every rule violation
/// is reported at once; uniqueness is left to the store.
pub async fn provision(uow: &mut dyn UnitOfWork, draft: &ShopDraft) -> Result<Shop, AppError> {
    let draft = draft.clone().normalized();
    AppError::check(draft.validate())?;
    let shop = uow.insert_shop(&draft).await?;
    tracing::debug!(shop_id = shop.id, name = %shop.name, "Shop provisioned");
    Ok(shop)
}
