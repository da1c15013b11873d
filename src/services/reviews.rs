use std::sync::Arc;

use crate::auth::policy::allowed;
use crate::dtos::review::{CreateReviewRequest, UpdateReviewRequest};
use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::review::{average_rating, validate_review, NewReview, Review, ReviewListing};
use crate::models::user::Role;
use crate::store::{Page, Store};

#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn Store>,
}

impl ReviewService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self, shop_id: i64, page: Page) -> Result<(Vec<ReviewListing>, i64), AppError> {
        self.ensure_shop(shop_id).await?;
        Ok(self.store.list_reviews(shop_id, page).await?)
    }

    pub async fn create(
        &self,
        caller: &AuthContext,
        shop_id: i64,
        body: CreateReviewRequest,
    ) -> Result<Review, AppError> {
        if caller.role != Role::User {
            return Err(AppError::forbidden(format!(
                "User role {} is not authorized to review shops",
                caller.role
            )));
        }
        self.ensure_shop(shop_id).await?;

        let header = body.header.trim().to_string();
        let comment = body.comment.trim().to_string();
        let rating = match body.rating {
            Some(r) => r,
            None => {
                let mut errors = validate_review(&header, &comment, 1);
                errors.push("Please add a rating".to_string());
                return Err(AppError::Validation(errors));
            }
        };
        AppError::check(validate_review(&header, &comment, rating))?;

        if !self.store.has_reservation(caller.user_id, shop_id).await? {
            return Err(AppError::unauthorized("Customer doesn't have any reservation in this shop"));
        }

        let review = self
            .store
            .insert_review(NewReview { header, comment, rating, shop_id, user_id: caller.user_id })
            .await?;
        self.refresh_rating(shop_id).await?;

        tracing::info!(review_id = review.id, shop_id, user = caller.user_id, "Review created");
        Ok(review)
    }

    pub async fn update(&self, caller: &AuthContext, id: i64, body: UpdateReviewRequest) -> Result<Review, AppError> {
        let mut review = self.load(id).await?;
        ensure_author(caller, &review)?;

        if let Some(header) = body.header {
            review.header = header.trim().to_string();
        }
        if let Some(comment) = body.comment {
            review.comment = comment.trim().to_string();
        }
        if let Some(rating) = body.rating {
            review.rating = rating;
        }
        AppError::check(validate_review(&review.header, &review.comment, review.rating))?;

        let review = self.store.update_review(&review).await?;
        self.refresh_rating(review.shop_id).await?;

        tracing::info!(review_id = id, user = caller.user_id, "Review updated");
        Ok(review)
    }

    pub async fn delete(&self, caller: &AuthContext, id: i64) -> Result<(), AppError> {
        let review = self.load(id).await?;
        ensure_author(caller, &review)?;

        self.store.delete_review(id).await?;
        self.refresh_rating(review.shop_id).await?;

        tracing::info!(review_id = id, user = caller.user_id, "Review deleted");
        Ok(())
    }

    /// Recomputes the shop's review count and mean rating from scratch.
    ///
    /// Read then write without a lock: two concurrent mutations on one shop can
    /// leave a stale aggregate until the next mutation recomputes it.
    async fn refresh_rating(&self, shop_id: i64) -> Result<(), AppError> {
        let ratings = self.store.shop_ratings(shop_id).await?;
        let average = average_rating(&ratings);
        self.store.set_shop_rating(shop_id, ratings.len() as i64, average).await?;
        tracing::debug!(shop_id, reviews = ratings.len(), average, "Shop rating refreshed");
        Ok(())
    }

    async fn load(&self, id: i64) -> Result<Review, AppError> {
        self.store
            .find_review(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("No review with the id of {id}")))
    }

    async fn ensure_shop(&self, id: i64) -> Result<(), AppError> {
        match self.store.find_shop(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("No shop with the id of {id}"))),
        }
    }
}

fn ensure_author(caller: &AuthContext, review: &Review) -> Result<(), AppError> {
    if allowed(caller.role, review.user_id, caller.user_id) {
        Ok(())
    } else {
        Err(AppError::unauthorized(format!(
            "User {} is not authorized to modify review {}",
            caller.user_id, review.id
        )))
    }
}
