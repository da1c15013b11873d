mod common;

use chrono::NaiveDateTime;
use common::{seed_cast, shop_body, test_state};
use shopq_backend::dtos::review::{CreateReviewRequest, UpdateReviewRequest};
use shopq_backend::error::AppError;
use shopq_backend::models::shop::ShopDraft;
use shopq_backend::store::{Page, Store, StoreError};

fn review(rating: i32) -> CreateReviewRequest {
    CreateReviewRequest { header: "Relaxing".into(), comment: "Would come back".into(), rating: Some(rating) }
}

fn noon() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2025-03-01 12:00", "%Y-%m-%d %H:%M").unwrap()
}

#[tokio::test]
async fn review_needs_a_prior_reservation() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let draft: ShopDraft = serde_json::from_value(shop_body("Spa", "0211112222")).unwrap();
    let shop = state.shops().create(&cast.admin, draft).await.unwrap();

    let err = state.reviews().create(&cast.customer, shop.id, review(5)).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "{err:?}");
}

#[tokio::test]
async fn second_review_for_same_shop_conflicts() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let draft: ShopDraft = serde_json::from_value(shop_body("Spa", "0211112222")).unwrap();
    let shop = state.shops().create(&cast.admin, draft).await.unwrap();
    state.reservations().create(&cast.customer, shop.id, noon()).await.unwrap();

    state.reviews().create(&cast.customer, shop.id, review(4)).await.unwrap();
    let err = state.reviews().create(&cast.customer, shop.id, review(5)).await.unwrap_err();
    assert!(matches!(err, AppError::Store(StoreError::Conflict(_))), "{err:?}");
}

#[tokio::test]
async fn aggregates_follow_every_mutation() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let draft: ShopDraft = serde_json::from_value(shop_body("Spa", "0211112222")).unwrap();
    let shop = state.shops().create(&cast.admin, draft).await.unwrap();
    let second = common::seed_user(&state.store, "Second", "0800000005", shopq_backend::models::user::Role::User).await;

    for caller in [&cast.customer, &second] {
        state.reservations().create(caller, shop.id, noon()).await.unwrap();
    }

    let first = state.reviews().create(&cast.customer, shop.id, review(4)).await.unwrap();
    state.reviews().create(&second, shop.id, review(5)).await.unwrap();

    let refreshed = state.shops().get(shop.id).await.unwrap();
    assert_eq!(refreshed.num_of_reviews, 2);
    assert_eq!(refreshed.average_rating, 4.5);

    let update = UpdateReviewRequest { rating: Some(2), ..Default::default() };
    state.reviews().update(&cast.customer, first.id, update).await.unwrap();
    assert_eq!(state.shops().get(shop.id).await.unwrap().average_rating, 3.5);

    let err = state.reviews().delete(&cast.owner, first.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "{err:?}");

    state.reviews().delete(&cast.customer, first.id).await.unwrap();
    let refreshed = state.shops().get(shop.id).await.unwrap();
    assert_eq!(refreshed.num_of_reviews, 1);
    assert_eq!(refreshed.average_rating, 5.0);

    let (listed, total) = state.reviews().list(shop.id, Page::new(None, None, 5)).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(listed[0].user.name, "Second");
}

#[tokio::test]
async fn missing_rating_is_a_validation_error() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let draft: ShopDraft = serde_json::from_value(shop_body("Spa", "0211112222")).unwrap();
    let shop = state.shops().create(&cast.admin, draft).await.unwrap();

    let body = CreateReviewRequest { header: "Ok".into(), comment: "Fine".into(), rating: None };
    match state.reviews().create(&cast.customer, shop.id, body).await.unwrap_err() {
        AppError::Validation(errors) => assert_eq!(errors, vec!["Please add a rating".to_string()]),
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = state.reviews().create(&cast.owner, shop.id, review(3)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
}

#[tokio::test]
async fn deleting_a_shop_removes_its_reservations_and_reviews() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let draft: ShopDraft = serde_json::from_value(shop_body("Spa", "0211112222")).unwrap();
    let shop = state.shops().create(&cast.admin, draft).await.unwrap();
    state.reservations().create(&cast.customer, shop.id, noon()).await.unwrap();
    let review = state.reviews().create(&cast.customer, shop.id, review(5)).await.unwrap();

    state.shops().delete(&cast.admin, shop.id).await.unwrap();

    assert!(state.store.find_review(review.id).await.unwrap().is_none());
    assert!(state.reservations().list(&cast.customer, None).await.unwrap().is_empty());
}
