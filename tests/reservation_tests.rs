mod common;

use chrono::NaiveDateTime;
use common::{seed_cast, test_state};
use serde_json::json;
use shopq_backend::error::AppError;
use shopq_backend::models::shop::{Shop, ShopDraft};
use shopq_backend::state::AppState;

fn at(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M").unwrap()
}

async fn night_shop(state: &AppState, admin: &shopq_backend::middleware::auth::AuthContext) -> Shop {
    let draft: ShopDraft = serde_json::from_value(json!({
        "name": "Night Spa",
        "tel": "021-112-2222",
        "openTime": "22:00",
        "closeTime": "06:00",
    }))
    .unwrap();
    state.shops().create(admin, draft).await.unwrap()
}

#[tokio::test]
async fn overnight_window_accepts_late_and_early_hours() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let shop = night_shop(&state, &cast.admin).await;
    let reservations = state.reservations();

    reservations.create(&cast.customer, shop.id, at("2025-03-01 23:30")).await.unwrap();
    reservations.create(&cast.customer, shop.id, at("2025-03-02 02:00")).await.unwrap();

    let err = reservations.create(&cast.customer, shop.id, at("2025-03-02 12:00")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)), "{err:?}");
}

#[tokio::test]
async fn customers_are_capped_but_admins_are_not() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let shop = night_shop(&state, &cast.admin).await;
    let reservations = state.reservations();

    for _ in 0..3 {
        reservations.create(&cast.customer, shop.id, at("2025-03-01 23:00")).await.unwrap();
    }
    let err = reservations.create(&cast.customer, shop.id, at("2025-03-01 23:00")).await.unwrap_err();
    match err {
        AppError::InvalidState(msg) => assert!(msg.contains("already made 3 reservations"), "{msg}"),
        other => panic!("expected cap error, got {other:?}"),
    }

    for _ in 0..4 {
        reservations.create(&cast.admin, shop.id, at("2025-03-01 23:00")).await.unwrap();
    }
}

#[tokio::test]
async fn shop_owners_do_not_book_and_unknown_shops_are_not_found() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let shop = night_shop(&state, &cast.admin).await;
    let reservations = state.reservations();

    let err = reservations.create(&cast.owner, shop.id, at("2025-03-01 23:00")).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let err = reservations.create(&cast.customer, 9_999, at("2025-03-01 23:00")).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn reservations_belong_to_their_holder() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let shop = night_shop(&state, &cast.admin).await;
    let reservations = state.reservations();

    let booked = reservations.create(&cast.customer, shop.id, at("2025-03-01 23:00")).await.unwrap();

    let err = reservations.get(&cast.owner, booked.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "{err:?}");
    assert!(reservations.list(&cast.owner, None).await.unwrap().is_empty());
    assert_eq!(reservations.list(&cast.admin, Some(shop.id)).await.unwrap().len(), 1);

    let err = reservations.update(&cast.customer, booked.id, at("2025-03-01 15:00")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)), "{err:?}");

    let moved = reservations.update(&cast.customer, booked.id, at("2025-03-02 05:30")).await.unwrap();
    assert_eq!(moved.appt_date, at("2025-03-02 05:30"));

    reservations.delete(&cast.admin, booked.id).await.unwrap();
    assert!(reservations.list(&cast.customer, None).await.unwrap().is_empty());
}
