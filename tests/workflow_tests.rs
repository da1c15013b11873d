mod common;

use common::{seed_cast, shop_body, test_state};
use serde_json::json;
use shopq_backend::dtos::shop::ShopListParams;
use shopq_backend::error::AppError;
use shopq_backend::models::request::RequestStatus;
use shopq_backend::models::shop::ShopDraft;
use shopq_backend::store::Store;

async fn shop_count(state: &shopq_backend::state::AppState) -> i64 {
    let query = ShopListParams::default().into_query().unwrap();
    state.store.list_shops(&query).await.unwrap().1
}

#[tokio::test]
async fn submit_approve_then_reject_is_refused() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let request = workflow.submit(&cast.owner, shop_body("A", "02-111-2222")).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.submitter_id, cast.owner.user_id);

    let shop = workflow.approve(&cast.admin, request.id).await.unwrap();
    assert_eq!(shop.name, "A");
    assert_eq!(shop.picture, vec!["p1".to_string()]);

    let stored = state.store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);

    let err = workflow.reject(&cast.admin, request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "{err:?}");
}

#[tokio::test]
async fn approving_twice_creates_one_shop() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let request = workflow.submit(&cast.owner, shop_body("Once", "0211112222")).await.unwrap();
    workflow.approve(&cast.admin, request.id).await.unwrap();

    let err = workflow.approve(&cast.admin, request.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "{err:?}");
    assert_eq!(shop_count(&state).await, 1);
}

#[tokio::test]
async fn failed_provisioning_leaves_request_pending() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let existing: ShopDraft = serde_json::from_value(shop_body("Taken", "0211110000")).unwrap();
    state.shops().create(&cast.admin, existing).await.unwrap();

    let request = workflow.submit(&cast.owner, shop_body("Taken", "0211119999")).await.unwrap();
    let err = workflow.approve(&cast.admin, request.id).await.unwrap_err();
    assert!(matches!(err, AppError::Internal(_)), "{err:?}");

    let stored = state.store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Pending);
    assert_eq!(shop_count(&state).await, 1);
}

#[tokio::test]
async fn rejected_request_is_resubmitted_by_editing() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let request = workflow.submit(&cast.owner, shop_body("B", "0211113333")).await.unwrap();
    let rejected = workflow.reject(&cast.admin, request.id, Some("dup".into())).await.unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert_eq!(rejected.reason.as_deref(), Some("dup"));
    assert!(rejected.edited.is_none());

    let edited = workflow
        .edit_payload(&cast.owner, request.id, json!({ "address": "12 Main Rd" }))
        .await
        .unwrap();
    assert_eq!(edited.status, RequestStatus::Pending);
    assert!(edited.edited.is_some());
    assert_eq!(edited.payload.address.as_deref(), Some("12 Main Rd"));
    assert_eq!(edited.payload.name, "B");
}

#[tokio::test]
async fn reject_without_reason_uses_default() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let request = workflow.submit(&cast.owner, shop_body("C", "0211114444")).await.unwrap();
    let rejected = workflow.reject(&cast.admin, request.id, Some("   ".into())).await.unwrap();
    assert_eq!(rejected.reason.as_deref(), Some("No reason provided"));
}

#[tokio::test]
async fn edit_with_reserved_field_is_refused_whole() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let request = workflow.submit(&cast.owner, shop_body("D", "0211115555")).await.unwrap();
    for key in ["status", "reason", "edited", "createdAt"] {
        let err = workflow
            .edit_payload(&cast.owner, request.id, json!({ "name": "Renamed", key: "approved" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)), "{key}: {err:?}");
    }

    let stored = state.store.find_request(request.id).await.unwrap().unwrap();
    assert_eq!(stored.payload.name, "D");
}

#[tokio::test]
async fn approved_request_can_not_be_edited_or_deleted() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let request = workflow.submit(&cast.owner, shop_body("E", "0211116666")).await.unwrap();
    workflow.approve(&cast.admin, request.id).await.unwrap();

    let err = workflow.edit_payload(&cast.owner, request.id, json!({ "address": "x" })).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "{err:?}");

    let err = workflow.delete(&cast.owner, request.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "{err:?}");
    assert!(state.store.find_request(request.id).await.unwrap().is_some());
}

#[tokio::test]
async fn submitter_deletes_pending_and_rejected_requests() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let pending = workflow.submit(&cast.owner, shop_body("F", "0211117777")).await.unwrap();
    let rejected = workflow.submit(&cast.owner, shop_body("G", "0211118888")).await.unwrap();
    workflow.reject(&cast.admin, rejected.id, None).await.unwrap();

    let err = workflow.delete(&cast.other_owner, pending.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "{err:?}");

    workflow.delete(&cast.owner, pending.id).await.unwrap();
    workflow.delete(&cast.owner, rejected.id).await.unwrap();
    assert!(state.store.find_request(pending.id).await.unwrap().is_none());
    assert!(state.store.find_request(rejected.id).await.unwrap().is_none());
}

#[tokio::test]
async fn owners_only_see_their_own_requests() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let mine = workflow.submit(&cast.owner, shop_body("Mine", "0211110001")).await.unwrap();
    let theirs = workflow.submit(&cast.other_owner, shop_body("Theirs", "0211110002")).await.unwrap();

    let listed = workflow.list(&cast.owner, None).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, mine.id);
    assert_eq!(listed[0].submitter.name, "Owner");

    let err = workflow.get(&cast.owner, theirs.id).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "{err:?}");

    let detail = workflow.get(&cast.admin, theirs.id).await.unwrap();
    assert_eq!(detail.submitter.map(|s| s.email), Some("rival@example.com".to_string()));

    assert_eq!(workflow.list(&cast.admin, None).await.unwrap().len(), 2);
    assert!(workflow.list(&cast.admin, Some(RequestStatus::Approved)).await.unwrap().is_empty());

    let err = workflow.list(&cast.customer, None).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "{err:?}");
}

#[tokio::test]
async fn only_shop_owners_submit() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    for caller in [&cast.customer, &cast.admin] {
        let err = workflow.submit(caller, shop_body("H", "0211110003")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)), "{err:?}");
    }
}

#[tokio::test]
async fn submit_strips_system_fields_and_reports_all_violations() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let mut body = shop_body("I", "0211110004");
    body["status"] = json!("approved");
    body["reason"] = json!("self-approved");
    let request = workflow.submit(&cast.owner, body).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(request.reason.is_none());

    let err = workflow
        .submit(&cast.owner, json!({ "name": "", "tel": "1", "openTime": "25:00", "closeTime": "18:00" }))
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => assert_eq!(errors.len(), 3, "{errors:?}"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn review_actions_are_admin_only() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let request = workflow.submit(&cast.owner, shop_body("J", "0211110005")).await.unwrap();

    let err = workflow.approve(&cast.owner, request.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    let err = workflow.reject(&cast.owner, request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let err = workflow.approve(&cast.admin, 9_999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
}

#[tokio::test]
async fn reason_is_editable_only_once_rejected() {
    let state = test_state();
    let cast = seed_cast(&state.store).await;
    let workflow = state.workflow();

    let request = workflow.submit(&cast.owner, shop_body("K", "0211110006")).await.unwrap();
    let err = workflow.edit_reason(&cast.admin, request.id, Some("early".into())).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)), "{err:?}");

    workflow.reject(&cast.admin, request.id, Some("first".into())).await.unwrap();

    let err = workflow.edit_reason(&cast.admin, request.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)), "{err:?}");
    let err = workflow.edit_reason(&cast.admin, request.id, Some("x".repeat(251))).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)), "{err:?}");
    let err = workflow.edit_reason(&cast.owner, request.id, Some("mine".into())).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let updated = workflow.edit_reason(&cast.admin, request.id, Some("second".into())).await.unwrap();
    assert_eq!(updated.reason.as_deref(), Some("second"));
    assert_eq!(updated.status, RequestStatus::Rejected);
    assert_eq!(updated.payload.name, "K");
}
