//! Supplier verification workflow against a real database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use medsupply_core::{Role, SupplierVerificationStatus, VerificationStatus};
use medsupply_integration_tests::{TestApp, create_category, create_user, test_pool};
use medsupply_marketplace::db::{
    ProfileRepository, RepositoryError, SupplierRepository, VerificationRepository,
};
use medsupply_marketplace::models::DocumentRef;

#[tokio::test]
async fn test_supplier_signup_opens_pending_review() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let supplier = create_user(&pool, Role::Supplier).await;
    assert_eq!(
        supplier.profile.verification_status,
        SupplierVerificationStatus::Pending
    );

    let latest = VerificationRepository::new(&pool)
        .latest_for_profile(supplier.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.status, VerificationStatus::Pending);
    assert!(latest.reason.is_none());
}

#[tokio::test]
async fn test_approval_cascades_to_profile_and_supplier() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let supplier = create_user(&pool, Role::Supplier).await;
    let admin = create_user(&pool, Role::Admin).await;
    let repo = VerificationRepository::new(&pool);
    let pending = repo.latest_for_profile(supplier.id()).await.unwrap().unwrap();

    // A reason sent with an approval is dropped
    let decided = repo
        .decide(
            pending.id,
            VerificationStatus::Approved,
            Some("looks fine".to_owned()),
            admin.id(),
        )
        .await
        .unwrap();
    assert_eq!(decided.status, VerificationStatus::Approved);
    assert!(decided.reason.is_none());
    assert_eq!(decided.reviewed_by, Some(admin.id()));

    let profile = ProfileRepository::new(&pool)
        .get_by_id(supplier.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.verification_status, SupplierVerificationStatus::Verified);

    let row = SupplierRepository::new(&pool)
        .get_by_profile(supplier.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.verification_status, SupplierVerificationStatus::Verified);

    // Decided reviews are final
    let again = repo
        .decide(pending.id, VerificationStatus::Rejected, None, admin.id())
        .await;
    assert!(matches!(again, Err(RepositoryError::Conflict(_))));
}

#[tokio::test]
async fn test_rejection_keeps_reason_and_allows_resubmission() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let supplier = create_user(&pool, Role::Supplier).await;
    let admin = create_user(&pool, Role::Admin).await;
    let repo = VerificationRepository::new(&pool);
    let pending = repo.latest_for_profile(supplier.id()).await.unwrap().unwrap();

    // Only one open review at a time
    let early = repo.resubmit(supplier.id(), &[]).await;
    assert!(matches!(early, Err(RepositoryError::Conflict(_))));

    let rejected = repo
        .decide(
            pending.id,
            VerificationStatus::Rejected,
            Some("  Licence scan is unreadable ".to_owned()),
            admin.id(),
        )
        .await
        .unwrap();
    assert_eq!(rejected.reason.as_deref(), Some("Licence scan is unreadable"));

    let profile = ProfileRepository::new(&pool)
        .get_by_id(supplier.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.verification_status, SupplierVerificationStatus::Rejected);

    let reopened = repo
        .resubmit(
            supplier.id(),
            &[DocumentRef {
                document_type: "business_licence".to_owned(),
                file_url: "https://files.test/licence.pdf".to_owned(),
                file_path: Some("verifications/licence.pdf".to_owned()),
            }],
        )
        .await
        .unwrap();
    assert_eq!(reopened.status, VerificationStatus::Pending);
    assert_ne!(reopened.id, pending.id);

    let documents = repo.documents(reopened.id).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].document_type, "business_licence");

    let profile = ProfileRepository::new(&pool)
        .get_by_id(supplier.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.verification_status, SupplierVerificationStatus::Pending);
}

#[tokio::test]
async fn test_review_queue_filters_by_status() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let supplier = create_user(&pool, Role::Supplier).await;

    let pending = VerificationRepository::new(&pool)
        .list(Some(VerificationStatus::Pending))
        .await
        .unwrap();
    let ours = pending
        .iter()
        .find(|v| v.verification.profile_id == supplier.id())
        .unwrap();
    assert_eq!(ours.supplier.email, supplier.profile.email);
    assert!(pending.iter().all(|v| v.verification.status == VerificationStatus::Pending));
}

#[tokio::test]
async fn test_supplier_can_list_products_only_after_approval() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let supplier = create_user(&pool, Role::Supplier).await;
    let buyer = create_user(&pool, Role::Buyer).await;
    let admin = create_user(&pool, Role::Admin).await;
    let category = create_category(&pool).await;

    let app = TestApp::new(pool);
    let supplier_cookie = app.login(&supplier).await;
    let buyer_cookie = app.login(&buyer).await;
    let admin_cookie = app.login(&admin).await;

    let product = json!({
        "name": "Nitrile examination gloves (box of 100)",
        "description": "Powder-free, size M",
        "category_id": category,
        "price": "850.00",
        "stock_count": 40,
        "dimensions": "24 x 12 x 6 cm"
    });

    let (status, _) = app
        .post("/api/products", Some(&supplier_cookie), product.clone())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/supplier/verification", Some(&supplier_cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verification_status"], "pending");
    let verification_id = body["verification"]["id"].as_str().unwrap().to_owned();

    // Non-admins cannot decide
    let decision = json!({"verificationId": verification_id, "status": "approved"});
    let (status, _) = app
        .post("/api/admin/verifications/update", Some(&buyer_cookie), decision.clone())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/admin/verifications/update",
            Some(&admin_cookie),
            json!({"verificationId": verification_id, "status": "pending"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post("/api/admin/verifications/update", Some(&admin_cookie), decision.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    let (status, _) = app
        .post("/api/admin/verifications/update", Some(&admin_cookie), decision)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.get("/api/user", Some(&supplier_cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["verification_status"], "verified");
    assert!(body["redirectUrl"].as_str().unwrap().ends_with("/supplier/dashboard"));

    let (status, body) = app
        .post("/api/products", Some(&supplier_cookie), product)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body[0]["in_stock"], true);
    assert_eq!(body[0]["specifications"]["dimensions"], "24 x 12 x 6 cm");
}

#[tokio::test]
async fn test_unknown_verification_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let admin = create_user(&pool, Role::Admin).await;
    let app = TestApp::new(pool);
    let cookie = app.login(&admin).await;

    let (status, body) = app
        .post(
            "/api/admin/verifications/update",
            Some(&cookie),
            json!({"verificationId": "6a1f0e4c-2b55-4c1e-9a0e-3d1c8e2f7b90", "status": "rejected"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Verification not found");
}
