//! Integration tests for login, registration, logout and token rejection.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use shoplet_core::PurchaseStatus;
use shoplet_storefront::error::AppError;
use shoplet_storefront::forms::{AuthField, RegisterField};
use shoplet_storefront::services::AuthError;
use shoplet_storefront::storage::keys;
use shoplet_integration_tests::{TestContext, auth_json, envelope, purchase_json};

const TOKEN: &str = "Bearer eyJhbGciOiJIUzI1NiJ9.test";

async fn mount_login(ctx: &TestContext) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "lan@shop.vn", "password": "secret1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_json(TOKEN, "lan@shop.vn")))
        .expect(1)
        .mount(&ctx.server)
        .await;
}

async fn mount_cart(ctx: &TestContext) {
    Mock::given(method("GET"))
        .and(path("/purchases"))
        .and(query_param("status", "-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope("ok", json!([purchase_json("a", 1, 100, 5)]))),
        )
        .mount(&ctx.server)
        .await;
}

#[tokio::test]
async fn test_login_persists_session() {
    let ctx = TestContext::new().await;
    mount_login(&ctx).await;

    let user = ctx
        .state
        .auth_service()
        .login("lan@shop.vn", "secret1")
        .await
        .unwrap();

    assert_eq!(user.email, "lan@shop.vn");
    assert!(ctx.state.auth().is_authenticated());

    let restarted = ctx.reopen();
    assert!(restarted.auth().is_authenticated());
    assert_eq!(restarted.auth().profile().unwrap().email, "lan@shop.vn");
}

#[tokio::test]
async fn test_requests_carry_token_verbatim() {
    let ctx = TestContext::new().await;
    mount_login(&ctx).await;
    Mock::given(method("GET"))
        .and(path("/purchases"))
        .and(header("authorization", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("ok", json!([]))))
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.state
        .auth_service()
        .login("lan@shop.vn", "secret1")
        .await
        .unwrap();
    ctx.state.cart_service().refresh(None).await.unwrap();
}

#[tokio::test]
async fn test_logout_clears_session_cart_and_cache() {
    let ctx = TestContext::new().await;
    mount_login(&ctx).await;
    mount_cart(&ctx).await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Đăng xuất thành công" })),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.state
        .auth_service()
        .login("lan@shop.vn", "secret1")
        .await
        .unwrap();
    ctx.state.cart_service().refresh(None).await.unwrap();
    assert!(
        ctx.state
            .api()
            .cache()
            .purchases(PurchaseStatus::InCart)
            .await
            .is_some()
    );

    let message = ctx.state.auth_service().logout().await.unwrap();

    assert_eq!(message, "Đăng xuất thành công");
    assert!(!ctx.state.auth().is_authenticated());
    assert!(ctx.state.auth().profile().is_none());
    assert!(ctx.state.cart_service().snapshot().is_empty());
    assert!(
        ctx.state
            .api()
            .cache()
            .purchases(PurchaseStatus::InCart)
            .await
            .is_none()
    );
    assert_eq!(ctx.state.storage().get(keys::ACCESS_TOKEN).unwrap(), None);
    assert!(!ctx.reopen().auth().is_authenticated());
}

#[tokio::test]
async fn test_register_maps_field_errors() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Lỗi",
            "data": { "email": "Email đã tồn tại", "captcha": "unknown field" }
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let error = ctx
        .state
        .auth_service()
        .register("lan@shop.vn", "secret1", "secret1")
        .await
        .unwrap_err();

    let AuthError::Form(errors) = error else {
        panic!("expected form errors, got {error:?}");
    };
    assert_eq!(errors.get(RegisterField::Email), Some("Email đã tồn tại"));
    assert_eq!(errors.len(), 1);
    assert!(!ctx.state.auth().is_authenticated());
}

#[tokio::test]
async fn test_local_rules_block_request() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let error = ctx
        .state
        .auth_service()
        .login("lan@shop.vn", "123")
        .await
        .unwrap_err();

    let errors = error.form_errors().unwrap();
    assert!(errors.get(AuthField::Password).is_some());
    assert!(errors.get(AuthField::Email).is_none());
}

#[tokio::test]
async fn test_rejected_token_clears_session() {
    let ctx = TestContext::new().await;
    mount_login(&ctx).await;
    Mock::given(method("GET"))
        .and(path("/purchases"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Token không hợp lệ",
            "data": { "name": "EXPIRED_TOKEN" }
        })))
        .mount(&ctx.server)
        .await;

    ctx.state
        .auth_service()
        .login("lan@shop.vn", "secret1")
        .await
        .unwrap();
    let error = ctx.state.cart_service().refresh(None).await.unwrap_err();

    assert!(error.is_unauthorized());
    assert!(matches!(error, AppError::Api(_)));
    assert!(!ctx.state.auth().is_authenticated());
    assert!(!ctx.reopen().auth().is_authenticated());
}

#[tokio::test]
async fn test_fetch_finishing_after_logout_is_discarded() {
    let ctx = TestContext::new().await;
    mount_login(&ctx).await;
    Mock::given(method("GET"))
        .and(path("/purchases"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope("ok", json!([purchase_json("a", 1, 100, 5)])))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Đăng xuất thành công" })),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.state
        .auth_service()
        .login("lan@shop.vn", "secret1")
        .await
        .unwrap();

    let cart = ctx.state.cart_service();
    let auth = ctx.state.auth_service();
    let (refreshed, logged_out) = tokio::join!(cart.refresh(None), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        auth.logout().await
    });
    refreshed.unwrap();
    logged_out.unwrap();

    assert!(!ctx.state.auth().is_authenticated());
    assert!(ctx.state.cart_service().snapshot().is_empty());
    assert!(
        ctx.state
            .api()
            .cache()
            .purchases(PurchaseStatus::InCart)
            .await
            .is_none()
    );
}

#[tokio::test]
async fn test_login_rejection_without_fields_keeps_message() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "message": "Email hoặc mật khẩu không đúng" })),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let error = ctx
        .state
        .auth_service()
        .login("lan@shop.vn", "secret1")
        .await
        .unwrap_err();

    assert!(error.form_errors().is_none());
    let error = AppError::from(error);
    assert!(error.to_string().contains("Email hoặc mật khẩu không đúng"));
    assert_eq!(error.exit_code(), 2);
    assert!(!ctx.state.auth().is_authenticated());
}
