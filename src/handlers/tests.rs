// Handler tests against the full route table with mocked provider seams
use crate::routes::{CALLBACK, LOGIN, LOGOUT, PROTECTED_VIEW, REJECTED_VIEW};
use crate::session::{COOKIE_NAME, OAUTH_STATE_COOKIE};
use crate::testing::{MockEntitlementChecker, MockIdentityProvider, TestApp};
use actix_web::cookie::Cookie;
use actix_web::http::{header, StatusCode};
use actix_web::{dev::ServiceResponse, test, App};
use std::sync::Arc;

fn location(resp: &ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn cookie_named(resp: &ServiceResponse, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(Cookie::into_owned)
}

fn state_param(authorization_url: &str) -> String {
    url::Url::parse(authorization_url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

#[actix_web::test]
async fn test_start_login_redirects_to_provider_with_state_cookie() {
    let app = TestApp::new(
        Arc::new(MockIdentityProvider::new()),
        Arc::new(MockEntitlementChecker::member()),
    );
    let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

    let resp = test::call_service(&service, test::TestRequest::get().uri(LOGIN).to_request()).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let target = location(&resp);
    assert!(target.starts_with("https://provider.test/login/oauth/authorize"));
    assert!(target.contains("scope=user%3Afollow"));

    let state_cookie = cookie_named(&resp, OAUTH_STATE_COOKIE).unwrap();
    assert!(!state_cookie.value().is_empty());
    assert!(!state_cookie.value().contains(&state_param(&target)));
    assert!(cookie_named(&resp, COOKIE_NAME).is_none());
}

#[actix_web::test]
async fn test_callback_without_pending_login_is_rejected() {
    let checker = Arc::new(MockEntitlementChecker::member());
    let app = TestApp::new(Arc::new(MockIdentityProvider::new()), checker.clone());
    let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

    let req = test::TestRequest::get()
        .uri(&format!("{CALLBACK}?code=abc&state=whatever"))
        .to_request();
    let resp = test::call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), REJECTED_VIEW);
    assert_eq!(checker.call_count(), 0);
}

#[actix_web::test]
async fn test_provider_error_on_callback_is_rejected() {
    let app = TestApp::new(
        Arc::new(MockIdentityProvider::new()),
        Arc::new(MockEntitlementChecker::member()),
    );
    let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

    let req = test::TestRequest::get()
        .uri(&format!(
            "{CALLBACK}?error=access_denied&error_description=The+user+has+denied"
        ))
        .to_request();
    let resp = test::call_service(&service, req).await;

    assert_eq!(location(&resp), REJECTED_VIEW);
    let cleared_state = cookie_named(&resp, OAUTH_STATE_COOKIE).unwrap();
    assert_eq!(cleared_state.value(), "");
}

#[actix_web::test]
async fn test_malformed_callback_query_is_rejected_not_an_error_page() {
    let checker = Arc::new(MockEntitlementChecker::member());
    let app = TestApp::new(Arc::new(MockIdentityProvider::new()), checker.clone());
    let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

    let login = test::call_service(&service, test::TestRequest::get().uri(LOGIN).to_request()).await;
    let state_cookie = cookie_named(&login, OAUTH_STATE_COOKIE).unwrap();

    let resp = test::call_service(
        &service,
        test::TestRequest::get()
            .uri(&format!("{CALLBACK}?code=a&code=b&state=x"))
            .cookie(state_cookie)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), REJECTED_VIEW);
    assert_eq!(cookie_named(&resp, OAUTH_STATE_COOKIE).unwrap().value(), "");
    assert_eq!(checker.call_count(), 0);
}

#[actix_web::test]
async fn test_check_failure_lands_on_rejected_view() {
    let app = TestApp::new(
        Arc::new(MockIdentityProvider::new()),
        Arc::new(MockEntitlementChecker::failing()),
    );
    let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

    let login = test::call_service(&service, test::TestRequest::get().uri(LOGIN).to_request()).await;
    let state = state_param(&location(&login));
    let state_cookie = cookie_named(&login, OAUTH_STATE_COOKIE).unwrap();

    let resp = test::call_service(
        &service,
        test::TestRequest::get()
            .uri(&format!("{CALLBACK}?code=abc&state={state}"))
            .cookie(state_cookie)
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), REJECTED_VIEW);
    assert_eq!(cookie_named(&resp, COOKIE_NAME).unwrap().value(), "");
}

#[actix_web::test]
async fn test_logout_without_session_redirects_to_start() {
    let app = TestApp::new(
        Arc::new(MockIdentityProvider::new()),
        Arc::new(MockEntitlementChecker::member()),
    );
    let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

    let resp = test::call_service(&service, test::TestRequest::get().uri(LOGOUT).to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn test_forged_session_cookie_cannot_open_private_view() {
    let app = TestApp::new(
        Arc::new(MockIdentityProvider::new()),
        Arc::new(MockEntitlementChecker::member()),
    );
    let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

    let req = test::TestRequest::get()
        .uri(PROTECTED_VIEW)
        .cookie(Cookie::new(COOKIE_NAME, "made-up-id.c2lnbmF0dXJl"))
        .to_request();
    let resp = test::call_service(&service, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn test_ping() {
    let app = TestApp::new(
        Arc::new(MockIdentityProvider::new()),
        Arc::new(MockEntitlementChecker::member()),
    );
    let service = test::init_service(App::new().configure(|cfg| app.configure(cfg))).await;

    let req = test::TestRequest::get().uri("/ping").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&service, req).await;
    assert_eq!(body["status"], "ok");
}
