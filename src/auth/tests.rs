use super::*;
use crate::api::MSG_NETWORK_FAILED;
use crate::request::{HttpMethod, MockHttpClient};
use crate::storage::MemoryStorage;
use meetolio_shared::{STORAGE_KEY_TOKEN, STORAGE_KEY_USER};
use serde_json::json;
use std::rc::Rc;

// =========================================================
// 辅助函数
// =========================================================

const BASE: &str = "http://api.test";

type TestAuth = AuthService<Rc<MockHttpClient>, Rc<MemoryStorage>>;

struct Fixture {
    auth: TestAuth,
    client: Rc<MockHttpClient>,
    storage: Rc<MemoryStorage>,
}

fn fixture() -> Fixture {
    let client = Rc::new(MockHttpClient::new());
    let storage = Rc::new(MemoryStorage::new());
    let auth = AuthService::new(MeetolioApi::new(client.clone(), BASE), storage.clone());
    Fixture {
        auth,
        client,
        storage,
    }
}

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

fn mock_me(client: &MockHttpClient, id: i64, email: &str) {
    client.mock_response(
        HttpMethod::Get,
        &url("/api/account/me"),
        200,
        json!({
            "id": id,
            "email": email,
            "createdAt": "2024-05-01T10:00:00",
            "updatedAt": "2024-05-02T11:30:00.123456"
        }),
    );
}

fn mock_login_ok(client: &MockHttpClient, token: &str) {
    client.mock_response(
        HttpMethod::Post,
        &url("/api/auth/login"),
        200,
        json!({ "accessToken": token }),
    );
}

/// 模拟一个已经登录的客户端
async fn logged_in() -> Fixture {
    let f = fixture();
    mock_login_ok(&f.client, "tok");
    mock_me(&f.client, 1, "a@b.com");
    f.auth.login("a@b.com", "secret1").await;
    assert!(f.auth.session().is_authenticated);
    f
}

// =========================================================
// 构建测试
// =========================================================

#[test]
fn test_from_config_restores_persisted_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    FileStorage::open(&path).set(STORAGE_KEY_TOKEN, "saved");

    let config = ClientConfig::from_lookup(|k| {
        (k == "MEETOLIO_STORAGE_PATH").then(|| path.display().to_string())
    })
    .with_api_base("https://api.meetolio.example/");
    let auth = AuthService::from_config(&config).unwrap();

    assert_eq!(auth.api().base_url(), "https://api.meetolio.example");
    assert_eq!(auth.get_token().as_deref(), Some("saved"));
    assert!(!auth.session().is_auth_ready);

    auth.logout();
    assert_eq!(FileStorage::open(&path).get(STORAGE_KEY_TOKEN), None);
}

// =========================================================
// boot 测试
// =========================================================

#[tokio::test]
async fn test_boot_without_token_resolves_anonymous() {
    let f = fixture();
    f.auth.boot().await;

    let s = f.auth.session();
    assert!(s.is_auth_ready);
    assert!(!s.is_authenticated);
    assert!(f.client.requests.borrow().is_empty());
}

#[tokio::test]
async fn test_boot_restores_session() {
    let f = fixture();
    f.storage.set(STORAGE_KEY_TOKEN, "tok");
    mock_me(&f.client, 42, "x@y.com");

    f.auth.boot().await;

    let s = f.auth.session();
    assert!(s.is_auth_ready);
    assert_eq!(s.user_id(), Some("42"));
    assert!(!s.just_logged_in);
    assert_eq!(f.auth.cached_user().map(|u| u.email), Some("x@y.com".into()));

    let reqs = f.client.requests.borrow();
    assert_eq!(reqs[0].headers.get("Authorization").unwrap(), "Bearer tok");
}

#[tokio::test]
async fn test_boot_with_rejected_token_clears_it() {
    let f = fixture();
    f.storage.set(STORAGE_KEY_TOKEN, "expired");
    f.storage.set(STORAGE_KEY_USER, r#"{"id":"1","email":"a@b.com"}"#);
    f.client.mock_response(
        HttpMethod::Get,
        &url("/api/account/me"),
        401,
        json!({ "status": 401, "message": "token expired" }),
    );

    f.auth.boot().await;

    let s = f.auth.session();
    assert!(s.is_auth_ready);
    assert!(!s.is_authenticated);
    assert_eq!(s.error, None);
    assert_eq!(f.auth.get_token(), None);
    assert!(f.storage.is_empty());
}

#[tokio::test]
async fn test_boot_network_failure_clears_token() {
    let f = fixture();
    f.storage.set(STORAGE_KEY_TOKEN, "tok");
    f.client
        .mock_failure(HttpMethod::Get, &url("/api/account/me"), "connection refused");

    f.auth.boot().await;

    assert!(f.auth.session().is_auth_ready);
    assert_eq!(f.auth.get_token(), None);
}

#[tokio::test]
async fn test_boot_runs_once() {
    let f = fixture();
    f.storage.set(STORAGE_KEY_TOKEN, "tok");
    mock_me(&f.client, 1, "a@b.com");

    f.auth.boot().await;
    f.auth.boot().await;

    assert_eq!(f.client.count(HttpMethod::Get, &url("/api/account/me")), 1);
}

// =========================================================
// login 测试
// =========================================================

#[tokio::test]
async fn test_login_success() {
    let f = fixture();
    mock_login_ok(&f.client, "tok");
    mock_me(&f.client, 1, "a@b.com");

    f.auth.login("a@b.com", "secret1").await;

    let s = f.auth.session();
    assert_eq!(s.user_id(), Some("1"));
    assert!(s.is_authenticated);
    assert!(s.just_logged_in);
    assert!(s.is_auth_ready);
    assert!(!s.is_loading);
    assert_eq!(s.error, None);
    assert_eq!(f.auth.get_token().as_deref(), Some("tok"));

    // 令牌写入先于用户拉取：拉取请求带的就是新令牌
    let reqs = f.client.requests.borrow();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[0].method, HttpMethod::Post);
    assert_eq!(
        reqs[0].json_body(),
        json!({ "email": "a@b.com", "password": "secret1" })
    );
    assert_eq!(reqs[1].headers.get("Authorization").unwrap(), "Bearer tok");
}

#[tokio::test]
async fn test_login_rejected_uses_server_message() {
    let f = fixture();
    f.client.mock_response(
        HttpMethod::Post,
        &url("/api/auth/login"),
        401,
        json!({ "message": "invalid credentials" }),
    );

    f.auth.login("a@b.com", "wrong").await;

    let s = f.auth.session();
    assert_eq!(s.user, None);
    assert!(!s.is_authenticated);
    assert_eq!(s.error.as_deref(), Some("invalid credentials"));
    assert_eq!(f.auth.get_token(), None);
    assert_eq!(f.client.count(HttpMethod::Get, &url("/api/account/me")), 0);
}

#[tokio::test]
async fn test_login_unparsable_error_falls_back() {
    let f = fixture();
    f.client
        .mock_raw(HttpMethod::Post, &url("/api/auth/login"), 500, "<html>oops</html>");

    f.auth.login("a@b.com", "pw").await;

    assert_eq!(f.auth.session().error.as_deref(), Some(MSG_LOGIN_FAILED));
}

#[tokio::test]
async fn test_login_network_failure_uses_generic_message() {
    let f = fixture();
    f.client
        .mock_failure(HttpMethod::Post, &url("/api/auth/login"), "dns error");

    f.auth.login("a@b.com", "pw").await;

    assert_eq!(f.auth.session().error.as_deref(), Some(MSG_NETWORK_FAILED));
}

#[tokio::test]
async fn test_login_user_fetch_failure_clears_token() {
    let f = fixture();
    mock_login_ok(&f.client, "tok");
    f.client
        .mock_raw(HttpMethod::Get, &url("/api/account/me"), 500, "");

    f.auth.login("a@b.com", "pw").await;

    let s = f.auth.session();
    assert!(!s.is_authenticated);
    assert!(s.error.is_some());
    assert_eq!(f.auth.get_token(), None);
}

#[tokio::test]
async fn test_login_is_loading_while_in_flight() {
    let f = fixture();
    let tx = f.client.mock_deferred(HttpMethod::Post, &url("/api/auth/login"));
    mock_me(&f.client, 1, "a@b.com");

    let observe = async {
        assert!(f.auth.session().is_loading);
        tx.send((200, json!({ "accessToken": "tok" }).to_string()))
            .unwrap();
    };
    futures::join!(f.auth.login("a@b.com", "pw"), observe);

    assert!(!f.auth.session().is_loading);
    assert!(f.auth.session().is_authenticated);
}

// =========================================================
// 请求排序（过期响应）测试
// =========================================================

#[tokio::test]
async fn test_logout_during_login_wins() {
    let f = fixture();
    let tx = f.client.mock_deferred(HttpMethod::Post, &url("/api/auth/login"));
    mock_me(&f.client, 1, "a@b.com");

    let interrupt = async {
        f.auth.logout();
        tx.send((200, json!({ "accessToken": "late" }).to_string()))
            .unwrap();
    };
    futures::join!(f.auth.login("a@b.com", "pw"), interrupt);

    let s = f.auth.session();
    assert!(!s.is_authenticated);
    assert!(s.is_auth_ready);
    assert_eq!(f.auth.get_token(), None);
    assert_eq!(f.client.count(HttpMethod::Get, &url("/api/account/me")), 0);
}

#[tokio::test]
async fn test_second_login_supersedes_first() {
    let f = fixture();
    let first = f.client.mock_deferred(HttpMethod::Post, &url("/api/auth/login"));
    mock_login_ok(&f.client, "second");
    mock_me(&f.client, 2, "second@b.com");

    let newer = async {
        f.auth.login("second@b.com", "pw").await;
        first
            .send((200, json!({ "accessToken": "first" }).to_string()))
            .unwrap();
    };
    futures::join!(f.auth.login("first@b.com", "pw"), newer);

    let s = f.auth.session();
    assert_eq!(s.user_id(), Some("2"));
    assert_eq!(f.auth.get_token().as_deref(), Some("second"));
}

#[tokio::test]
async fn test_stale_login_failure_is_ignored() {
    let f = fixture();
    let first = f.client.mock_deferred(HttpMethod::Post, &url("/api/auth/login"));
    mock_login_ok(&f.client, "second");
    mock_me(&f.client, 2, "second@b.com");

    let newer = async {
        f.auth.login("second@b.com", "pw").await;
        first
            .send((401, json!({ "message": "invalid credentials" }).to_string()))
            .unwrap();
    };
    futures::join!(f.auth.login("first@b.com", "bad"), newer);

    let s = f.auth.session();
    assert!(s.is_authenticated);
    assert_eq!(s.error, None);
    assert_eq!(f.auth.get_token().as_deref(), Some("second"));
}

#[tokio::test]
async fn test_logout_during_boot_discards_boot_result() {
    let f = fixture();
    f.storage.set(STORAGE_KEY_TOKEN, "tok");
    let tx = f.client.mock_deferred(HttpMethod::Get, &url("/api/account/me"));

    let interrupt = async {
        f.auth.logout();
        tx.send((200, json!({ "id": 1, "email": "a@b.com" }).to_string()))
            .unwrap();
    };
    futures::join!(f.auth.boot(), interrupt);

    let s = f.auth.session();
    assert!(s.is_auth_ready);
    assert!(!s.is_authenticated);
    assert_eq!(f.auth.cached_user(), None);
}

// =========================================================
// register / logout 测试
// =========================================================

#[tokio::test]
async fn test_register_does_not_authenticate() {
    let f = fixture();
    f.storage.set(STORAGE_KEY_TOKEN, "stale");
    f.client
        .mock_raw(HttpMethod::Post, &url("/api/auth/signup"), 201, "");

    assert!(f.auth.register("new@b.com", "secret1").await);

    let s = f.auth.session();
    assert!(!s.is_authenticated);
    assert!(s.is_auth_ready);
    assert!(!s.just_logged_in);
    assert_eq!(f.auth.get_token(), None);
}

#[tokio::test]
async fn test_register_failure_reports_message() {
    let f = fixture();
    f.client.mock_response(
        HttpMethod::Post,
        &url("/api/auth/signup"),
        409,
        json!({ "status": 409, "message": "email already registered" }),
    );

    assert!(!f.auth.register("a@b.com", "secret1").await);
    assert_eq!(
        f.auth.session().error.as_deref(),
        Some("email already registered")
    );
}

#[tokio::test]
async fn test_register_failure_while_logged_in_drops_token() {
    let f = logged_in().await;
    f.client.mock_response(
        HttpMethod::Post,
        &url("/api/auth/signup"),
        409,
        json!({ "message": "email already registered" }),
    );

    assert!(!f.auth.register("a@b.com", "secret1").await);

    let s = f.auth.session();
    assert!(!s.is_authenticated);
    assert!(s.user.is_none());
    assert_eq!(f.auth.get_token(), None);
    assert_eq!(f.auth.cached_user(), None);
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let f = logged_in().await;
    f.auth.logout();

    let s = f.auth.session();
    assert!(!s.is_authenticated);
    assert!(s.is_auth_ready);
    assert!(f.storage.is_empty());
}

#[tokio::test]
async fn test_listeners_see_every_transition() {
    let f = fixture();
    mock_login_ok(&f.client, "tok");
    mock_me(&f.client, 1, "a@b.com");

    let seen: Rc<RefCell<Vec<Session>>> = Rc::default();
    let sink = seen.clone();
    f.auth.subscribe(move |s| sink.borrow_mut().push(s.clone()));

    f.auth.login("a@b.com", "pw").await;
    f.auth.acknowledge_welcome();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].is_loading);
    assert!(seen[1].just_logged_in);
    assert!(!seen[2].just_logged_in);
}

// =========================================================
// 账户变更测试
// =========================================================

#[tokio::test]
async fn test_change_email_updates_user() {
    let f = logged_in().await;
    f.client.mock_response(
        HttpMethod::Put,
        &url("/api/account/me/email"),
        200,
        json!({ "id": 1, "email": "new@b.com" }),
    );

    assert!(f.auth.change_email("new@b.com", "secret1").await);

    assert_eq!(
        f.auth.session().user.map(|u| u.email),
        Some("new@b.com".into())
    );
    assert_eq!(
        f.auth.cached_user().map(|u| u.email),
        Some("new@b.com".into())
    );
    // 欢迎标记等其他字段不变
    assert!(f.auth.session().just_logged_in);
}

#[tokio::test]
async fn test_change_email_without_body_patches_cached_user() {
    let f = logged_in().await;
    f.client
        .mock_raw(HttpMethod::Put, &url("/api/account/me/email"), 204, "");

    assert!(f.auth.change_email("new@b.com", "secret1").await);
    assert_eq!(
        f.auth.session().user.map(|u| u.email),
        Some("new@b.com".into())
    );
}

#[tokio::test]
async fn test_change_email_unauthorized_invalidates() {
    let f = logged_in().await;
    f.client
        .mock_raw(HttpMethod::Put, &url("/api/account/me/email"), 401, "");

    assert!(!f.auth.change_email("new@b.com", "secret1").await);
    assert!(!f.auth.session().is_authenticated);
    assert_eq!(f.auth.get_token(), None);
}

#[tokio::test]
async fn test_change_password_keeps_session() {
    let f = logged_in().await;
    f.client
        .mock_raw(HttpMethod::Put, &url("/api/account/me/password"), 200, "");

    assert!(f.auth.change_password("secret1", "secret2").await);

    let s = f.auth.session();
    assert!(s.is_authenticated);
    assert_eq!(f.auth.get_token().as_deref(), Some("tok"));

    let reqs = f.client.requests.borrow();
    assert_eq!(
        reqs.last().unwrap().json_body(),
        json!({ "currentPassword": "secret1", "newPassword": "secret2" })
    );
}

#[tokio::test]
async fn test_change_password_rejected() {
    let f = logged_in().await;
    f.client.mock_response(
        HttpMethod::Put,
        &url("/api/account/me/password"),
        400,
        json!({ "message": "current password is wrong" }),
    );

    assert!(!f.auth.change_password("nope", "secret2").await);
    assert!(f.auth.session().is_authenticated);
}

#[tokio::test]
async fn test_account_ops_without_token_send_nothing() {
    let f = fixture();
    assert!(!f.auth.change_password("a", "b").await);
    assert!(!f.auth.change_email("a@b.com", "b").await);
    assert!(!f.auth.delete_account(Some("b")).await);
    assert!(f.client.requests.borrow().is_empty());
}

#[tokio::test]
async fn test_delete_account_success() {
    let f = logged_in().await;
    f.client
        .mock_raw(HttpMethod::Delete, &url("/api/account/me"), 204, "");

    assert!(f.auth.delete_account(Some("secret1")).await);

    let s = f.auth.session();
    assert!(!s.is_authenticated);
    assert!(s.is_auth_ready);
    assert!(f.storage.is_empty());
}

#[tokio::test]
async fn test_delete_account_unauthorized_still_clears() {
    let f = logged_in().await;
    f.client
        .mock_raw(HttpMethod::Delete, &url("/api/account/me"), 401, "");

    assert!(!f.auth.delete_account(None).await);
    assert!(!f.auth.session().is_authenticated);
    assert_eq!(f.auth.get_token(), None);
}

#[tokio::test]
async fn test_delete_account_other_failure_keeps_state() {
    let f = logged_in().await;
    f.client
        .mock_raw(HttpMethod::Delete, &url("/api/account/me"), 500, "");

    assert!(!f.auth.delete_account(Some("secret1")).await);
    assert!(f.auth.session().is_authenticated);
    assert_eq!(f.auth.get_token().as_deref(), Some("tok"));
}

#[tokio::test]
async fn test_update_user_ignored_when_signed_out() {
    let f = fixture();
    f.auth.update_user(User {
        id: "1".into(),
        email: "a@b.com".into(),
        created_at: None,
        updated_at: None,
    });
    assert_eq!(f.auth.session().user, None);
    assert_eq!(f.auth.cached_user(), None);
}

#[tokio::test]
async fn test_clear_error() {
    let f = fixture();
    f.client
        .mock_raw(HttpMethod::Post, &url("/api/auth/login"), 401, "");
    f.auth.login("a@b.com", "pw").await;
    assert!(f.auth.session().error.is_some());

    f.auth.clear_error();
    assert_eq!(f.auth.session().error, None);
}
