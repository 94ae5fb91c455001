use std::sync::Arc;

use api::{router::router, AppState};
use auth::{HashCost, NewAccount, Role, SessionService, TokenIssuer};
use reqwest::StatusCode;
use serde_json::{json, Value};
use storage::InMemoryUserStore;

const SECRET: &str = "black-box-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let tokens = TokenIssuer::new(SECRET, 600).unwrap();
        let sessions = SessionService::new(
            Arc::new(InMemoryUserStore::new()),
            tokens,
            HashCost::new(8, 1, 1),
        )
        .unwrap();
        sessions
            .ensure_admin(NewAccount {
                name: "Root".to_string(),
                email: "root@example.com".to_string(),
                role: Role::Admin,
                password: "root-pw".to_string(),
            })
            .await
            .unwrap();

        let app = router(Arc::new(AppState::new(sessions)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn login(&self, client: &reqwest::Client, email: &str, password: &str) -> String {
        let res = client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    async fn register(&self, client: &reqwest::Client, email: &str) -> Value {
        let res = client
            .post(self.url("/auth/register"))
            .json(&json!({
                "name": "A",
                "email": email,
                "role": "user",
                "password": "secret",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "AUTH_001");

    let res = client
        .get(srv.url("/users"))
        .bearer_auth("not.a.token")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .delete(srv.url("/users/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_and_read() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = srv.register(&client, "a@b.com").await;
    assert!(created.get("password_hash").is_none());
    assert_eq!(created["role"], "user");

    let token = srv.login(&client, "a@b.com", "secret").await;
    let claims = auth::validate_token(&token, SECRET).unwrap();
    assert_eq!(claims.sub, created["id"].as_str().unwrap());

    let res = client
        .get(srv.url(&format!("/users/{}", claims.sub)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["email"], "a@b.com");
    assert!(fetched.get("password_hash").is_none());

    let res = client.get(srv.url("/users")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let users: Vec<Value> = res.json().await.unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.register(&client, "a@b.com").await;

    for (email, password) in [("a@b.com", "wrong"), ("nobody@b.com", "secret")] {
        let res = client
            .post(srv.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"]["message"], "Invalid email or password");
    }
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    srv.register(&client, "a@b.com").await;

    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({ "name": "B", "email": "a@b.com", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn overlong_password_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({
            "name": "Long",
            "email": "long@b.com",
            "password": "x".repeat(auth::MAX_PASSWORD_LENGTH + 1),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VAL_001");
}

#[tokio::test]
async fn custom_role_is_returned_as_registered() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/auth/register"))
        .json(&json!({
            "name": "M",
            "email": "m@b.com",
            "role": "Manager",
            "password": "secret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "Manager");

    let token = srv.login(&client, "m@b.com", "secret").await;
    let claims = auth::validate_token(&token, SECRET).unwrap();
    assert_eq!(claims.role.as_str(), "Manager");
    assert!(!auth::is_privileged(&claims));
}

#[tokio::test]
async fn admin_self_registration_needs_admin_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let payload = json!({
        "name": "Sneaky",
        "email": "sneaky@b.com",
        "role": "Admin",
        "password": "pw",
    });

    let res = client
        .post(srv.url("/auth/register"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin = srv.login(&client, "root@example.com", "root-pw").await;
    let res = client
        .post(srv.url("/auth/register"))
        .bearer_auth(&admin)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["role"], "Admin");
}

#[tokio::test]
async fn mutations_require_admin_role() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let created = srv.register(&client, "a@b.com").await;
    let id = created["id"].as_str().unwrap();
    let user_token = srv.login(&client, "a@b.com", "secret").await;

    let res = client
        .put(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&user_token)
        .json(&json!({ "role": "Admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .delete(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&user_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_update_and_delete() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let created = srv.register(&client, "a@b.com").await;
    let id = created["id"].as_str().unwrap().to_string();
    let admin = srv.login(&client, "root@example.com", "root-pw").await;

    // Name only: the password keeps working.
    let res = client
        .put(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&admin)
        .json(&json!({ "name": "X" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["name"], "X");
    assert_eq!(updated["created_at"], created["created_at"]);
    srv.login(&client, "a@b.com", "secret").await;

    // Same values again is a conflict, not a missing user.
    let res = client
        .put(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&admin)
        .json(&json!({ "name": "X" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .put(srv.url("/users/missing"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "Y" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .delete(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["deleted"], true);

    let res = client
        .delete(srv.url(&format!("/users/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_creates_users_with_any_role() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let admin = srv.login(&client, "root@example.com", "root-pw").await;

    let res = client
        .post(srv.url("/users"))
        .bearer_auth(&admin)
        .json(&json!({
            "name": "Ops",
            "email": "ops@b.com",
            "role": "Admin",
            "password": "ops-pw",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let token = srv.login(&client, "ops@b.com", "ops-pw").await;
    assert!(auth::is_privileged(&auth::validate_token(&token, SECRET).unwrap()));
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let forged = auth::generate_token("someone", Role::Admin, "other-secret", 600).unwrap();
    let res = client
        .get(srv.url("/users"))
        .bearer_auth(&forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Invalid token");
}
