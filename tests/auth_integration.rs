use actix_web::web;
use chirpy::clock::{Clock, FixedClock};
use chirpy::configuration::{
    AdminSettings, ApplicationSettings, AuthSettings, DatabaseSettings, JwtSettings, Settings,
    WebhookSettings,
};
use chirpy::metrics::ServiceMetrics;
use chirpy::startup::{build_session_service, run};
use chirpy::store::InMemoryStore;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;

const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub clock: Arc<FixedClock>,
    pub client: reqwest::Client,
}

fn test_settings() -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "chirpy".to_string(),
            in_memory: true,
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        jwt: JwtSettings {
            secret: "integration-test-secret".to_string(),
            access_token_expiry: 3600,
            issuer: "chirpy".to_string(),
        },
        auth: AuthSettings {
            password_hash_cost: 4,
            refresh_token_expiry_days: 60,
        },
        webhooks: WebhookSettings {
            polka_key: POLKA_KEY.to_string(),
        },
        admin: AdminSettings {
            reset_enabled: true,
        },
    }
}

async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let settings = test_settings();
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let store = Arc::new(InMemoryStore::new());
    let shared_clock: Arc<dyn Clock> = clock.clone();
    let sessions = build_session_service(&settings, store.clone(), store.clone(), shared_clock)
        .expect("Failed to build session service");

    let metrics = web::Data::new(ServiceMetrics::new());
    let server = run(
        listener,
        sessions,
        store,
        metrics,
        settings.webhooks.clone(),
        settings.admin.clone(),
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        clock,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/users", self.address))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn login(&self, body: Value) -> reqwest::Response {
        self.client
            .post(&format!("{}/api/login", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create an account and log in; returns the login body
    async fn signed_in(&self, email: &str, password: &str) -> Value {
        assert_eq!(self.create_user(email, password).await.status().as_u16(), 201);
        let response = self
            .login(json!({ "email": email, "password": password }))
            .await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.unwrap()
    }

    async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", self.address, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn update_user(&self, authorization: Option<&str>, body: Value) -> reqwest::Response {
        let mut request = self
            .client
            .put(&format!("{}/api/users", self.address))
            .json(&body);
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request")
    }

    async fn webhook(&self, authorization: Option<&str>, body: Value) -> reqwest::Response {
        self.raw_webhook(authorization, body.to_string()).await
    }

    async fn raw_webhook(&self, authorization: Option<&str>, body: String) -> reqwest::Response {
        let mut request = self
            .client
            .post(&format!("{}/api/polka/webhooks", self.address))
            .header("Content-Type", "application/json")
            .body(body);
        if let Some(value) = authorization {
            request = request.header("Authorization", value);
        }
        request.send().await.expect("Failed to execute request")
    }
}

impl TestApp {
    async fn post_chirp(&self, token: Option<&str>, body: &str) -> reqwest::Response {
        let mut request = self
            .client
            .post(&format!("{}/api/chirps", self.address))
            .json(&json!({ "body": body }));
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        request.send().await.expect("Failed to execute request")
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    async fn delete_chirp(&self, token: &str, id: &str) -> reqwest::Response {
        self.client
            .delete(&format!("{}/api/chirps/{}", self.address, id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

async fn assert_unauthorized(response: reqwest::Response) {
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Not authorized");
}

// --- Account Tests ---

#[tokio::test]
async fn create_user_returns_201_without_password_hash() {
    let app = spawn_app().await;

    let response = app.create_user("walt@breakingbad.com", "123456").await;
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "walt@breakingbad.com");
    assert_eq!(body["is_premium"], false);
    assert!(body["id"].is_string());
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
async fn create_user_rejects_duplicate_email() {
    let app = spawn_app().await;

    assert_eq!(app.create_user("walt@breakingbad.com", "123456").await.status().as_u16(), 201);
    let response = app.create_user("walt@breakingbad.com", "other").await;

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn create_user_returns_400_for_invalid_input() {
    let app = spawn_app().await;
    let cases = vec![
        ("not-an-email", "123456", "invalid email"),
        ("walt@breakingbad.com", "", "empty password"),
    ];

    for (email, password, description) in cases {
        let response = app.create_user(email, password).await;
        assert_eq!(response.status().as_u16(), 400, "case: {}", description);
    }
}

// --- Login Tests ---

#[tokio::test]
async fn login_returns_profile_and_both_tokens() {
    let app = spawn_app().await;
    let body = app.signed_in("walt@breakingbad.com", "123456").await;

    assert_eq!(body["email"], "walt@breakingbad.com");
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["refresh_token"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn login_failure_does_not_reveal_whether_email_exists() {
    let app = spawn_app().await;
    app.create_user("walt@breakingbad.com", "123456").await;

    let wrong_password = app
        .login(json!({ "email": "walt@breakingbad.com", "password": "wrong" }))
        .await;
    let unknown_email = app
        .login(json!({ "email": "jesse@breakingbad.com", "password": "123456" }))
        .await;

    assert_eq!(wrong_password.status().as_u16(), 401);
    assert_eq!(unknown_email.status().as_u16(), 401);

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_email.json().await.unwrap();
    assert_eq!(a["code"], "INVALID_CREDENTIALS");
    assert_eq!(a["code"], b["code"]);
    assert_eq!(a["message"], b["message"]);
}

// --- Protected Route Tests ---

#[tokio::test]
async fn update_user_requires_valid_access_token() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let refresh_token = session["refresh_token"].as_str().unwrap();
    let body = json!({ "email": "heisenberg@breakingbad.com", "password": "654321" });

    let cases = vec![
        (None, "no header"),
        (Some("Bearer".to_string()), "scheme only"),
        (Some("Bearer ".to_string()), "empty credential"),
        (Some("Basic abc".to_string()), "wrong scheme"),
        (Some("Bearer not-a-jwt".to_string()), "garbage token"),
        (Some(format!("Bearer {}", refresh_token)), "refresh token as access token"),
    ];

    for (authorization, description) in cases {
        let response = app.update_user(authorization.as_deref(), body.clone()).await;
        assert_eq!(response.status().as_u16(), 401, "case: {}", description);
    }
}

#[tokio::test]
async fn update_user_changes_credentials() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let bearer = format!("Bearer {}", session["token"].as_str().unwrap());

    let response = app
        .update_user(
            Some(&bearer),
            json!({ "email": "heisenberg@breakingbad.com", "password": "654321" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "heisenberg@breakingbad.com");
    assert_eq!(body["id"], session["id"]);

    let old = app
        .login(json!({ "email": "walt@breakingbad.com", "password": "123456" }))
        .await;
    assert_eq!(old.status().as_u16(), 401);

    let new = app
        .login(json!({ "email": "heisenberg@breakingbad.com", "password": "654321" }))
        .await;
    assert_eq!(new.status().as_u16(), 200);
}

#[tokio::test]
async fn access_token_expires_after_requested_lifetime() {
    let app = spawn_app().await;
    app.create_user("walt@breakingbad.com", "123456").await;
    let response = app
        .login(json!({
            "email": "walt@breakingbad.com",
            "password": "123456",
            "expires_in_seconds": 60
        }))
        .await;
    let session: Value = response.json().await.unwrap();
    let bearer = format!("Bearer {}", session["token"].as_str().unwrap());
    let body = json!({ "email": "walt@breakingbad.com", "password": "123456" });

    app.clock.advance(Duration::seconds(60));
    assert_eq!(app.update_user(Some(&bearer), body.clone()).await.status().as_u16(), 200);

    app.clock.advance(Duration::seconds(1));
    assert_unauthorized(app.update_user(Some(&bearer), body).await).await;
}

// --- Refresh / Revoke Tests ---

#[tokio::test]
async fn refresh_issues_access_token_for_the_same_user() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let refresh_token = session["refresh_token"].as_str().unwrap();

    let response = app.post_with_bearer("/api/refresh", refresh_token).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    let access_token = body["token"].as_str().unwrap();

    let update = app
        .update_user(
            Some(&format!("Bearer {}", access_token)),
            json!({ "email": "walt@breakingbad.com", "password": "abcdef" }),
        )
        .await;
    assert_eq!(update.status().as_u16(), 200);
    let updated: Value = update.json().await.unwrap();
    assert_eq!(updated["id"], session["id"]);
}

#[tokio::test]
async fn refresh_rejects_unknown_and_access_tokens_uniformly() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;

    assert_unauthorized(app.post_with_bearer("/api/refresh", &"ab".repeat(32)).await).await;
    assert_unauthorized(
        app.post_with_bearer("/api/refresh", session["token"].as_str().unwrap())
            .await,
    )
    .await;

    let no_header = app
        .client
        .post(&format!("{}/api/refresh", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_unauthorized(no_header).await;
}

#[tokio::test]
async fn revoked_refresh_token_can_no_longer_refresh() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let refresh_token = session["refresh_token"].as_str().unwrap();

    let revoke = app.post_with_bearer("/api/revoke", refresh_token).await;
    assert_eq!(revoke.status().as_u16(), 204);

    assert_unauthorized(app.post_with_bearer("/api/refresh", refresh_token).await).await;

    // Only a live token can be revoked
    assert_unauthorized(app.post_with_bearer("/api/revoke", refresh_token).await).await;
}

#[tokio::test]
async fn revoke_rejects_unknown_token() {
    let app = spawn_app().await;

    assert_unauthorized(app.post_with_bearer("/api/revoke", "unknown").await).await;
}

#[tokio::test]
async fn refresh_token_expires_after_sixty_days() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let refresh_token = session["refresh_token"].as_str().unwrap();

    app.clock.advance(Duration::days(60) - Duration::seconds(1));
    assert_eq!(
        app.post_with_bearer("/api/refresh", refresh_token).await.status().as_u16(),
        200
    );

    app.clock.advance(Duration::seconds(1));
    assert_unauthorized(app.post_with_bearer("/api/refresh", refresh_token).await).await;
}

#[tokio::test]
async fn access_token_survives_refresh_token_revocation() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let bearer = format!("Bearer {}", session["token"].as_str().unwrap());

    app.post_with_bearer("/api/revoke", session["refresh_token"].as_str().unwrap())
        .await;

    let response = app
        .update_user(
            Some(&bearer),
            json!({ "email": "walt@breakingbad.com", "password": "123456" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

// --- Webhook Tests ---

#[tokio::test]
async fn webhook_requires_api_key() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let body = json!({ "event": "user.upgraded", "data": { "user_id": session["id"] } });

    let cases = vec![
        (None, "no header"),
        (Some("ApiKey wrong".to_string()), "wrong key"),
        (Some(format!("Bearer {}", POLKA_KEY)), "wrong scheme"),
    ];

    for (authorization, description) in cases {
        let response = app.webhook(authorization.as_deref(), body.clone()).await;
        assert_eq!(response.status().as_u16(), 401, "case: {}", description);
    }
}

#[tokio::test]
async fn webhook_upgrades_user() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let api_key = format!("ApiKey {}", POLKA_KEY);

    let response = app
        .webhook(
            Some(&api_key),
            json!({ "event": "user.upgraded", "data": { "user_id": session["id"] } }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 204);

    let login: Value = app
        .login(json!({ "email": "walt@breakingbad.com", "password": "123456" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(login["is_premium"], true);
}

#[tokio::test]
async fn webhook_handles_unknown_user_and_other_events() {
    let app = spawn_app().await;
    let api_key = format!("ApiKey {}", POLKA_KEY);
    let stranger = uuid::Uuid::new_v4().to_string();

    let unknown = app
        .webhook(
            Some(&api_key),
            json!({ "event": "user.upgraded", "data": { "user_id": stranger } }),
        )
        .await;
    assert_eq!(unknown.status().as_u16(), 404);

    let ignored = app
        .webhook(
            Some(&api_key),
            json!({ "event": "user.payment_failed", "data": { "user_id": stranger } }),
        )
        .await;
    assert_eq!(ignored.status().as_u16(), 204);
}

#[tokio::test]
async fn webhook_checks_api_key_before_reading_the_body() {
    let app = spawn_app().await;

    let cases = vec![
        (None, "{not json", "no key, broken body"),
        (None, "", "no key, empty body"),
        (Some("ApiKey wrong"), "{not json", "wrong key, broken body"),
    ];

    for (authorization, body, description) in cases {
        let response = app.raw_webhook(authorization, body.to_string()).await;
        assert_eq!(response.status().as_u16(), 401, "case: {}", description);
    }
}

#[tokio::test]
async fn webhook_acknowledges_undecodable_payloads() {
    let app = spawn_app().await;
    let api_key = format!("ApiKey {}", POLKA_KEY);

    let cases = vec![
        (
            json!({ "event": "user.upgraded", "data": { "user_id": "not-a-uuid" } }).to_string(),
            "non-uuid user_id",
        ),
        ("{not json".to_string(), "broken body"),
        (json!({ "event": "user.upgraded" }).to_string(), "missing data"),
    ];

    for (body, description) in cases {
        let response = app.raw_webhook(Some(&api_key), body).await;
        assert_eq!(response.status().as_u16(), 204, "case: {}", description);
    }
}

// --- Reset Tests ---

#[tokio::test]
async fn reset_deletes_users_and_their_sessions() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let refresh_token = session["refresh_token"].as_str().unwrap();

    let reset = app
        .client
        .post(&format!("{}/admin/reset", app.address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(reset.status().as_u16(), 200);

    let login = app
        .login(json!({ "email": "walt@breakingbad.com", "password": "123456" }))
        .await;
    assert_eq!(login.status().as_u16(), 401);
    assert_unauthorized(app.post_with_bearer("/api/refresh", refresh_token).await).await;

    // The email is free again
    assert_eq!(app.create_user("walt@breakingbad.com", "123456").await.status().as_u16(), 201);
}

// --- Chirp Tests ---

fn bodies(chirps: &Value) -> Vec<String> {
    chirps
        .as_array()
        .unwrap()
        .iter()
        .map(|chirp| chirp["body"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn create_chirp_masks_profanity() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let token = session["token"].as_str().unwrap();

    let response = app
        .post_chirp(Some(token), "I had something interesting for breakfast, Kerfuffle! kerfuffle")
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let chirp: Value = response.json().await.unwrap();
    assert_eq!(
        chirp["body"],
        "I had something interesting for breakfast, Kerfuffle! ****"
    );
    assert_eq!(chirp["user_id"], session["id"]);
    assert!(chirp["id"].is_string());
}

#[tokio::test]
async fn create_chirp_requires_access_token() {
    let app = spawn_app().await;

    assert_unauthorized(app.post_chirp(None, "hello").await).await;
    assert_unauthorized(app.post_chirp(Some("not-a-jwt"), "hello").await).await;
}

#[tokio::test]
async fn create_chirp_rejects_empty_and_long_bodies() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let token = session["token"].as_str().unwrap();

    let longest = "a".repeat(140);
    assert_eq!(app.post_chirp(Some(token), &longest).await.status().as_u16(), 201);

    let cases = vec![("a".repeat(141), "141 characters"), ("   ".to_string(), "blank")];
    for (body, description) in cases {
        let response = app.post_chirp(Some(token), &body).await;
        assert_eq!(response.status().as_u16(), 400, "case: {}", description);
    }
}

#[tokio::test]
async fn list_chirps_sorts_and_filters() {
    let app = spawn_app().await;
    let walt = app.signed_in("walt@breakingbad.com", "123456").await;
    let jesse = app.signed_in("jesse@breakingbad.com", "654321").await;
    let walt_token = walt["token"].as_str().unwrap();
    let jesse_token = jesse["token"].as_str().unwrap();

    for (token, body) in [(walt_token, "first"), (jesse_token, "second"), (walt_token, "third")] {
        assert_eq!(app.post_chirp(Some(token), body).await.status().as_u16(), 201);
    }

    let ascending: Value = app.get("/api/chirps").await.json().await.unwrap();
    assert_eq!(bodies(&ascending), vec!["first", "second", "third"]);

    let descending: Value = app.get("/api/chirps?sort=desc").await.json().await.unwrap();
    assert_eq!(bodies(&descending), vec!["third", "second", "first"]);

    let walt_id = walt["id"].as_str().unwrap();
    let filtered: Value = app
        .get(&format!("/api/chirps?author_id={}&sort=desc", walt_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(bodies(&filtered), vec!["third", "first"]);

    assert_eq!(app.get("/api/chirps?sort=bogus").await.status().as_u16(), 400);
    assert_eq!(app.get("/api/chirps?author_id=nope").await.status().as_u16(), 400);
}

#[tokio::test]
async fn get_chirp_by_id() {
    let app = spawn_app().await;
    let session = app.signed_in("walt@breakingbad.com", "123456").await;
    let token = session["token"].as_str().unwrap();

    let chirp: Value = app.post_chirp(Some(token), "hello").await.json().await.unwrap();
    let id = chirp["id"].as_str().unwrap();

    let response = app.get(&format!("/api/chirps/{}", id)).await;
    assert_eq!(response.status().as_u16(), 200);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched["body"], "hello");

    let missing = app.get(&format!("/api/chirps/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(missing.status().as_u16(), 404);
    assert_eq!(app.get("/api/chirps/not-a-uuid").await.status().as_u16(), 400);
}

#[tokio::test]
async fn delete_chirp_is_limited_to_its_author() {
    let app = spawn_app().await;
    let walt = app.signed_in("walt@breakingbad.com", "123456").await;
    let jesse = app.signed_in("jesse@breakingbad.com", "654321").await;
    let walt_token = walt["token"].as_str().unwrap();
    let jesse_token = jesse["token"].as_str().unwrap();

    let chirp: Value = app.post_chirp(Some(walt_token), "mine").await.json().await.unwrap();
    let id = chirp["id"].as_str().unwrap();

    let forbidden = app.delete_chirp(jesse_token, id).await;
    assert_eq!(forbidden.status().as_u16(), 403);
    let body: Value = forbidden.json().await.unwrap();
    assert_eq!(body["code"], "FORBIDDEN");

    assert_eq!(app.delete_chirp(walt_token, id).await.status().as_u16(), 204);
    assert_eq!(app.get(&format!("/api/chirps/{}", id)).await.status().as_u16(), 404);
    assert_eq!(app.delete_chirp(walt_token, id).await.status().as_u16(), 404);
}
