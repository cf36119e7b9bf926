#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use hirelane_api::auth::{AppStateInner, create_token};
use hirelane_api::repository::Repository;
use hirelane_api::router::router;
use hirelane_db::Database;
use hirelane_types::models::Role;

pub const TEST_SECRET: &str = "integration-test-secret";

/// The real router over a private in-memory database.
pub struct TestApp {
    pub router: Router,
    pub db: Arc<Database>,
}

/// A seeded account and a valid access token for it.
pub struct Account {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let state = AppStateInner::new(
            db.clone(),
            TEST_SECRET.to_string(),
            chrono::Duration::hours(1),
        );
        Self {
            router: router(state),
            db,
        }
    }

    /// Insert a user directly, skipping password hashing.
    pub fn account(&self, fullname: &str, role: Role) -> Account {
        let email = format!("{}@example.com", fullname.to_lowercase().replace(' ', "."));
        let user = Repository::create_user(&*self.db, fullname, &email, "not-a-real-hash", role)
            .unwrap()
            .unwrap();
        let token = create_token(TEST_SECRET, user.id, role, chrono::Duration::hours(1)).unwrap();
        Account { id: user.id, token }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Register a company for `owner` and post one job under it. Returns the job id.
    pub async fn posted_job(&self, owner: &Account, company_name: &str) -> String {
        let (status, json) = self
            .post(
                "/api/v1/company/register",
                Some(&owner.token),
                json!({ "companyName": company_name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        let company_id = json["company"]["id"].as_str().unwrap().to_string();

        let (status, json) = self
            .post(
                "/api/v1/job/post",
                Some(&owner.token),
                json!({
                    "title": "Backend Engineer",
                    "description": "Own the hiring pipeline",
                    "companyId": company_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["job"]["id"].as_str().unwrap().to_string()
    }
}
