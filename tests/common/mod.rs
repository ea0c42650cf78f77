use std::collections::{HashMap, HashSet};
use std::env;
use std::sync::Arc;

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use diesel::connection::SimpleConnection;
use diesel::PgConnection;
use http_body_util::BodyExt;
use once_cell::sync::Lazy;
use pdfvault::config::{AppConfig, CloudinaryConfig};
use pdfvault::db::{self, PgPool};
use pdfvault::media::{MediaError, MediaHost};
use pdfvault::routes;
use pdfvault::state::AppState;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::util::ServiceExt;

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

type DestroyHook = Box<dyn FnOnce() + Send>;

/// Records every destroy call and fails the ids it was told to.
#[derive(Default)]
pub struct FakeMediaHost {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    before_destroy: Mutex<Option<DestroyHook>>,
}

#[async_trait]
impl MediaHost for FakeMediaHost {
    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let hook = self.before_destroy.lock().await.take();
        if let Some(hook) = hook {
            hook();
        }
        self.calls.lock().await.push(public_id.to_string());
        if self.failing.lock().await.contains(public_id) {
            return Err(MediaError::Rejected {
                status: 500,
                message: format!("refused to delete {public_id}"),
            });
        }
        Ok(())
    }
}

impl FakeMediaHost {
    #[allow(dead_code)]
    pub async fn fail_on(&self, public_id: &str) {
        self.failing.lock().await.insert(public_id.to_string());
    }

    #[allow(dead_code)]
    pub async fn recover(&self, public_id: &str) {
        self.failing.lock().await.remove(public_id);
    }

    /// Runs `hook` once, inside the next destroy call.
    #[allow(dead_code)]
    pub async fn before_next_destroy(&self, hook: impl FnOnce() + Send + 'static) {
        *self.before_destroy.lock().await = Some(Box::new(hook));
    }

    #[allow(dead_code)]
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    #[allow(dead_code)]
    pub async fn call_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for id in self.calls.lock().await.iter() {
            *counts.entry(id.clone()).or_insert(0) += 1;
        }
        counts
    }
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
    media: Arc<FakeMediaHost>,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            cors_allowed_origin: None,
            cloudinary: CloudinaryConfig {
                cloud_name: "test-cloud".to_string(),
                api_key: "test-key".to_string(),
                api_secret: "test-secret".to_string(),
                upload_folder: "test_folder".to_string(),
                api_base: "http://127.0.0.1:9".to_string(),
                request_timeout_secs: 1,
            },
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        prepare_database(&pool).await?;

        let media = Arc::new(FakeMediaHost::default());
        let media_for_state: Arc<dyn MediaHost> = media.clone();
        let state = AppState::new(pool, config, media_for_state);
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            router,
            media,
        })
    }

    pub async fn cleanup(&self) -> Result<()> {
        self.with_conn(truncate_all).await
    }

    #[allow(dead_code)]
    pub fn media(&self) -> Arc<FakeMediaHost> {
        self.media.clone()
    }

    #[allow(dead_code)]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Runs a GraphQL document and returns the raw JSON response.
    pub async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        execute_graphql(self.router.clone(), query, variables).await
    }

    #[allow(dead_code)]
    pub async fn get(&self, path: &str) -> Result<hyper::Response<Body>> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn create_user(&self, email: &str, role: &str) -> Result<Value> {
        let response = self
            .graphql(
                CREATE_USER,
                json!({ "email": email, "role": role, "tenantId": "org_123" }),
            )
            .await?;
        Ok(data(&response)?["createUser"].clone())
    }

    #[allow(dead_code)]
    pub async fn create_collection(&self, name: &str, uploader_id: &str) -> Result<Value> {
        let response = self
            .graphql(
                CREATE_COLLECTION,
                json!({ "name": name, "uploaderId": uploader_id, "tenantId": "org_123" }),
            )
            .await?;
        Ok(data(&response)?["createCollection"].clone())
    }

    #[allow(dead_code)]
    pub async fn save_pdf(
        &self,
        filename: &str,
        cloudinary_id: &str,
        collection_id: &str,
    ) -> Result<Value> {
        let response = self
            .graphql(
                SAVE_PDF,
                json!({
                    "filename": filename,
                    "cloudinaryId": cloudinary_id,
                    "secureUrl": format!("https://res.cloudinary.com/test-cloud/image/upload/{cloudinary_id}.pdf"),
                    "collectionId": collection_id,
                }),
            )
            .await?;
        Ok(data(&response)?["savePdf"].clone())
    }

    #[allow(dead_code)]
    pub async fn my_collections(&self, uploader_id: &str) -> Result<Vec<Value>> {
        let response = self
            .graphql(MY_COLLECTIONS, json!({ "uploaderId": uploader_id }))
            .await?;
        let collections = data(&response)?["myCollections"]
            .as_array()
            .cloned()
            .ok_or_else(|| anyhow!("myCollections is not a list: {response}"))?;
        Ok(collections)
    }

    #[allow(dead_code)]
    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

#[allow(dead_code)]
pub const CREATE_USER: &str = r#"
    mutation CreateUser($email: String!, $role: String!, $tenantId: String!, $password: String) {
        createUser(email: $email, role: $role, tenantId: $tenantId, password: $password) {
            id
            display_id
            email
            role
            tenant_id
        }
    }
"#;

#[allow(dead_code)]
pub const CREATE_COLLECTION: &str = r#"
    mutation CreateCollection($name: String!, $uploaderId: String!, $tenantId: String!) {
        createCollection(name: $name, uploaderId: $uploaderId, tenantId: $tenantId) {
            id
            name
            uploader_id
            tenant_id
            pdfs { id }
        }
    }
"#;

#[allow(dead_code)]
pub const SAVE_PDF: &str = r#"
    mutation SavePdf($filename: String!, $cloudinaryId: String!, $secureUrl: String!, $collectionId: String!) {
        savePdf(filename: $filename, cloudinaryId: $cloudinaryId, secureUrl: $secureUrl, collectionId: $collectionId) {
            id
            filename
            cloudinary_id
            secure_url
            collection_id
        }
    }
"#;

#[allow(dead_code)]
pub const MY_COLLECTIONS: &str = r#"
    query MyCollections($uploaderId: String!) {
        myCollections(uploaderId: $uploaderId) {
            id
            name
            pdfs { id filename cloudinary_id secure_url }
        }
    }
"#;

#[allow(dead_code)]
pub const DELETE_PDF: &str = r#"
    mutation DeletePdf($id: ID!) {
        deletePdf(id: $id) { id filename cloudinary_id }
    }
"#;

#[allow(dead_code)]
pub const DELETE_COLLECTION: &str = r#"
    mutation DeleteCollection($id: ID!) {
        deleteCollection(id: $id) { id name pdfs { id cloudinary_id } }
    }
"#;

pub async fn execute_graphql(router: Router, query: &str, variables: Value) -> Result<Value> {
    let body = serde_json::to_vec(&json!({ "query": query, "variables": variables }))?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/graphql")
        .header("content-type", "application/json")
        .body(Body::from(body))?;
    let response = router.oneshot(request).await.expect("infallible response");
    ensure!(
        response.status() == StatusCode::OK,
        "graphql request failed with status {}",
        response.status()
    );
    let bytes = body_to_vec(response.into_body()).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// The `data` object of a response that must not carry errors.
pub fn data(response: &Value) -> Result<&Value> {
    ensure!(
        response.get("errors").is_none(),
        "unexpected graphql errors: {response}"
    );
    response
        .get("data")
        .ok_or_else(|| anyhow!("response has no data: {response}"))
}

/// `extensions.code` of the first error in a response.
#[allow(dead_code)]
pub fn error_code(response: &Value) -> Option<&str> {
    response["errors"][0]["extensions"]["code"].as_str()
}

#[allow(dead_code)]
pub fn error_message(response: &Value) -> Option<&str> {
    response["errors"][0]["message"].as_str()
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        db::run_migrations(&pool)?;
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE pdfs, collections, role_counters, users RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
