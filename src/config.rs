use std::env;

use anyhow::{Context, Result};
use url::Url;

use crate::db::DEFAULT_MAX_POOL_SIZE;

pub const DEFAULT_UPLOAD_FOLDER: &str = "saas_pdfs";
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_pool_size: u32,
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origin: Option<String>,
    pub cloudinary: CloudinaryConfig,
}

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_folder: String,
    pub api_base: String,
    pub request_timeout_secs: u64,
}

// Keeps the API secret out of `{:?}` output and therefore out of logs.
impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"*****")
            .field("upload_folder", &self.upload_folder)
            .field("api_base", &self.api_base)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_pool_size = env::var("DATABASE_MAX_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_POOL_SIZE);
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parse_port(
            env::var("SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .ok()
                .as_deref(),
        )?;
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();

        let cloud_name =
            env::var("CLOUDINARY_CLOUD_NAME").context("CLOUDINARY_CLOUD_NAME must be set")?;
        let api_key = env::var("CLOUDINARY_API_KEY").context("CLOUDINARY_API_KEY must be set")?;
        let api_secret =
            env::var("CLOUDINARY_API_SECRET").context("CLOUDINARY_API_SECRET must be set")?;
        let upload_folder = env::var("CLOUDINARY_UPLOAD_FOLDER")
            .unwrap_or_else(|_| DEFAULT_UPLOAD_FOLDER.to_string());
        let api_base = env::var("CLOUDINARY_API_BASE")
            .unwrap_or_else(|_| DEFAULT_CLOUDINARY_API_BASE.to_string());
        Url::parse(&api_base).context("CLOUDINARY_API_BASE must be a valid URL")?;
        let request_timeout_secs = env::var("MEDIA_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("MEDIA_REQUEST_TIMEOUT_SECS must be an integer")?;

        Ok(Self {
            database_url,
            database_max_pool_size,
            server_host,
            server_port,
            cors_allowed_origin,
            cloudinary: CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                upload_folder,
                api_base,
                request_timeout_secs,
            },
        })
    }

    pub fn redacted_database_url(&self) -> String {
        redact_database_url(&self.database_url)
    }
}

fn parse_port(raw: Option<&str>) -> Result<u16> {
    raw.unwrap_or("4000")
        .parse()
        .context("SERVER_PORT must be a valid u16")
}

fn redact_database_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut parsed) => {
            let _ = parsed.set_password(Some("*****"));
            parsed.to_string()
        }
        Err(_) => "***".to_string(),
    }
}
