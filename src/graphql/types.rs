use async_graphql::{SimpleObject, ID};
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::media::UploadSignature;
use crate::models::{Collection, Pdf, User};

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "User", rename_fields = "snake_case")]
pub struct UserObject {
    pub id: ID,
    pub display_id: String,
    pub email: String,
    pub role: String,
    pub tenant_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "PDF", rename_fields = "snake_case")]
pub struct PdfObject {
    pub id: ID,
    pub filename: String,
    pub cloudinary_id: String,
    pub secure_url: String,
    pub collection_id: ID,
    pub created_at: String,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Collection", rename_fields = "snake_case")]
pub struct CollectionObject {
    pub id: ID,
    pub name: String,
    pub uploader_id: ID,
    pub tenant_id: String,
    pub created_at: String,
    pub pdfs: Vec<PdfObject>,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "CloudinarySignature")]
pub struct UploadSignatureObject {
    pub signature: String,
    pub timestamp: i64,
    pub api_key: String,
    pub cloud_name: String,
    pub folder: String,
}

impl From<User> for UserObject {
    fn from(user: User) -> Self {
        Self {
            id: ID(user.id.to_string()),
            display_id: user.display_id,
            email: user.email,
            role: user.role,
            tenant_id: user.tenant_id,
            created_at: to_iso(user.created_at),
        }
    }
}

impl From<Pdf> for PdfObject {
    fn from(pdf: Pdf) -> Self {
        Self {
            id: ID(pdf.id.to_string()),
            filename: pdf.filename,
            cloudinary_id: pdf.cloudinary_id,
            secure_url: pdf.secure_url,
            collection_id: ID(pdf.collection_id.to_string()),
            created_at: to_iso(pdf.created_at),
        }
    }
}

impl CollectionObject {
    pub fn new(collection: Collection, pdfs: Vec<Pdf>) -> Self {
        Self {
            id: ID(collection.id.to_string()),
            name: collection.name,
            uploader_id: ID(collection.uploader_id.to_string()),
            tenant_id: collection.tenant_id,
            created_at: to_iso(collection.created_at),
            pdfs: pdfs.into_iter().map(PdfObject::from).collect(),
        }
    }
}

impl From<UploadSignature> for UploadSignatureObject {
    fn from(signed: UploadSignature) -> Self {
        Self {
            signature: signed.signature,
            timestamp: signed.timestamp,
            api_key: signed.api_key,
            cloud_name: signed.cloud_name,
            folder: signed.folder,
        }
    }
}

pub(crate) fn to_iso(dt: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).to_rfc3339()
}

/// Parses a client supplied identifier, naming the argument on failure.
pub(crate) fn parse_id(field: &str, raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::bad_request(format!("{field} must be a valid UUID")))
}

/// Width of the `VARCHAR(255)` text columns.
pub(crate) const MAX_TEXT_LEN: usize = 255;

/// Trims `raw` and rejects it when nothing is left or when it would not fit
/// a column of `max` characters.
pub(crate) fn required(field: &str, raw: &str, max: usize) -> AppResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::bad_request(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}
