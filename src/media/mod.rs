//! The external media host that stores PDF bytes.
//!
//! Browsers upload straight to the host with a signature minted by
//! [`signing::UploadSigner`]; the server only ever deletes assets.

use async_trait::async_trait;
use thiserror::Error;

pub mod cloudinary;
pub mod signing;

pub use cloudinary::CloudinaryClient;
pub use signing::{UploadSignature, UploadSigner};

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media host request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("media host rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("media host returned unexpected result '{0}'")]
    UnexpectedResult(String),
}

#[async_trait]
pub trait MediaHost: Send + Sync + 'static {
    /// Removes the asset with the given public id. Removing an asset that is
    /// already gone succeeds.
    async fn destroy(&self, public_id: &str) -> Result<(), MediaError>;
}
