use std::collections::BTreeMap;

use chrono::Utc;
use sha1::{Digest, Sha1};

use crate::config::CloudinaryConfig;

/// Everything a browser needs to post a file straight to the media host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSignature {
    pub signature: String,
    pub timestamp: i64,
    pub api_key: String,
    pub cloud_name: String,
    pub folder: String,
}

#[derive(Clone)]
pub struct UploadSigner {
    cloud_name: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

impl UploadSigner {
    pub fn from_config(config: &CloudinaryConfig) -> Self {
        Self {
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.upload_folder.clone(),
        }
    }

    /// Signs an upload for the current server time.
    pub fn sign_upload(&self) -> UploadSignature {
        self.sign_upload_at(Utc::now().timestamp())
    }

    pub fn sign_upload_at(&self, timestamp: i64) -> UploadSignature {
        let signature = sign_params(&self.upload_params(timestamp), &self.api_secret);
        UploadSignature {
            signature,
            timestamp,
            api_key: self.api_key.clone(),
            cloud_name: self.cloud_name.clone(),
            folder: self.folder.clone(),
        }
    }

    /// Checks that `signature` was produced by this signer for its own
    /// timestamp and folder.
    pub fn verify(&self, signature: &UploadSignature) -> bool {
        signature.folder == self.folder
            && sign_params(&self.upload_params(signature.timestamp), &self.api_secret)
                == signature.signature
    }

    fn upload_params(&self, timestamp: i64) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("folder", self.folder.clone()),
            ("timestamp", timestamp.to_string()),
        ])
    }
}

/// `k=v` pairs sorted by key and joined with `&`. Empty values are skipped.
pub fn string_to_sign(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Media host request signature: hex encoded SHA-1 of the canonical
/// parameter string immediately followed by the API secret.
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
