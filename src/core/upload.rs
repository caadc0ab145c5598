use crate::core::content_api::ApiError;
use crate::domain::ports::Storage;
use serde::{Deserialize, Serialize};

const DEFAULT_EXTENSION: &str = ".png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub url: String,
}

/// Stores uploaded photos under a public prefix.
pub struct UploadService<S: Storage> {
    store: S,
    public_prefix: String,
    max_bytes: usize,
}

impl<S: Storage> UploadService<S> {
    pub fn new(store: S, public_prefix: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            store,
            public_prefix: public_prefix.into(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn accept(
        &self,
        original_name: Option<&str>,
        data: Option<&[u8]>,
    ) -> Result<UploadReceipt, ApiError> {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            return Err(ApiError::bad_request("file is required"));
        };

        if data.len() > self.max_bytes {
            tracing::warn!("⚠️ Upload of {} bytes over the {} byte limit", data.len(), self.max_bytes);
            return Err(ApiError::PayloadTooLarge {
                max_bytes: self.max_bytes,
            });
        }

        let file_name = generate_upload_name(
            original_name.unwrap_or_default(),
            chrono::Utc::now().timestamp_millis(),
            &random_hex(),
        );

        self.store.write(&file_name, data).await?;
        tracing::info!("📷 Stored upload {} ({} bytes)", file_name, data.len());

        Ok(UploadReceipt {
            url: format!("{}/{}", self.public_prefix.trim_end_matches('/'), file_name),
        })
    }
}

/// `u_<millis>_<hex><ext>`; the extension comes from the client's file name.
pub fn generate_upload_name(original_name: &str, millis: i64, random_hex: &str) -> String {
    format!("u_{}_{}{}", millis, random_hex, upload_extension(original_name))
}

/// Lowercased extension with its dot, `.png` when absent or unusable.
pub fn upload_extension(original_name: &str) -> String {
    std::path::Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn random_hex() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    simple[..16].to_string()
}
