use crate::domain::model::ContentBundle;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Key-value namespace holding the bundle (and, for file stores, uploads).
pub trait Storage: Send + Sync {
    /// `None` when the key has never been written.
    fn read(&self, key: &str) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write(&self, key: &str, data: &[u8]) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Authorization settings shared by every deployment variant.
pub trait ConfigProvider: Send + Sync {
    /// Lowercased, trimmed, non-empty entries.
    fn admin_emails(&self) -> &[String];
    fn dev_bypass_enabled(&self) -> bool;
    fn dev_admin_token(&self) -> Option<&str>;
}

/// Destination of editor saves: a store, the remote API, or a test double.
#[async_trait]
pub trait BundleSink: Send + Sync {
    async fn save(&self, bundle: &ContentBundle) -> Result<()>;
}
