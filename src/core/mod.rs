pub mod auth;
pub mod content_api;
pub mod crop;
pub mod editor;
pub mod i18n;
pub mod markdown;
pub mod reconcile;
pub mod render;
pub mod save;
pub mod scan;
pub mod upload;

pub use crate::domain::model::{ContentBundle, ContentModel, ServiceCard};
pub use crate::domain::ports::{BundleSink, ConfigProvider, Storage};
pub use crate::utils::error::Result;
pub use content_api::{ApiError, ContentService};
pub use editor::Editor;
pub use upload::UploadService;
