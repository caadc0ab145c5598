pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;
pub use config::{local::FileStore, toml_config::SiteConfig, AuthConfig};

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use core::{content_api::ContentService, editor::Editor};
pub use domain::{ContentBundle, Locale};
pub use utils::error::{Result, SiteError};
