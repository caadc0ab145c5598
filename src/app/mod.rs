pub mod client;
pub mod lambda_handler;
pub mod server;

pub use client::{BundleSource, ClientAuth, ContentClient, FetchedBundle};
pub use server::{router, run_server, start_server, AppState};
