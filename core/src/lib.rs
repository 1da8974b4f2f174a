pub mod models;
pub mod store;
pub mod session;
pub mod signal;
pub mod deck;
pub mod services;
pub mod client;
pub mod utils;
pub mod constants;

pub use utils::config::Config;
pub use store::{Store, StoreError};
pub use session::Session;
pub use client::Mingle;

// Re-export common types
pub use anyhow::Result;
pub use uuid::Uuid;
pub use chrono::{DateTime, Utc};
