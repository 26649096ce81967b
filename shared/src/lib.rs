pub mod auth;
pub mod backend;
pub mod calendar;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod forms;
pub mod models;
pub mod stats;

pub use backend::{connect, DatabaseBackend, JournalBackend, SharedBackend, SupabaseBackend};
pub use config::{BackendKind, Config, LogFormat};
pub use database::{connect_and_migrate, get_db_connection};
pub use error::{JournalError, Result};
pub use models::*;
