/*!
 * Database module for persistent storage.
 *
 * This module provides SQLite-based persistence for:
 * - The durable tier of the translation cache (key, value, expiry)
 * - Performance and per-model statistics
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

pub use connection::{DatabaseConnection, DatabaseStats};
pub use models::{CacheRecord, CacheStats};
pub use repository::Repository;
