/*!
 * Database module for persistent storage.
 *
 * This module provides SQLite-based persistence for:
 * - Source documents and their translations (`Repository`)
 * - A cache table that survives restarts (`SqliteCache`)
 */

pub mod cache;
pub mod connection;
pub mod repository;
pub mod schema;

// Re-export main types
pub use cache::SqliteCache;
pub use connection::DatabaseConnection;
pub use repository::Repository;
