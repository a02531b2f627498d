/*!
 * Database module for persistent storage of jobs and translations.
 *
 * This module provides SQLite-based persistence for:
 * - The job queue, so queued work survives a restart
 * - The translation cache, when the sqlite cache backend is selected
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

pub use connection::{DatabaseConnection, DatabaseStats};
pub use repository::Repository;
