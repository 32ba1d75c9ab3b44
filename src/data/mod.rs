//! Data layer: models, projections and SQLite persistence

pub mod database;
pub mod models;
pub mod projections;

pub use database::Database;
pub use models::*;
pub use projections::*;

#[cfg(test)]
mod database_test;
