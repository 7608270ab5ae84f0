//! Database module for SQLite persistence

mod migrations;
mod models;
mod repository;

pub use models::{DbGroup, DbMessage, Questionnaire};
pub use repository::{Database, DatabaseError};
