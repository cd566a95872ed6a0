//! Storage layer for I Need A Smile

pub mod db;
pub mod models;

pub use db::Database;
pub use models::*;
