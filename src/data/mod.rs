//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Row models and denormalized read models
//! - Pagination and sorting

mod database;
mod models;
mod page;

pub use database::Database;
pub use models::*;
pub use page::{
    DEFAULT_LIMIT, DEFAULT_PAGE, MAX_LIMIT, Page, PageRequest, SortDirection, VideoQuery,
    VideoSortField,
};
