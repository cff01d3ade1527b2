//! Library entry for arcabbs components used by the binary and tests.

pub mod bbs;
pub mod config;
pub mod document;
pub mod error;
pub mod metrics;
pub mod session;

pub use bbs::{Article, ArticleData, Board, QueryOptions, ReadOptions};
pub use error::{BoardError, Result};
