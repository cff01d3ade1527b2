//! Board client
//!
//! This module contains the board-facing functionality:
//! - The [`Board`] handle and its article cache
//! - Article handles and records
//! - Listing queries and row extraction
//! - Form tokens for authenticated writes

pub mod article;
pub mod board;
pub mod forms;
pub mod listing;

pub use article::{Article, ArticleData, ArticlePatch, ArticleState, Comment, NewArticle, ReadOptions};
pub use board::Board;
pub use listing::{QueryOptions, QueryTarget};
