//! # Configuration Management Module
//!
//! This module handles the configuration of the board client: how the HTTP
//! session is built, which board is opened, how large the article cache is,
//! and how verbose logging should be.
//!
//! ## Configuration Structure
//!
//! - [`SessionConfig`] - Transport settings (user agent, timeout, cookies, anonymity)
//! - [`BoardConfig`] - Board URL and optional per-board cache size
//! - [`LoggingConfig`] - Logging level
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arcabbs::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration from file
//!     let config = Config::load("config.toml").await?;
//!     println!("Board: {}", config.board.url);
//!
//!     // Create default configuration
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [session]
//! user_agent = "arcabbs/0.1"
//! timeout_secs = 10
//! anonymous = true
//!
//! [board]
//! url = "https://arca.live/b/breaking"
//! cache_size = 64
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## Article cache size
//!
//! Every [`Board`](crate::bbs::Board) owns a bounded article cache. Its
//! capacity is resolved once, when the board is constructed:
//!
//! 1. an explicit capacity (`Board::with_cache_size`, or `[board] cache_size`)
//! 2. the process-wide default set through [`set_global_article_cache`]
//! 3. [`DEFAULT_ARTICLE_CACHE`]
//!
//! Changing the process-wide default never touches boards that already exist.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;

/// Article cache capacity used when nothing else is configured.
pub const DEFAULT_ARTICLE_CACHE: usize = 64;

static GLOBAL_ARTICLE_CACHE: AtomicUsize = AtomicUsize::new(DEFAULT_ARTICLE_CACHE);

/// Set the article cache capacity used by boards constructed from now on.
pub fn set_global_article_cache(size: usize) {
    GLOBAL_ARTICLE_CACHE.store(size, Ordering::Relaxed);
}

/// Current process-wide article cache capacity.
pub fn global_article_cache() -> usize {
    GLOBAL_ARTICLE_CACHE.load(Ordering::Relaxed)
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    pub board: BoardConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Anonymous sessions may read but never write.
    pub anonymous: bool,
    /// Raw `Cookie` header sent with every request (authenticated sessions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content).await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Reject values the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.board.url)
            .map_err(|e| anyhow!("Invalid board url {}: {}", self.board.url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("Board url must be http(s): {}", self.board.url));
        }
        if self.session.timeout_secs == 0 {
            return Err(anyhow!("session.timeout_secs must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            session: SessionConfig {
                user_agent: format!("arcabbs/{}", env!("CARGO_PKG_VERSION")),
                timeout_secs: 10,
                anonymous: true,
                cookie: None,
            },
            board: BoardConfig {
                url: "https://arca.live/b/breaking".to_string(),
                cache_size: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
