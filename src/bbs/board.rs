//! Board handle with its bounded article cache.

use log::{debug, info};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::article::{Article, ArticleData, ArticlePatch, NewArticle, ReadOptions};
use super::forms;
use super::listing::{self, QueryOptions};
use crate::config::{self, BoardConfig};
use crate::error::{BoardError, Result};
use crate::metrics;
use crate::session::{FetchRequest, RawResponse, Session};

/// What an article handle needs from its board.
pub(crate) struct BoardLink {
    pub(crate) url: String,
    pub(crate) session: Arc<dyn Session>,
}

/// Article handles keyed by id, with recency order (most recent at the back).
/// Every id in `order` has an entry in `articles` and vice versa.
struct ArticleCache {
    capacity: usize,
    articles: HashMap<u64, Arc<Article>>,
    order: VecDeque<u64>,
}

impl ArticleCache {
    fn new(capacity: usize) -> Self {
        ArticleCache { capacity, articles: HashMap::new(), order: VecDeque::new() }
    }

    /// Evicts at most one entry, and only when already over capacity, so the
    /// cache may hold `capacity + 1` handles between lookups.
    fn lookup(&mut self, id: u64, make: impl FnOnce() -> Article) -> Arc<Article> {
        if self.articles.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.articles.remove(&oldest);
                metrics::inc_cache_eviction();
                debug!("article cache: evicted {}", oldest);
            }
        }

        if let Some(pos) = self.order.iter().position(|cached| *cached == id) {
            self.order.remove(pos);
        }
        self.order.push_back(id);

        match self.articles.get(&id) {
            Some(article) => {
                metrics::inc_cache_hit();
                Arc::clone(article)
            }
            None => {
                metrics::inc_cache_miss();
                let article = Arc::new(make());
                self.articles.insert(id, Arc::clone(&article));
                article
            }
        }
    }
}

/// Client-side handle to one remote board.
///
/// Construction does not check that the board exists. Lookups by id go
/// through a bounded least-recently-used cache of [`Article`] handles; writes
/// and listings return handles that are not cached.
///
/// The cache lock is only held for the synchronous lookup. Overlapping async
/// operations are not coordinated.
pub struct Board {
    link: Arc<BoardLink>,
    cache: Mutex<ArticleCache>,
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache();
        f.debug_struct("Board")
            .field("url", &self.link.url)
            .field("anonymous", &self.link.session.is_anonymous())
            .field("cache_size", &cache.capacity)
            .field("cached", &cache.order)
            .finish()
    }
}

impl Board {
    /// Board at `url` using the process-wide default cache size.
    pub fn new(session: Arc<dyn Session>, url: &str) -> Self {
        Self::with_cache_size(session, url, config::global_article_cache())
    }

    pub fn with_cache_size(session: Arc<dyn Session>, url: &str, cache_size: usize) -> Self {
        Board {
            link: Arc::new(BoardLink { url: url.trim_end_matches('/').to_string(), session }),
            cache: Mutex::new(ArticleCache::new(cache_size)),
        }
    }

    pub fn from_config(session: Arc<dyn Session>, config: &BoardConfig) -> Self {
        match config.cache_size {
            Some(size) => Self::with_cache_size(session, &config.url, size),
            None => Self::new(session, &config.url),
        }
    }

    /// Change the cache size for boards created after this call.
    pub fn set_global_article_cache(size: usize) {
        config::set_global_article_cache(size);
    }

    /// Change this board's cache size; applied on the next lookup.
    pub fn set_article_cache(&self, size: usize) {
        self.cache().capacity = size;
    }

    pub fn cache_size(&self) -> usize {
        self.cache().capacity
    }

    pub fn url(&self) -> &str {
        &self.link.url
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.link.session
    }

    /// Number of cached handles.
    pub fn cached_len(&self) -> usize {
        self.cache().articles.len()
    }

    /// Cached ids, least recently used first.
    pub fn cached_ids(&self) -> Vec<u64> {
        self.cache().order.iter().copied().collect()
    }

    pub(crate) fn link(&self) -> Arc<BoardLink> {
        Arc::clone(&self.link)
    }

    fn cache(&self) -> MutexGuard<'_, ArticleCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle for `id`, cached. No network access.
    pub fn get_article(&self, id: u64) -> Arc<Article> {
        self.cache().lookup(id, || Article::new(self, id))
    }

    pub async fn read_article(&self, id: u64, options: ReadOptions) -> Result<ArticleData> {
        let article = self.get_article(id);
        article.read(options).await
    }

    pub async fn delete_article(&self, id: u64) -> Result<RawResponse> {
        let article = self.get_article(id);
        article.delete().await
    }

    pub async fn edit_article(&self, id: u64, patch: ArticlePatch) -> Result<RawResponse> {
        let article = self.get_article(id);
        article.edit(patch).await
    }

    /// Post a new article. The handle comes from the URL the board redirects
    /// to and is not cached.
    pub async fn write_article(&self, article: NewArticle) -> Result<Arc<Article>> {
        let session = &self.link.session;
        if session.is_anonymous() {
            return Err(BoardError::authentication(
                "anonymous sessions cannot write (an interactive challenge is required)",
            ));
        }

        let write_url = format!("{}/write", self.link.url);
        let page = session.fetch_page(&write_url).await?;
        let tokens = forms::extract_tokens(&page.document(), forms::WRITE_FORM_INPUTS)?;

        let body = forms::article_form(&tokens, &article.category, &article.title, &article.content);
        let response = session
            .fetch(&write_url, FetchRequest::form_post(body, &write_url))
            .await?
            .into_raw();

        let written = Article::from_url(self, &response.url)?;
        metrics::inc_article_written();
        info!("Wrote article {} on {}", written.id(), self.link.url);
        Ok(Arc::new(written))
    }

    /// Articles listed on `page` (1-based), top to bottom.
    pub async fn query_page(&self, page: u32, options: QueryOptions) -> Result<Vec<Arc<Article>>> {
        let url = listing::query_url(&self.link.url, page, &options);
        let listing_page = self.link.session.fetch_page(&url).await?;
        let records = listing::parse_listing(&listing_page.document(), options.include_notices)?;
        debug!("{}: {} articles", url, records.len());
        Ok(records
            .into_iter()
            .map(|data| Arc::new(Article::from_summary(self, data)))
            .collect())
    }

    /// Same as [`query_page`](Self::query_page).
    pub async fn read_page(&self, page: u32, options: QueryOptions) -> Result<Vec<Arc<Article>>> {
        self.query_page(page, options).await
    }
}
