//! Article handles and the records they carry.

use chrono::{DateTime, FixedOffset};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::board::{Board, BoardLink};
use super::forms;
use crate::document::{Document, Element};
use crate::error::{BoardError, Result};
use crate::session::{FetchRequest, FormBody, Page, RawResponse};

/// Everything known about one article.
///
/// Listing rows produce summary records (`is_summary`, no content); a full
/// read fills `content` and, when asked for, `comments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleData {
    pub id: u64,
    pub author: String,
    pub title: String,
    pub category: String,
    pub is_notice: bool,
    pub time: DateTime<FixedOffset>,
    pub views: u64,
    pub comment_count: u64,
    pub rate_diff: i64,
    pub is_summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

/// A comment as shown under an article. Replies are not nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub content: String,
    pub time: DateTime<FixedOffset>,
}

/// What a handle currently knows about its article.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticleState {
    /// Only the id; the article may not exist.
    Referenced,
    /// Fields from a listing row.
    Summary(ArticleData),
    /// Full content fetched from the article page.
    Loaded(ArticleData),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Fetch even if content is already loaded.
    pub no_cache: bool,
    /// Also collect the comments.
    pub with_comments: bool,
}

/// Fields of a new article.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub category: String,
    pub title: String,
    pub content: String,
}

/// Partial update; `None` keeps the current remote value.
#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
}

// Article page layout.
const HEAD: &str = ".article-head";
const HEAD_TITLE: &str = ".article-head .title";
const HEAD_BADGE: &str = ".article-head .badge";
const HEAD_NOTICE: &str = ".article-head .notice";
const HEAD_USER: &str = ".article-head .user-info";
const HEAD_TIME: &str = ".article-head .article-info time";
const INFO_VIEWS: &str = ".article-info .article-views";
const INFO_RATE: &str = ".article-info .article-rate";
const INFO_COMMENTS: &str = ".article-info .article-comments";
const BODY: &str = ".article-body .article-content";
const COMMENT_ITEMS: &str = ".article-comment .comment-item";

/// Handle to one article on a board.
///
/// Creating a handle never touches the network. Holders may keep a handle
/// after the board evicts it; it stays usable.
pub struct Article {
    id: u64,
    board: Arc<BoardLink>,
    state: Mutex<ArticleState>,
}

impl std::fmt::Debug for Article {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Article")
            .field("id", &self.id)
            .field("board", &self.board.url)
            .field("state", &*self.lock())
            .finish()
    }
}

impl Article {
    /// Handle carrying only an id.
    pub fn new(board: &Board, id: u64) -> Self {
        Article { id, board: board.link(), state: Mutex::new(ArticleState::Referenced) }
    }

    /// Handle for the article at `url`; the id is the last numeric path segment.
    pub fn from_url(board: &Board, url: &str) -> Result<Self> {
        Ok(Self::new(board, article_id_from_url(url)?))
    }

    /// Handle seeded with a listing record.
    pub fn from_summary(board: &Board, data: ArticleData) -> Self {
        Article { id: data.id, board: board.link(), state: Mutex::new(ArticleState::Summary(data)) }
    }

    pub fn id(&self) -> u64 { self.id }

    pub fn url(&self) -> String {
        format!("{}/{}", self.board.url, self.id)
    }

    pub fn state(&self) -> ArticleState {
        self.lock().clone()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock(), ArticleState::Loaded(_))
    }

    /// Summary or loaded data, whichever the handle holds.
    pub fn data(&self) -> Option<ArticleData> {
        match &*self.lock() {
            ArticleState::Referenced => None,
            ArticleState::Summary(d) | ArticleState::Loaded(d) => Some(d.clone()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ArticleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, with_comments: bool) -> Option<ArticleData> {
        match &*self.lock() {
            ArticleState::Loaded(d) if !with_comments || d.comments.is_some() => Some(d.clone()),
            _ => None,
        }
    }

    /// Drop fetched content so the next read goes to the board.
    pub fn invalidate(&self) {
        *self.lock() = ArticleState::Referenced;
    }

    async fn fetch_page(&self, url: &str) -> Result<Page> {
        match self.board.session.fetch_page(url).await {
            Err(e) if e.status() == Some(404) => Err(BoardError::NotFound { id: self.id }),
            other => other,
        }
    }

    /// Read the full article, from the handle when already loaded.
    pub async fn read(&self, options: ReadOptions) -> Result<ArticleData> {
        if !options.no_cache {
            if let Some(data) = self.cached(options.with_comments) {
                debug!("article {}: served from handle", self.id);
                return Ok(data);
            }
        }
        let page = self.fetch_page(&self.url()).await?;
        let data = parse_article_page(&page.document(), self.id, options.with_comments)?;
        *self.lock() = ArticleState::Loaded(data.clone());
        Ok(data)
    }

    /// Submit the edit form. Fields missing from `patch` keep their current values.
    pub async fn edit(&self, patch: ArticlePatch) -> Result<RawResponse> {
        let current = self.read(ReadOptions::default()).await?;
        let edit_url = format!("{}/edit", self.url());
        let page = self.fetch_page(&edit_url).await?;
        let tokens = forms::extract_tokens(&page.document(), forms::WRITE_FORM_INPUTS)?;

        let body = forms::article_form(
            &tokens,
            patch.category.as_deref().unwrap_or(&current.category),
            patch.title.as_deref().unwrap_or(&current.title),
            patch.content.as_deref().or(current.content.as_deref()).unwrap_or_default(),
        );
        info!("Editing article {} on {}", self.id, self.board.url);
        let response = self.board.session
            .fetch(&edit_url, FetchRequest::form_post(body, &edit_url))
            .await?
            .into_raw();
        self.invalidate();
        Ok(response)
    }

    /// Delete the article.
    pub async fn delete(&self) -> Result<RawResponse> {
        let url = self.url();
        let page = self.fetch_page(&url).await?;
        let csrf = forms::extract_csrf(&page.document())?;

        let mut body = FormBody::new();
        body.append("_csrf", &csrf);
        info!("Deleting article {} on {}", self.id, self.board.url);
        let response = self.board.session
            .fetch(&format!("{url}/delete"), FetchRequest::form_post(body, &url))
            .await?
            .into_raw();
        self.invalidate();
        Ok(response)
    }
}

/// Numeric id from the last non-empty path segment of `url`.
pub fn article_id_from_url(url: &str) -> Result<u64> {
    let parsed = url::Url::parse(url)?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .and_then(|segment| segment.parse().ok())
        .ok_or_else(|| BoardError::InvalidUrl(format!("no article id in {url}")))
}

fn count_or_zero<T: std::str::FromStr + Default>(doc: &dyn Document, selector: &str) -> Result<T> {
    match doc.select_first(selector)? {
        Some(el) => {
            let text = el.text();
            let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
            cleaned.parse()
                .map_err(|_| BoardError::malformed(format!("`{selector}` is not a number: '{}'", text.trim())))
        }
        None => Ok(T::default()),
    }
}

fn parse_time(el: &dyn Element) -> Result<DateTime<FixedOffset>> {
    let raw = el.attr_required("datetime")?;
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|e| BoardError::malformed(format!("bad datetime '{raw}': {e}")))
}

fn author_of(user_info: &dyn Element) -> Result<String> {
    user_info
        .first_element_child()
        .ok_or_else(|| BoardError::malformed("empty .user-info"))?
        .attr_required("data-filter")
}

fn parse_comment(item: &dyn Element) -> Result<Comment> {
    Ok(Comment {
        author: author_of(item.select_required(".user-info")?.as_ref())?,
        content: item.select_required(".message")?.text().trim().to_string(),
        time: parse_time(item.select_required("time")?.as_ref())?,
    })
}

/// Parse an article page into a full record.
pub fn parse_article_page(doc: &dyn Document, id: u64, with_comments: bool) -> Result<ArticleData> {
    doc.select_required(HEAD)?;
    let comments = if with_comments {
        let items = doc.select(COMMENT_ITEMS)?;
        Some(items.iter().map(|item| parse_comment(item.as_ref())).collect::<Result<Vec<_>>>()?)
    } else {
        None
    };

    Ok(ArticleData {
        id,
        author: author_of(doc.select_required(HEAD_USER)?.as_ref())?,
        title: doc.select_required(HEAD_TITLE)?.text().replace('\n', "").trim().to_string(),
        category: doc.select_first(HEAD_BADGE)?.map(|b| b.text().trim().to_string()).unwrap_or_default(),
        is_notice: doc.select_first(HEAD_NOTICE)?.is_some(),
        time: parse_time(doc.select_required(HEAD_TIME)?.as_ref())?,
        views: count_or_zero(doc, INFO_VIEWS)?,
        comment_count: count_or_zero(doc, INFO_COMMENTS)?,
        rate_diff: count_or_zero(doc, INFO_RATE)?,
        is_summary: false,
        content: Some(doc.select_required(BODY)?.inner_html().trim().to_string()),
        comments,
    })
}
