//! Listing pages: query URLs and row extraction.

use chrono::DateTime;
use log::debug;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::article::ArticleData;
use crate::document::{Document, Element};
use crate::error::{BoardError, Result};

/// Rows of the article list, top to bottom.
pub const LIST_ROWS: &str = ".article-list a.vrow";

// Characters that would break out of a query value.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ').add(b'"').add(b'#').add(b'%').add(b'&').add(b'+')
    .add(b'<').add(b'=').add(b'>').add(b'?').add(b'`');

/// Which field a keyword search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTarget {
    All,
    TitleContent,
    Title,
    Content,
    Nickname,
    Comment,
}

impl QueryTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryTarget::All => "all",
            QueryTarget::TitleContent => "title_content",
            QueryTarget::Title => "title",
            QueryTarget::Content => "content",
            QueryTarget::Nickname => "nickname",
            QueryTarget::Comment => "comment",
        }
    }
}

impl fmt::Display for QueryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(QueryTarget::All),
            "title_content" => Ok(QueryTarget::TitleContent),
            "title" => Ok(QueryTarget::Title),
            "content" => Ok(QueryTarget::Content),
            "nickname" => Ok(QueryTarget::Nickname),
            "comment" => Ok(QueryTarget::Comment),
            other => Err(format!("unknown query target '{other}'")),
        }
    }
}

/// Options for [`Board::query_page`](super::Board::query_page).
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Keep rows marked `notice`.
    pub include_notices: bool,
    pub target: Option<QueryTarget>,
    pub keyword: Option<String>,
    pub category: Option<String>,
}

impl QueryOptions {
    pub fn search(target: QueryTarget, keyword: &str) -> Self {
        QueryOptions { target: Some(target), keyword: Some(keyword.to_string()), ..Default::default() }
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_notices(mut self) -> Self {
        self.include_notices = true;
        self
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// `{base}?p={page}[&target=..&keyword=..][&category=..]`
///
/// Target and keyword are only sent together. Keyword and category values
/// are percent-encoded.
pub fn query_url(base: &str, page: u32, options: &QueryOptions) -> String {
    let mut url = format!("{base}?p={page}");
    if let (Some(target), Some(keyword)) = (options.target, options.keyword.as_deref()) {
        if !keyword.is_empty() {
            url.push_str(&format!("&target={}&keyword={}", target, encode(keyword)));
        }
    }
    if let Some(category) = options.category.as_deref().filter(|c| !c.is_empty()) {
        url.push_str(&format!("&category={}", encode(category)));
    }
    url
}

fn row_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)[?]p=(\d+)$").expect("row id pattern"))
}

fn digits_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+").expect("digits pattern"))
}

/// Pick the rows a listing returns.
///
/// The first pass drops `notice-unfilter` rows. Unless notices are wanted,
/// the second pass starts again from *all* rows and drops `notice` rows, so
/// `notice-unfilter` only matters when `include_notices` is set.
pub fn filter_rows<'a, E: Element + ?Sized>(rows: &'a [Box<E>], include_notices: bool) -> Vec<&'a E> {
    let mut filtered: Vec<&E> = rows.iter()
        .map(|r| &**r)
        .filter(|r| !r.has_class("notice-unfilter"))
        .collect();
    if !include_notices {
        filtered = rows.iter()
            .map(|r| &**r)
            .filter(|r| !r.has_class("notice"))
            .collect();
    }
    filtered
}

/// Parse every listed row of a board page into summary records.
pub fn parse_listing(doc: &dyn Document, include_notices: bool) -> Result<Vec<ArticleData>> {
    let rows = doc.select(LIST_ROWS)?;
    let kept = filter_rows(&rows, include_notices);
    debug!("listing: {} rows, {} kept", rows.len(), kept.len());
    kept.into_iter().map(|row| parse_row(row)).collect()
}

fn parse_number<T: FromStr>(text: &str, what: &str) -> Result<T> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse()
        .map_err(|_| BoardError::malformed(format!("{what} is not a number: '{}'", text.trim())))
}

/// Extract one summary record from a listing row.
pub fn parse_row(row: &dyn Element) -> Result<ArticleData> {
    let href = row.attr_required("href")?;
    let id = row_id_pattern()
        .captures(&href)
        .and_then(|c| c.get(1))
        .ok_or_else(|| BoardError::malformed(format!("row link has no article id: {href}")))
        .and_then(|m| parse_number::<u64>(m.as_str(), "article id"))?;

    let author = row.select_required(".user-info")?
        .first_element_child()
        .ok_or_else(|| BoardError::malformed(format!("row {id}: empty .user-info")))?
        .attr_required("data-filter")?;

    let category = row.select_required(".badge")?.text();
    let title = row.select_required(".title")?.text().replace('\n', "");

    let datetime = row.select_required(".col-time time")?.attr_required("datetime")?;
    let time = DateTime::parse_from_rfc3339(datetime.trim())
        .map_err(|e| BoardError::malformed(format!("row {id}: bad datetime '{datetime}': {e}")))?;

    let views = parse_number(&row.select_required(".col-view")?.text(), "view count")?;
    let rate_diff = parse_number(&row.select_required(".col-rate")?.text(), "rating")?;

    let comment_count = match row.select_first(".comment-count")? {
        Some(el) => {
            let text = el.text();
            let digits = digits_pattern()
                .find(&text)
                .ok_or_else(|| BoardError::malformed(format!("row {id}: comment count '{text}'")))?;
            parse_number(digits.as_str(), "comment count")?
        }
        None => 0,
    };

    Ok(ArticleData {
        id,
        author,
        title,
        category,
        is_notice: row.has_class("notice"),
        time,
        views,
        comment_count,
        rate_diff,
        is_summary: true,
        content: None,
        comments: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_only() {
        assert_eq!(query_url("https://board.example/b", 1, &QueryOptions::default()), "https://board.example/b?p=1");
    }

    #[test]
    fn search_and_category() {
        let opts = QueryOptions::search(QueryTarget::Title, "foo").with_category("notice");
        assert_eq!(
            query_url("https://board.example/b", 2, &opts),
            "https://board.example/b?p=2&target=title&keyword=foo&category=notice"
        );
    }

    #[test]
    fn keyword_without_target_is_ignored() {
        let opts = QueryOptions { keyword: Some("foo".into()), ..Default::default() };
        assert_eq!(query_url("https://board.example/b", 3, &opts), "https://board.example/b?p=3");
    }

    #[test]
    fn values_are_percent_encoded() {
        let opts = QueryOptions::search(QueryTarget::All, "a&b c").with_category("잡담");
        assert_eq!(
            query_url("https://board.example/b", 1, &opts),
            "https://board.example/b?p=1&target=all&keyword=a%26b%20c&category=%EC%9E%A1%EB%8B%B4"
        );
    }

    #[test]
    fn query_target_parsing() {
        assert_eq!("TITLE_CONTENT".parse::<QueryTarget>().unwrap(), QueryTarget::TitleContent);
        assert!("subject".parse::<QueryTarget>().is_err());
    }
}
