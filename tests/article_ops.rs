mod common;

use arcabbs::bbs::{ArticlePatch, ArticleState, Board, ReadOptions};
use arcabbs::error::BoardError;
use common::{article_page, write_page, MockSession, Reply, BOARD};

#[tokio::test]
async fn read_fetches_once_then_serves_handle() {
    let session = MockSession::authenticated();
    session.html(&format!("{BOARD}/77"), &article_page(77, "Line one\nline two", "body text"));
    let board = Board::with_cache_size(session.clone(), BOARD, 8);

    let data = board.read_article(77, ReadOptions::default()).await.unwrap();
    assert_eq!(data.id, 77);
    assert_eq!(data.title, "Line oneline two");
    assert_eq!(data.author, "writer");
    assert_eq!(data.category, "free");
    assert_eq!(data.views, 1234);
    assert_eq!(data.rate_diff, 7);
    assert_eq!(data.comment_count, 2);
    assert!(!data.is_summary);
    assert_eq!(data.content.as_deref(), Some("<p>body text</p>"));
    assert!(data.comments.is_none());

    let again = board.read_article(77, ReadOptions::default()).await.unwrap();
    assert_eq!(again, data);
    assert_eq!(session.requests().len(), 1);
    assert!(board.get_article(77).is_loaded());
}

#[tokio::test]
async fn no_cache_forces_refetch() {
    let session = MockSession::authenticated();
    session.html(&format!("{BOARD}/5"), &article_page(5, "old", "x"));
    let board = Board::with_cache_size(session.clone(), BOARD, 8);

    board.read_article(5, ReadOptions::default()).await.unwrap();
    session.html(&format!("{BOARD}/5"), &article_page(5, "new", "x"));
    let fresh = board.read_article(5, ReadOptions { no_cache: true, with_comments: false }).await.unwrap();
    assert_eq!(fresh.title, "new");
    assert_eq!(session.requests().len(), 2);
}

#[tokio::test]
async fn comments_are_collected_on_request() {
    let session = MockSession::authenticated();
    session.html(&format!("{BOARD}/9"), &article_page(9, "t", "c"));
    let board = Board::with_cache_size(session.clone(), BOARD, 8);

    board.read_article(9, ReadOptions::default()).await.unwrap();
    let data = board.read_article(9, ReadOptions { no_cache: false, with_comments: true }).await.unwrap();
    // Loaded without comments, so the second read had to fetch.
    assert_eq!(session.requests().len(), 2);
    let comments = data.comments.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].author, "c1");
    assert_eq!(comments[0].content, "first!");
    assert_eq!(comments[1].content, "second");
}

#[tokio::test]
async fn missing_article_is_not_found() {
    let session = MockSession::authenticated();
    let board = Board::with_cache_size(session.clone(), BOARD, 8);

    match board.read_article(404, ReadOptions::default()).await {
        Err(BoardError::NotFound { id }) => assert_eq!(id, 404),
        other => panic!("Expected NotFound, got {:?}", other),
    }
    // The handle stays referenced; nothing claims the article exists.
    assert_eq!(board.get_article(404).state(), ArticleState::Referenced);
}

#[tokio::test]
async fn server_errors_are_not_rewritten() {
    let session = MockSession::authenticated();
    session.reply(&format!("{BOARD}/3"), Reply::Status(500));
    let board = Board::with_cache_size(session.clone(), BOARD, 8);

    let err = board.read_article(3, ReadOptions::default()).await.unwrap_err();
    assert!(matches!(err, BoardError::Transport { status: Some(500), .. }));
}

#[tokio::test]
async fn edit_keeps_unpatched_fields() {
    let session = MockSession::authenticated();
    let article_url = format!("{BOARD}/11");
    let edit_url = format!("{article_url}/edit");
    session.html(&article_url, &article_page(11, "Original", "original body"));
    session.html(&edit_url, &write_page("e-csrf", "e-token"));
    session.reply_post(&edit_url, Reply::Redirect(article_url.clone()));
    let board = Board::with_cache_size(session.clone(), BOARD, 8);

    let patch = ArticlePatch { title: Some("Renamed".into()), ..Default::default() };
    let response = board.edit_article(11, patch).await.unwrap();
    assert_eq!(response.url, article_url);

    let requests = session.requests();
    let (url, post) = requests.last().unwrap();
    assert_eq!(url, &edit_url);
    let body = post.body.as_ref().unwrap();
    assert_eq!(body.get("_csrf"), Some("e-csrf"));
    assert_eq!(body.get("token"), Some("e-token"));
    assert_eq!(body.get("title"), Some("Renamed"));
    assert_eq!(body.get("category"), Some("free"));
    assert_eq!(body.get("content"), Some("<p>original body</p>"));

    // Edited content must be fetched again.
    assert!(!board.get_article(11).is_loaded());
}

#[tokio::test]
async fn delete_posts_page_csrf() {
    let session = MockSession::authenticated();
    let article_url = format!("{BOARD}/12");
    let delete_url = format!("{article_url}/delete");
    session.html(&article_url, &article_page(12, "bye", "x"));
    session.reply_post(&delete_url, Reply::Redirect(BOARD.to_string()));
    let board = Board::with_cache_size(session.clone(), BOARD, 8);

    let response = board.delete_article(12).await.unwrap();
    assert_eq!(response.url, BOARD);

    let requests = session.requests();
    assert_eq!(requests.len(), 2);
    let (url, post) = &requests[1];
    assert_eq!(url, &delete_url);
    assert!(post.headers.contains(&("referer".to_string(), article_url.clone())));
    assert_eq!(post.body.as_ref().unwrap().get("_csrf"), Some("del-12"));
}

#[tokio::test]
async fn delete_of_missing_article_is_not_found() {
    let session = MockSession::authenticated();
    let board = Board::with_cache_size(session.clone(), BOARD, 8);
    assert!(matches!(board.delete_article(1).await, Err(BoardError::NotFound { id: 1 })));
}

#[test]
fn board_futures_are_send() {
    fn assert_send<T: Send>(_: &T) {}
    let session = MockSession::authenticated();
    let board = Board::with_cache_size(session.clone(), BOARD, 8);

    let fut = board.read_article(2, ReadOptions::default());
    assert_send(&fut);
    assert!(matches!(tokio_test::block_on(fut), Err(BoardError::NotFound { id: 2 })));
}
