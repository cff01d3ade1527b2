use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use std::sync::Arc;

use arcabbs::bbs::{ArticleData, ArticlePatch, Board, NewArticle, QueryOptions, QueryTarget, ReadOptions};
use arcabbs::config::Config;
use arcabbs::metrics;
use arcabbs::session::HttpSession;

#[derive(Parser)]
#[command(name = "arcabbs")]
#[command(about = "Read and post on a web discussion board")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Board URL, overrides the configuration file
    #[arg(short, long, global = true)]
    board: Option<String>,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// List one page of articles
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        category: Option<String>,
        /// Keep notice rows
        #[arg(long)]
        notices: bool,
        /// Search field (all, title_content, title, content, nickname, comment)
        #[arg(long, requires = "keyword")]
        target: Option<QueryTarget>,
        #[arg(long, requires = "target")]
        keyword: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Read one article
    Read {
        id: u64,
        #[arg(long)]
        comments: bool,
        #[arg(long)]
        json: bool,
    },
    /// Post a new article (requires an authenticated session)
    Write {
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        title: String,
        /// HTML content; use '@path' to read it from a file
        #[arg(long)]
        content: String,
    },
    /// Edit an article; omitted fields keep their current values
    Edit {
        id: u64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    /// Delete an article
    Delete { id: u64 },
}

async fn load_content(arg: String) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => tokio::fs::read_to_string(path).await
            .with_context(|| format!("Failed to read content file {}", path)),
        None => Ok(arg),
    }
}

fn print_summary(data: &ArticleData) {
    let notice = if data.is_notice { "*" } else { " " };
    println!(
        "{}{:>10}  [{}] {} ({}) | {} | views {} | +{} / {} comments",
        notice,
        data.id,
        data.category,
        data.title,
        data.author,
        data.time.format("%Y-%m-%d %H:%M"),
        data.views,
        data.rate_diff,
        data.comment_count
    );
}

/// `-v` flags override the configured level.
fn init_logging(verbose: u8, configured: &str) {
    let log_level = match verbose {
        0 => configured,
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(cli.verbose, "info");
        info!("Initializing new arcabbs configuration");
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let mut config = Config::load(&cli.config).await?;
    init_logging(cli.verbose, &config.logging.level);
    if let Some(url) = cli.board {
        config.board.url = url;
        config.validate()?;
    }
    let session = HttpSession::new(&config.session)
        .map_err(|e| anyhow!("Failed to build HTTP session: {}", e))?;
    let board = Board::from_config(Arc::new(session), &config.board);
    debug!("{:?}", board);

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::List { page, category, notices, target, keyword, json } => {
            let options = QueryOptions { include_notices: notices, target, keyword, category };
            let articles = board.query_page(page, options).await?;
            let records: Vec<ArticleData> = articles.iter().filter_map(|a| a.data()).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                records.iter().for_each(print_summary);
            }
        }
        Commands::Read { id, comments, json } => {
            let data = board.read_article(id, ReadOptions { no_cache: false, with_comments: comments }).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_summary(&data);
                println!();
                println!("{}", data.content.as_deref().unwrap_or_default());
                for comment in data.comments.iter().flatten() {
                    println!("-- {} ({}): {}", comment.author, comment.time.format("%Y-%m-%d %H:%M"), comment.content);
                }
            }
        }
        Commands::Write { category, title, content } => {
            let content = load_content(content).await?;
            let article = board.write_article(NewArticle { category, title, content }).await?;
            println!("{}", article.url());
        }
        Commands::Edit { id, category, title, content } => {
            let content = match content {
                Some(c) => Some(load_content(c).await?),
                None => None,
            };
            let response = board.edit_article(id, ArticlePatch { category, title, content }).await?;
            info!("Edit submitted ({}): {}", response.status, response.url);
        }
        Commands::Delete { id } => {
            let response = board.delete_article(id).await?;
            info!("Delete submitted ({}): {}", response.status, response.url);
        }
    }

    let stats = metrics::snapshot();
    debug!(
        "fetches={} cache hits={} misses={} evictions={} written={}",
        stats.page_fetches, stats.cache_hits, stats.cache_misses, stats.cache_evictions, stats.articles_written
    );
    Ok(())
}
