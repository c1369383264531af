use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use tidemark_core::constants::DEFAULT_API_BASE;
use tidemark_core::{
    ChangeEvent, Comment, CoreConfig, Reaction, ReactionTally, ReactionTarget, Scope, SyncEngine,
};

#[derive(Parser)]
#[command(name = "tidemark")]
#[command(about = "Terminal client for tidemark feeds")]
struct Cli {
    /// Base URL of the feed API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api: String,

    /// Override the push socket URL derived from the API base
    #[arg(long)]
    push: Option<String>,

    /// Data directory (defaults to the platform data dir)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Your user id, used to skip your own push echoes
    #[arg(long)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the all-feeds view and list cached feeds
    Feeds,

    /// Search the feed directory
    Search {
        query: String,
    },

    /// Refresh a feed and print its posts
    Posts {
        feed: String,
        /// Also fetch this many older pages
        #[arg(long, default_value_t = 0)]
        pages: usize,
    },

    /// Follow a feed live, reprinting whenever a refresh lands
    Watch {
        /// Feed to follow; defaults to the last visited feed
        feed: Option<String>,
    },

    /// Create a post
    Post {
        feed: String,
        body: String,
    },

    /// Comment on a post
    Comment {
        feed: String,
        post: String,
        body: String,
        /// Reply under this comment instead of the post
        #[arg(long)]
        parent: Option<String>,
    },

    /// Toggle a reaction on a post or comment
    React {
        feed: String,
        post: String,
        /// One of: like, heart, laugh, surprise, sad, angry
        reaction: String,
        /// Target this comment instead of the post
        #[arg(long)]
        comment: Option<String>,
    },

    /// Toggle your subscription to a feed
    Toggle {
        feed: String,
    },

    /// Create a feed
    CreateFeed {
        name: String,
    },

    /// Upload an attachment and print its URL
    Upload {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .context("no platform data directory; pass --data-dir")?
            .join("tidemark"),
    };
    debug!(data_dir = %data_dir.display(), api = %cli.api, "starting client");
    let mut config = CoreConfig::new(&cli.api).with_data_dir(&data_dir);
    if let Some(push) = cli.push {
        config = config.with_push_base(push);
    }
    if let Some(user) = cli.user {
        config = config.with_user(user);
    }
    let engine = SyncEngine::new(config)?;

    let result = run_command(&engine, cli.command).await;
    engine.shutdown();
    result
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match std::env::var("TIDEMARK_LOG_FILE") {
        Ok(log_path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .with_context(|| format!("open log file {log_path}"))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn run_command(engine: &SyncEngine, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Feeds => {
            engine.select_scope(&Scope::AllFeeds);
            engine.refresh(&Scope::AllFeeds).await?;
            print_feeds(engine);
        }
        Commands::Search { query } => {
            let results = engine.search_feeds(&query).await?;
            if results.is_empty() {
                println!("no feeds match {query:?}");
            }
            for feed in results {
                println!(
                    "{}  {}  {} subscribers",
                    feed.id,
                    feed.display_name(),
                    feed.subscribers()
                );
            }
        }
        Commands::Posts { feed, pages } => {
            let scope = Scope::feed(feed.clone());
            engine.select_scope(&scope);
            engine.refresh(&scope).await?;
            for _ in 0..pages {
                if !engine.load_older(&scope).await? {
                    break;
                }
            }
            print_posts(engine, &feed);
        }
        Commands::Watch { feed } => {
            let feed = match feed {
                Some(feed) => feed,
                None => match engine.initial_scope() {
                    Scope::Feed(identifier) => identifier,
                    Scope::AllFeeds => anyhow::bail!("no previously visited feed; name one"),
                },
            };
            watch(engine, feed).await?;
        }
        Commands::Post { feed, body } => {
            let id = engine.create_post(&feed, &body).await?;
            println!("created post {id}");
        }
        Commands::Comment {
            feed,
            post,
            body,
            parent,
        } => {
            let id = engine
                .create_comment(&feed, &post, parent.as_deref(), &body)
                .await?;
            println!("created comment {id}");
        }
        Commands::React {
            feed,
            post,
            reaction,
            comment,
        } => {
            let kind = Reaction::parse(&reaction)
                .with_context(|| format!("unknown reaction kind {reaction:?}"))?;
            let target = match comment {
                Some(comment) => ReactionTarget::Comment { post, comment },
                None => ReactionTarget::Post { post },
            };
            match engine.toggle_reaction(&feed, &target, kind).await? {
                Some(kind) => println!("reaction set to {}", kind.as_str()),
                None => println!("reaction cleared"),
            }
        }
        Commands::Toggle { feed } => {
            let subscribed = engine.toggle_subscription(&feed).await?;
            println!("{}", if subscribed { "subscribed" } else { "unsubscribed" });
        }
        Commands::CreateFeed { name } => {
            let key = engine.create_feed(&name).await?;
            println!("created feed {key}");
        }
        Commands::Upload { path } => {
            let bytes =
                std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("attachment.bin")
                .to_string();
            let url = engine.upload_attachment(&filename, bytes).await?;
            println!("{url}");
        }
    }
    Ok(())
}

/// Sit on a feed scope and reprint it whenever a refresh lands, whether
/// triggered by push events or by this client's own mutations.
async fn watch(engine: &SyncEngine, feed: String) -> anyhow::Result<()> {
    let scope = Scope::feed(feed.clone());
    engine.select_scope(&scope);
    engine.refresh(&scope).await?;
    print_posts(engine, &feed);

    let mut events = engine.subscribe_changes();
    println!("watching {feed}; press ctrl-c to stop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(ChangeEvent::ScopeRefreshed { .. }) => print_posts(engine, &feed),
                // Missing a few notifications only means reprinting once.
                Err(RecvError::Lagged(_)) => print_posts(engine, &feed),
                Err(RecvError::Closed) => break,
            },
        }
    }
    Ok(())
}

fn print_feeds(engine: &SyncEngine) {
    let feeds = engine.cached_feeds();
    if feeds.is_empty() {
        println!("no feeds");
        return;
    }
    for feed in feeds {
        let marker = if feed.is_subscribed() { "*" } else { " " };
        println!(
            "{marker} {}  {}  {} subscribers",
            feed.id,
            feed.display_name(),
            feed.subscribers()
        );
    }
}

fn print_posts(engine: &SyncEngine, feed: &str) {
    let user = engine.config().user_id.as_deref();
    let store = engine.store();
    let store = store.lock();
    let key = store.resolve(feed);
    let posts = store.posts(&key);
    if posts.is_empty() {
        println!("no posts in {key}");
        return;
    }
    for post in posts {
        let pending = if post.is_placeholder() { " (sending)" } else { "" };
        println!("[{}] {} <{}>{pending}", post.created_at, post.body, post.id);
        let tally = post.tally(user);
        if !tally.is_empty() {
            println!("    {}", format_tally(&tally));
        }
        for comment in &post.comments {
            print_comment(comment, 1, user);
        }
    }
}

fn print_comment(comment: &Comment, depth: usize, user: Option<&str>) {
    let indent = "  ".repeat(depth);
    let pending = if comment.is_placeholder() { " (sending)" } else { "" };
    println!("{indent}- {} <{}>{pending}", comment.body, comment.id);
    let tally = comment.tally(user);
    if !tally.is_empty() {
        println!("{indent}  {}", format_tally(&tally));
    }
    for child in &comment.children {
        print_comment(child, depth + 1, user);
    }
}

fn format_tally(tally: &ReactionTally) -> String {
    Reaction::ALL
        .iter()
        .filter(|kind| tally.count(**kind) > 0)
        .map(|kind| format!("{}:{}", kind.as_str(), tally.count(*kind)))
        .collect::<Vec<_>>()
        .join(" ")
}
