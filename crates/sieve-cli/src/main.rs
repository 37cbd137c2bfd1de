use std::sync::Arc;

use clap::{Parser, Subcommand};

use sieve_core::{
    BookmarkSaver, FlushOutcome, HttpConfig, HttpTransport, ReadStateSynchronizer,
    ReferenceDescriptor, ReferenceItem, SaveOutcome, Warning, WarningPresenter,
};

/// Command-line access to a sieve service.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Sieve resource url, e.g. https://example.org/u/alice/sieve/
    sieve_url: String,

    /// Bookmark collection url (default: derived from the sieve url)
    #[arg(long)]
    collection_url: Option<String>,

    /// Session cookie value
    #[arg(long)]
    session: Option<String>,

    /// CSRF token sent on writes
    #[arg(long)]
    csrf_token: Option<String>,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the unread references
    List,
    /// Mark references read by url
    MarkRead { urls: Vec<String> },
    /// Add a bookmark to the collection
    Add {
        url: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        source_url: Option<String>,
        #[arg(long)]
        source_title: Option<String>,
    },
}

/// Prints warnings to stderr; the CLI has no banner surface.
struct StderrPresenter;

impl WarningPresenter for StderrPresenter {
    fn show_warning(&self, warning: Warning) {
        eprintln!("warning [{}]: {}", warning.id(), warning.message());
    }

    fn hide_warning(&self, _warning: Warning) {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let session = args.session.or_else(|| std::env::var("SIEVE_SESSION").ok());
    let csrf_token = args
        .csrf_token
        .or_else(|| std::env::var("SIEVE_CSRFTOKEN").ok());

    let config = HttpConfig {
        sieve_url: args.sieve_url,
        collection_url: args.collection_url,
        session_cookie: session,
        csrf_token,
        timeout_secs: args.timeout,
    };
    let transport = Arc::new(HttpTransport::new(config)?);
    let warnings: Arc<dyn WarningPresenter> = Arc::new(StderrPresenter);

    match args.command {
        Command::List => {
            let page = transport.fetch_sieve().await?;
            println!(
                "{} unread ({} served)",
                page.num_unread_references,
                page.references.len()
            );
            for (index, reference) in page.references.iter().enumerate() {
                let title = if reference.title.is_empty() {
                    &reference.url
                } else {
                    &reference.title
                };
                println!("{index:4}  {title}");
                println!("      {}", reference.url);
            }
        }
        Command::MarkRead { urls } => {
            anyhow::ensure!(!urls.is_empty(), "no urls given");
            let sync = ReadStateSynchronizer::new(transport, warnings, true);
            for (index, url) in urls.into_iter().enumerate() {
                let item = ReferenceItem::new(
                    index,
                    ReferenceDescriptor {
                        url,
                        title: String::new(),
                        source_url: String::new(),
                        source_title: String::new(),
                    },
                );
                sync.mark_read(&item);
            }
            match sync.drain().await {
                FlushOutcome::Flushed => println!("read state synced"),
                FlushOutcome::Clean => println!("nothing to sync"),
                FlushOutcome::Failed => anyhow::bail!("read-state sync failed"),
                FlushOutcome::Busy => unreachable!("drain never reports busy"),
            }
        }
        Command::Add {
            url,
            title,
            source_url,
            source_title,
        } => {
            let item = ReferenceItem::new(
                0,
                ReferenceDescriptor {
                    url: url.clone(),
                    title: title.unwrap_or_default(),
                    source_url: source_url.unwrap_or_default(),
                    source_title: source_title.unwrap_or_default(),
                },
            );
            let saver = BookmarkSaver::new(transport, warnings);
            match saver.save(&item).await {
                SaveOutcome::Saved => println!("saved {url}"),
                SaveOutcome::AlreadySaved => println!("already saved"),
                SaveOutcome::Failed => anyhow::bail!("bookmark save failed"),
            }
        }
    }

    Ok(())
}
