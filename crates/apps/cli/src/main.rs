mod client;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use feed::cache::{FileStore, today_key};
use feed::query::{Filters, LabelFilter, SortKey};
use feed::{ApiConfig, ArticleCache, FeedState};
use foundation::time::Time;
use layers::markers::{FixedJitter, Jitter, RandomJitter, article_markers};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::client::ApiClient;
use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "flare", author, version, about = "Climate news feed from the terminal")]
struct Args {
    /// Base URL of the article API
    #[arg(long, global = true, env = "FLARE_API_URL", default_value = feed::api::DEFAULT_BASE_URL)]
    api_url: String,

    /// Directory holding the same-day article cache
    #[arg(long, global = true, env = "FLARE_CACHE_DIR", default_value = ".flare-cache")]
    cache_dir: PathBuf,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Default)]
struct ListArgs {
    /// 1-based page of ten articles
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Keep articles mentioning this location ("Any" for all)
    #[arg(long)]
    location: Option<String>,

    /// Keep articles tagged with this concept ("Any" for all)
    #[arg(long)]
    concept: Option<String>,

    /// None, date, date-desc, sentiment or sentiment-desc
    #[arg(long)]
    sort: Option<String>,
}

#[derive(clap::Args, Debug, Default)]
struct LoadArgs {
    /// Skip today's cached list
    #[arg(long)]
    force: bool,

    /// Page size requested from the API
    #[arg(long)]
    limit: Option<u32>,

    /// Follow the API's cursor through every page
    #[arg(long)]
    all: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List articles, one page at a time
    Articles {
        #[command(flatten)]
        load: LoadArgs,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Full-text search
    Search {
        query: String,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Print where each article's markers land on the globe
    Markers {
        #[command(flatten)]
        load: LoadArgs,

        /// Jitter longitudes with this seed instead of placing exactly
        #[arg(long)]
        seed: Option<u64>,
    },

    /// The headline carousel
    Headlines {
        #[command(flatten)]
        load: LoadArgs,

        #[arg(long, default_value = feed::headlines::DEFAULT_CATEGORY)]
        category: String,
    },

    /// Forget the cached article list
    ClearCache,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("flare: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let client = ApiClient::new(ApiConfig::new(args.api_url.clone()));
    let mut cache = ArticleCache::new(FileStore::new(args.cache_dir.clone())?);
    let mut state = FeedState::new();

    match args.command {
        Command::Articles { load, list } => {
            load_feed(&client, &mut state, &mut cache, &load).await?;
            apply_list(&mut state, &list)?;
            print_page(&state, args.json)?;
        }
        Command::Search { query, list } => {
            let token = state.begin_request();
            let result = client.search(&query).await;
            state.complete_search(token, result);
            check_loaded(&state)?;
            apply_list(&mut state, &list)?;
            print_page(&state, args.json)?;
        }
        Command::Markers { load, seed } => {
            load_feed(&client, &mut state, &mut cache, &load).await?;
            let mut jitter: Box<dyn Jitter> = match seed {
                Some(seed) => Box::new(RandomJitter::new(StdRng::seed_from_u64(seed))),
                None => Box::new(FixedJitter(0.0)),
            };
            let spawns: Vec<_> = state
                .visible()
                .iter()
                .flat_map(|a| article_markers(a, true, Time::ZERO, jitter.as_mut()))
                .collect();
            if args.json {
                let values: Vec<_> = spawns.iter().map(output::marker_value).collect();
                println!("{}", serde_json::to_string_pretty(&values)?);
            } else {
                for spawn in &spawns {
                    println!("{}", output::marker_line(spawn));
                }
            }
        }
        Command::Headlines { load, category } => {
            load_feed(&client, &mut state, &mut cache, &load).await?;
            state.headlines_mut().select(&category);
            if args.json {
                println!("{}", serde_json::to_string_pretty(state.headline_events())?);
            } else {
                println!("{}", output::headlines_text(&state));
            }
        }
        Command::ClearCache => {
            cache.clear()?;
            info!(dir = %args.cache_dir.display(), "article cache cleared");
        }
    }
    Ok(())
}

/// Serve today's cache when present, then refresh from the API. A failed
/// refresh keeps the cached list.
async fn load_feed(
    client: &ApiClient,
    state: &mut FeedState,
    cache: &mut ArticleCache<FileStore>,
    load: &LoadArgs,
) -> Result<(), CliError> {
    let today = today_key();
    let plan = state.refresh(cache, &today, load.force);
    if plan.served_from_cache {
        info!(count = state.articles().len(), "using today's cached articles");
    }
    let result = client.articles(load.limit, load.all).await;
    let outcome = state.complete_refresh(plan.token, result, cache, &today);
    info!(?outcome, count = state.articles().len(), "feed loaded");
    check_loaded(state)
}

fn check_loaded(state: &FeedState) -> Result<(), CliError> {
    match state.error() {
        Some(msg) => Err(CliError::Load(msg.to_string())),
        None => Ok(()),
    }
}

fn parse_sort(key: &str) -> Result<SortKey, CliError> {
    SortKey::parse(key).ok_or_else(|| CliError::UnknownSort(key.to_string()))
}

fn apply_list(state: &mut FeedState, list: &ListArgs) -> Result<(), CliError> {
    if list.location.is_some() || list.concept.is_some() {
        state.set_filters(Filters {
            location: LabelFilter::parse(list.location.as_deref().unwrap_or_default()),
            concept: LabelFilter::parse(list.concept.as_deref().unwrap_or_default()),
        });
    }
    if let Some(key) = &list.sort {
        state.set_sort(parse_sort(key)?);
    }
    state.go_to_page(list.page);
    Ok(())
}

fn print_page(state: &FeedState, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", output::page_json(state)?);
    } else {
        println!("{}", output::page_text(state));
    }
    Ok(())
}
