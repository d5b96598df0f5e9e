use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{MovieId, SimilarityStore};
use posters::{PlaceholderResolver, PosterResolver, TmdbClient, TmdbConfig};
use server::{RankedMovie, RecommendError, RecommendationOrchestrator, Recommendations};
use sources::DEFAULT_LIMIT;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of results shown side by side in one grid row
const GRID_COLUMNS: usize = 3;

/// Movie Recommender - similar movies with posters
#[derive(Parser)]
#[command(name = "movie-recommender")]
#[command(about = "Find movies similar to one you like, with posters from TMDB", long_about = None)]
struct Cli {
    /// Movie catalog CSV (movie_id and title columns)
    #[arg(long, global = true, env = "MOVIE_CATALOG", default_value = "data/movies.csv")]
    catalog: PathBuf,

    /// Precomputed similarity matrix (.json, .bin, or text rows)
    #[arg(long, global = true, env = "MOVIE_SIMILARITY", default_value = "data/similarity.json")]
    similarity: PathBuf,

    #[command(flatten)]
    tmdb: TmdbArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TmdbArgs {
    /// TMDB API key, needed for poster lookups
    #[arg(long, global = true, env = "TMDB_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// TMDB API root
    #[arg(long, global = true, env = "TMDB_API_URL", default_value = TmdbConfig::DEFAULT_API_URL)]
    api_url: String,

    /// Language tag sent to TMDB
    #[arg(long, global = true, env = "TMDB_LANGUAGE", default_value = TmdbConfig::DEFAULT_LANGUAGE)]
    language: String,

    /// Timeout for each poster request, in seconds
    #[arg(long, global = true, env = "TMDB_TIMEOUT_SECS", default_value = "5")]
    timeout_secs: u64,
}

impl TmdbArgs {
    fn client(&self) -> Result<TmdbClient> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| anyhow!("A TMDB API key is required: pass --api-key or set TMDB_API_KEY"))?;

        let config = TmdbConfig::new(api_key)
            .with_api_url(self.api_url.clone())
            .with_language(self.language.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs));

        TmdbClient::new(config).context("Failed to build TMDB client")
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog titles (the choices for --title)
    Titles {
        /// Only titles containing this text (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
    },

    /// Recommend similar movies, with posters
    Recommend {
        /// Exact catalog title to find similar movies for
        #[arg(long)]
        title: String,

        /// Number of recommendations to return
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        /// Poster requests allowed in flight at once
        #[arg(long, default_value_t = RecommendationOrchestrator::DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Print the result as JSON instead of a grid
        #[arg(long)]
        json: bool,

        /// Skip TMDB and use the "no poster" placeholder for every movie
        #[arg(long)]
        offline: bool,
    },

    /// Show the similarity ranking with scores (no network access)
    Rank {
        /// Exact catalog title to rank against
        #[arg(long)]
        title: String,

        /// Number of movies to show
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },

    /// Resolve the poster URL of a single movie
    Poster {
        /// TMDB movie id
        #[arg(long)]
        movie_id: MovieId,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for results so --json stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Dispatch to appropriate command handler
    match &cli.command {
        Commands::Titles { filter } => {
            let store = load_store(&cli)?;
            handle_titles(&store, filter.as_deref());
        }
        Commands::Recommend {
            title,
            limit,
            concurrency,
            json,
            offline,
        } => {
            // Fail on a missing key before spending time on the load
            let resolver: Arc<dyn PosterResolver> = if *offline {
                Arc::new(PlaceholderResolver)
            } else {
                Arc::new(cli.tmdb.client()?)
            };
            let store = load_store(&cli)?;
            let orchestrator = RecommendationOrchestrator::new(store, resolver)
                .with_limit(*limit)
                .with_max_concurrent_fetches(*concurrency);
            handle_recommend(&orchestrator, title, *json).await?;
        }
        Commands::Rank { title, limit } => {
            let store = load_store(&cli)?;
            handle_rank(store, title, *limit)?;
        }
        Commands::Poster { movie_id } => {
            let client = cli.tmdb.client()?;
            handle_poster(&client, *movie_id).await?;
        }
    }

    Ok(())
}

/// Load the catalog and matrix once; the store is read-only afterwards
fn load_store(cli: &Cli) -> Result<Arc<SimilarityStore>> {
    eprintln!(
        "Loading catalog from {} and similarity matrix from {}...",
        cli.catalog.display(),
        cli.similarity.display()
    );
    let start = Instant::now();
    let store = SimilarityStore::load_from_files(&cli.catalog, &cli.similarity)
        .context("Failed to load movie data")?;
    eprintln!(
        "{} Loaded {} movies in {:?}",
        "✓".green(),
        store.len(),
        start.elapsed()
    );
    Ok(Arc::new(store))
}

/// Handle the 'titles' command
fn handle_titles(store: &SimilarityStore, filter: Option<&str>) {
    let movies = match filter {
        Some(fragment) => store.search_titles(fragment),
        None => store.movies().iter().collect(),
    };

    for movie in &movies {
        println!("{:>8}  {}", movie.id.to_string().dimmed(), movie.title);
    }
    println!("{}", format!("{} titles", movies.len()).bold());
}

/// Handle the 'recommend' command
async fn handle_recommend(
    orchestrator: &RecommendationOrchestrator,
    title: &str,
    json: bool,
) -> Result<()> {
    let recommendations = match orchestrator.recommend(title).await {
        Ok(recommendations) => recommendations,
        Err(e) => {
            suggest_titles(orchestrator.store(), &e);
            return Err(e.into());
        }
    };

    if json {
        let output = serde_json::to_string_pretty(&recommendations)
            .context("Failed to serialize recommendations")?;
        println!("{}", output);
    } else {
        println!("You selected: {}", title.bold());
        print_grid(&recommendations);
    }
    Ok(())
}

/// Handle the 'rank' command
fn handle_rank(store: Arc<SimilarityStore>, title: &str, limit: usize) -> Result<()> {
    // Ranking never calls the resolver
    let orchestrator =
        RecommendationOrchestrator::new(store, Arc::new(PlaceholderResolver)).with_limit(limit);
    let ranked = match orchestrator.rank(title) {
        Ok(ranked) => ranked,
        Err(e) => {
            suggest_titles(orchestrator.store(), &e);
            return Err(e.into());
        }
    };

    print_ranking(title, &ranked);
    Ok(())
}

/// Handle the 'poster' command
async fn handle_poster(client: &TmdbClient, movie_id: MovieId) -> Result<()> {
    // Use the fallible call so the user sees why a lookup failed
    match client.fetch_poster_path(movie_id).await {
        Ok(Some(path)) => println!("{}", posters::poster_url(&path)),
        Ok(None) => {
            println!("{}", posters::NO_POSTER_URL);
            eprintln!("{} TMDB has no poster for movie {}", "!".yellow(), movie_id);
        }
        Err(e) => {
            println!("{}", posters::ERROR_POSTER_URL);
            eprintln!("{} {}", "✗".red(), e);
        }
    }
    Ok(())
}

/// Point the user at close titles when an exact match fails
fn suggest_titles(store: &SimilarityStore, error: &RecommendError) {
    let RecommendError::TitleNotFound(title) = error;
    let matches = store.search_titles(title);
    if matches.is_empty() {
        return;
    }

    eprintln!("{}", "Did you mean:".yellow());
    for movie in matches.iter().take(5) {
        eprintln!("  - {}", movie.title);
    }
}

/// Print recommendations in rows of three
fn print_grid(recommendations: &Recommendations) {
    if recommendations.is_empty() {
        println!("{}", "No similar movies found.".yellow());
        return;
    }

    for (row, chunk) in recommendations.items.chunks(GRID_COLUMNS).enumerate() {
        println!("{}", format!("── Row {} ──", row + 1).bold().blue());
        for (col, item) in chunk.iter().enumerate() {
            let rank = row * GRID_COLUMNS + col + 1;
            println!("{:>4}. {}", rank.to_string().green(), item.title);
            println!("      {}", item.poster_url.dimmed());
        }
    }
}

/// Print a ranking with its scores
fn print_ranking(title: &str, ranked: &[RankedMovie]) {
    println!("{}", format!("Most similar to '{}':", title).bold().blue());
    for (index, movie) in ranked.iter().enumerate() {
        println!(
            "{:>4}. {} [id {}] - Score: {:.4}",
            (index + 1).to_string().green(),
            movie.title,
            movie.movie_id,
            movie.score
        );
    }
}
