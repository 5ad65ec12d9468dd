use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pocket_meta::crawl::{crawl_pairings, HttpDocumentProvider};
use pocket_meta::database_ops::Db;
use pocket_meta::logging::{init_tracing, DEFAULT_FILTER};
use pocket_meta::normalization::ExtensionTable;
use pocket_meta::orchestrator;
use pocket_meta::util::env::PipelineConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pm", version, about = "Pocket meta ingestion and deck statistics CLI")]
struct Cli {
    /// Override the database URL (default: POCKET_META_DB_URL / DATABASE_URL)
    #[arg(long, global = true)]
    db_url: Option<String>,
    /// Override the pairing site base URL (default: LIMITLESS_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Tournaments or card URLs crawled at once (default: CRAWL_CONCURRENCY / 1)
    #[arg(long, global = true)]
    concurrency: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Create every table if missing
    InitDb,
    /// Load tournament/decklist/match documents from a corpus directory
    LoadCorpus {
        /// Directory of *.json tournament documents (default: CORPUS_DIR)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Crawl pairing rounds and update player standings
    CrawlPairings {
        /// Restrict to these tournament ids (default: every stored tournament)
        #[arg(long = "tournament", value_delimiter = ',')]
        tournaments: Vec<String>,
    },
    /// Fetch card pages for every Pokémon card referenced by a decklist
    CrawlCards {
        /// Fetch URLs already present in the card table as well
        #[arg(long, default_value_t = false)]
        refetch: bool,
    },
    /// Rebuild the deck results table
    Aggregate,
    /// Run every stage in order
    Run {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Print row counts for every table
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(DEFAULT_FILTER)?;
    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(url) = cli.db_url {
        config.db_url = url;
    }
    if let Some(base) = cli.base_url {
        config.source_base_url = base.trim_end_matches('/').to_string();
    }
    if let Some(n) = cli.concurrency {
        config.crawl_concurrency = n.max(1);
    }

    let db = Db::connect(&config.db_url, config.db_max_connections)
        .await
        .context("Db::connect failed")?;
    db.ensure_schema().await?;

    let (user_agent, timeout_secs) = (config.user_agent.clone(), config.http_timeout_secs);
    let provider = move || HttpDocumentProvider::new(&user_agent, timeout_secs);

    match cli.command {
        Commands::InitDb => info!("schema ready"),
        Commands::LoadCorpus { dir } => {
            let dir = dir.unwrap_or_else(|| config.corpus_dir.clone());
            let summary = orchestrator::ingest_corpus(&db, &dir).await?;
            println!("{summary:#?}");
        }
        Commands::CrawlPairings { tournaments } => {
            let provider = provider()?;
            let outcomes = if tournaments.is_empty() {
                orchestrator::crawl_all_pairings(&db, &provider, &config).await?
            } else {
                crawl_pairings(
                    &provider,
                    &db,
                    &config.source_base_url,
                    &tournaments,
                    config.crawl_concurrency,
                )
                .await?
            };
            for o in &outcomes {
                println!(
                    "{}\trounds={}\tstop={:?}\tapplied={}\tstale={}",
                    o.tournament_id, o.rounds_completed, o.stop, o.standings_applied, o.stale_writes
                );
            }
        }
        Commands::CrawlCards { refetch } => {
            config.refetch_known_cards |= refetch;
            let summary = orchestrator::crawl_all_cards(&db, &provider()?, &config).await?;
            println!("{summary:#?}");
        }
        Commands::Aggregate => {
            let table = ExtensionTable::with_additional(&config.extra_extensions);
            let summary = orchestrator::rebuild_deck_results(&db, &table).await?;
            println!("{summary:#?}");
        }
        Commands::Run { dir } => {
            if let Some(dir) = dir {
                config.corpus_dir = dir;
            }
            let summary = orchestrator::run_pipeline(&db, &provider()?, &config).await?;
            println!("{:#?}", summary.corpus);
            println!("{} tournaments crawled", summary.pairings.len());
            println!("{:#?}", summary.cards);
            println!("{:#?}", summary.aggregate);
        }
        Commands::Summary => {
            let counts = db.table_counts().await?;
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
    }

    db.close().await;
    Ok(())
}
