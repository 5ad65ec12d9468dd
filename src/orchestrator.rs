//! Runs the pipeline stages in their data-flow order: corpus ingestion,
//! pairing crawl, card crawl, aggregation. Each stage takes the store handle
//! explicitly and can also be invoked on its own.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, instrument, warn};

use crate::aggregation::{aggregate, AggregationInput};
use crate::corpus::load_corpus_dir;
use crate::crawl::{crawl_cards, crawl_pairings, CardCrawlSummary, DocumentProvider, PairingCrawlOutcome};
use crate::database_ops::{cards, decklists, matches, results, tournaments, Db};
use crate::normalization::ExtensionTable;
use crate::util::env::PipelineConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusSummary {
    pub documents: usize,
    pub tournaments_inserted: usize,
    pub decklist_rows: u64,
    pub matches_inserted: u64,
    pub matches_ignored: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateSummary {
    pub decklist_rows: usize,
    pub matches: usize,
    pub deck_rows: u64,
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub corpus: CorpusSummary,
    pub pairings: Vec<PairingCrawlOutcome>,
    pub cards: CardCrawlSummary,
    pub aggregate: AggregateSummary,
}

/// Load every tournament document of `dir` into the store.
#[instrument(skip(db))]
pub async fn ingest_corpus(db: &Db, dir: &Path) -> Result<CorpusSummary> {
    let docs = load_corpus_dir(dir)?;
    let mut summary = CorpusSummary {
        documents: docs.len(),
        ..CorpusSummary::default()
    };
    for doc in &docs {
        let ingest = tournaments::ingest_tournament(db, doc)
            .await
            .with_context(|| format!("ingesting tournament {}", doc.id))?;
        if ingest.tournament_inserted {
            summary.tournaments_inserted += 1;
        }
        summary.decklist_rows += ingest.decklist_rows;
        summary.matches_inserted += ingest.matches_inserted;
        summary.matches_ignored += ingest.matches_ignored;
    }
    info!(?summary, "corpus ingested");
    Ok(summary)
}

/// Pairing crawl over every tournament in the store.
pub async fn crawl_all_pairings(
    db: &Db,
    provider: &dyn DocumentProvider,
    config: &PipelineConfig,
) -> Result<Vec<PairingCrawlOutcome>> {
    let ids = tournaments::tournament_ids(db).await?;
    if ids.is_empty() {
        warn!("no tournaments in store; load the corpus first");
    }
    crawl_pairings(provider, db, &config.source_base_url, &ids, config.crawl_concurrency).await
}

/// Card crawl over every Pokémon card referenced by a decklist.
pub async fn crawl_all_cards(
    db: &Db,
    provider: &dyn DocumentProvider,
    config: &PipelineConfig,
) -> Result<CardCrawlSummary> {
    let urls = decklists::pokemon_card_urls(db).await?;
    info!(urls = urls.len(), "card urls selected");
    crawl_cards(
        provider,
        db,
        &urls,
        !config.refetch_known_cards,
        config.crawl_concurrency,
    )
    .await
}

/// Recompute `deck_results` from decklists, matches and cards.
#[instrument(skip(db, table))]
pub async fn rebuild_deck_results(db: &Db, table: &ExtensionTable) -> Result<AggregateSummary> {
    let decklist_rows = decklists::load_decklist_entries(db).await?;
    let match_rows = matches::load_matches(db).await?;
    let card_extensions = cards::card_extensions(db).await?;

    let input = AggregationInput {
        decklists: &decklist_rows,
        matches: &match_rows,
        card_extensions: &card_extensions,
    };
    let rows = aggregate(&input, table);
    let deck_rows = results::replace_deck_results(db, &rows).await?;

    Ok(AggregateSummary {
        decklist_rows: decklist_rows.len(),
        matches: match_rows.len(),
        deck_rows,
    })
}

/// Every stage, in order.
pub async fn run_pipeline(
    db: &Db,
    provider: &dyn DocumentProvider,
    config: &PipelineConfig,
) -> Result<RunSummary> {
    db.ensure_schema().await?;
    let corpus = ingest_corpus(db, &config.corpus_dir).await?;
    let pairings = crawl_all_pairings(db, provider, config).await?;
    let cards = crawl_all_cards(db, provider, config).await?;
    let table = ExtensionTable::with_additional(&config.extra_extensions);
    let aggregate = rebuild_deck_results(db, &table).await?;

    let summary = RunSummary {
        corpus,
        pairings,
        cards,
        aggregate,
    };
    info!(
        tournaments = summary.pairings.len(),
        cards_inserted = summary.cards.inserted,
        deck_rows = summary.aggregate.deck_rows,
        "pipeline finished"
    );
    Ok(summary)
}
