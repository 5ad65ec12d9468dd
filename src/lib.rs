//! Tournament ingestion, normalization and deck win-rate aggregation for
//! Pokémon TCG Pocket events.
//!
//! Data flows one way: corpus documents and crawled HTML pages are extracted,
//! normalized and persisted; the aggregator then rebuilds the per-deck
//! statistics table from the persisted rows.

pub mod aggregation;
pub mod corpus;
pub mod crawl;
pub mod database_ops;
pub mod extraction;
pub mod logging;
pub mod normalization;
pub mod orchestrator;

pub mod util {
    pub mod env;
}
