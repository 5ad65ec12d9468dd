//! Network-facing loops: the per-tournament pairing crawl and the card fetch
//! loop, both driven through a [`DocumentProvider`].

pub mod cards;
pub mod pairings;
pub mod provider;

pub use cards::{crawl_cards, CardCrawlSummary, CardOutcome};
pub use pairings::{crawl_pairings, crawl_tournament, PairingCrawlOutcome, StopReason};
pub use provider::{pairings_url, DocumentProvider, FetchError, HttpDocumentProvider};
