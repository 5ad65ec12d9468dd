//! Pure HTML-to-record parsers for the two page shapes the crawl consumes:
//! a single card page and one pairing round of a tournament.
//!
//! Nothing in here touches the network or the data store. A missing required
//! block is reported as [`ExtractError::BlockAbsent`]; anything softer than
//! that (an unparsable number, a missing optional line) degrades to `None`.

pub mod card;
pub mod pairings;

pub use card::{extract_card, CardAttributes, Stage};
pub use pairings::{extract_round, RawStanding, RoundExtraction};

use scraper::{ElementRef, Selector};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("expected block not found: {block}")]
    BlockAbsent { block: &'static str },
}

/// Selectors used here are compile-time literals, so parsing cannot fail.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|_| unreachable!())
}

/// Text nodes of `element`, each trimmed, empty ones dropped, joined by `sep`.
pub(crate) fn joined_text(element: &ElementRef, sep: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// First descendant matching `sel`, as trimmed non-empty text.
pub(crate) fn select_text(element: &ElementRef, sel: &Selector) -> Option<String> {
    element
        .select(sel)
        .next()
        .map(|e| joined_text(&e, " "))
        .filter(|s| !s.is_empty())
}
