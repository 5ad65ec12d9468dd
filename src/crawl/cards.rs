use std::collections::HashSet;

use anyhow::Result;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{info, instrument, warn};

use super::provider::DocumentProvider;
use crate::database_ops::cards::{insert_card, known_card_urls};
use crate::database_ops::Db;
use crate::extraction::extract_card;
use crate::normalization::CardRecord;

/// What happened to one card URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardOutcome {
    Inserted,
    /// The URL was already stored (skipped before fetching, or ignored on insert).
    AlreadyPresent,
    FetchFailed,
    ParseFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardCrawlSummary {
    pub attempted: usize,
    pub inserted: usize,
    pub already_present: usize,
    pub fetch_failed: usize,
    pub parse_failed: usize,
}

impl CardCrawlSummary {
    fn record(&mut self, outcome: CardOutcome) {
        match outcome {
            CardOutcome::Inserted => self.inserted += 1,
            CardOutcome::AlreadyPresent => self.already_present += 1,
            CardOutcome::FetchFailed => self.fetch_failed += 1,
            CardOutcome::ParseFailed => self.parse_failed += 1,
        }
    }
}

/// Fetch, extract, normalize and store one card. Fetch and parse failures are
/// logged and reported, never raised.
#[instrument(skip(provider, db))]
pub async fn fetch_card(provider: &dyn DocumentProvider, db: &Db, url: &str) -> Result<CardOutcome> {
    let body = match provider.fetch(url).await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "card fetch failed; skipping");
            return Ok(CardOutcome::FetchFailed);
        }
    };

    let attrs = match extract_card(&body) {
        Ok(attrs) => attrs,
        Err(err) => {
            warn!(error = %err, "card page not parsable; skipping");
            return Ok(CardOutcome::ParseFailed);
        }
    };

    let record = CardRecord::from_attributes(url, attrs);
    if insert_card(db, &record).await? {
        info!(name = ?record.name, extension = ?record.extension, "card stored");
        Ok(CardOutcome::Inserted)
    } else {
        Ok(CardOutcome::AlreadyPresent)
    }
}

/// Card loop over a deduplicated URL set. With `skip_known`, URLs already in
/// the Card table are not fetched again.
pub async fn crawl_cards(
    provider: &dyn DocumentProvider,
    db: &Db,
    urls: &[String],
    skip_known: bool,
    concurrency: usize,
) -> Result<CardCrawlSummary> {
    let known = if skip_known {
        known_card_urls(db).await?
    } else {
        HashSet::new()
    };

    let mut seen = HashSet::new();
    let unique: Vec<&String> = urls.iter().filter(|u| seen.insert(u.as_str())).collect();

    let mut summary = CardCrawlSummary {
        attempted: unique.len(),
        ..CardCrawlSummary::default()
    };
    let (skipped, pending): (Vec<&String>, Vec<&String>) =
        unique.into_iter().partition(|u| known.contains(u.as_str()));
    summary.already_present += skipped.len();

    let outcomes: Vec<CardOutcome> = stream::iter(pending)
        .map(|url| fetch_card(provider, db, url))
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;
    for outcome in outcomes {
        summary.record(outcome);
    }

    info!(?summary, "card crawl complete");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::testing::FakeProvider;
    use crate::database_ops::cards::get_card;

    fn card_page(name: &str, hp: &str) -> String {
        format!(
            r#"<p class="card-text-title"><a>{name}</a> - Grass - {hp} HP</p>
               <p class="card-text-type">Pokémon - Basic</p>
               <p class="card-text-wrr">Weakness: Fire<br>Retreat: 1</p>"#
        )
    }

    const BULBA: &str = "https://cards.test/cards/A1/1";
    const ODDISH: &str = "https://cards.test/cards/A1a/2";
    const BROKEN: &str = "https://cards.test/cards/A2/3";
    const GONE: &str = "https://cards.test/cards/A2/4";

    fn provider() -> FakeProvider {
        let mut provider = FakeProvider::default();
        provider.page(BULBA, card_page("Bulbasaur", "70"));
        provider.page(ODDISH, card_page("Oddish", "60"));
        provider.page(BROKEN, "<p>maintenance</p>".to_string());
        provider.status(GONE, 500);
        provider
    }

    fn urls() -> Vec<String> {
        [BULBA, ODDISH, BROKEN, GONE, BULBA].iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn failures_are_skipped_without_aborting() {
        let db = Db::connect_in_memory().await.unwrap();
        let provider = provider();
        let summary = crawl_cards(&provider, &db, &urls(), true, 1).await.unwrap();

        assert_eq!(
            summary,
            CardCrawlSummary {
                attempted: 4,
                inserted: 2,
                already_present: 0,
                fetch_failed: 1,
                parse_failed: 1,
            }
        );
        let bulba = get_card(&db, BULBA).await.unwrap().unwrap();
        assert_eq!(bulba.hp, Some(70));
        assert_eq!(bulba.extension.as_deref(), Some("A1"));
        assert_eq!(bulba.weakness.as_deref(), Some("Fire"));
    }

    #[tokio::test]
    async fn second_run_leaves_card_table_unchanged() {
        let db = Db::connect_in_memory().await.unwrap();
        let provider = provider();
        crawl_cards(&provider, &db, &urls(), false, 2).await.unwrap();
        let before = get_card(&db, ODDISH).await.unwrap();
        let count_before = db.table_counts().await.unwrap().cards;

        let again = crawl_cards(&provider, &db, &urls(), false, 2).await.unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.already_present, 2);
        assert_eq!(get_card(&db, ODDISH).await.unwrap(), before);
        assert_eq!(db.table_counts().await.unwrap().cards, count_before);
    }

    #[tokio::test]
    async fn known_urls_are_not_refetched() {
        let db = Db::connect_in_memory().await.unwrap();
        let provider = provider();
        crawl_cards(&provider, &db, &urls(), true, 1).await.unwrap();
        let requests_before = provider.requests();

        let again = crawl_cards(&provider, &db, &urls(), true, 1).await.unwrap();
        assert_eq!(again.already_present, 2);
        // only the two failing URLs are tried again
        assert_eq!(provider.requests() - requests_before, 2);
    }
}
