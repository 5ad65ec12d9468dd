use anyhow::Result;
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};

use super::provider::{pairings_url, DocumentProvider};
use crate::database_ops::{apply_standing, Db, StandingSnapshot};
use crate::extraction::{extract_round, RoundExtraction};

/// Why a tournament's round loop ended. Both reasons look the same from the
/// outside (no more rounds) but are logged and reported apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The round page could not be fetched (`status` is `None` on transport errors).
    HttpFailure { round: i64, status: Option<u16> },
    /// The round page had no player cells.
    EmptyRound { round: i64 },
}

impl StopReason {
    pub fn round(self) -> i64 {
        match self {
            StopReason::HttpFailure { round, .. } | StopReason::EmptyRound { round } => round,
        }
    }
}

/// States of the per-tournament round loop.
#[derive(Debug)]
enum CrawlState {
    Fetching { round: i64 },
    Parsing { round: i64, body: String },
    Continue { round: i64 },
    Stopped(StopReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingCrawlOutcome {
    pub tournament_id: String,
    /// Always one less than the round that stopped the loop.
    pub rounds_completed: i64,
    pub stop: StopReason,
    pub standings_observed: u64,
    pub standings_applied: u64,
    pub stale_writes: u64,
}

/// Walk rounds 1, 2, ... of one tournament until a round cannot be fetched or
/// lists no players. No upper bound and no retry: a failing round ends the
/// tournament. Store errors abort and propagate.
#[instrument(skip(provider, db, base_url))]
pub async fn crawl_tournament(
    provider: &dyn DocumentProvider,
    db: &Db,
    base_url: &str,
    tournament_id: &str,
) -> Result<PairingCrawlOutcome> {
    let mut outcome = PairingCrawlOutcome {
        tournament_id: tournament_id.to_string(),
        rounds_completed: 0,
        stop: StopReason::EmptyRound { round: 1 },
        standings_observed: 0,
        standings_applied: 0,
        stale_writes: 0,
    };

    let mut state = CrawlState::Fetching { round: 1 };
    let stop = loop {
        state = match state {
            CrawlState::Fetching { round } => {
                let url = pairings_url(base_url, tournament_id, round);
                debug!(round, %url, "fetching pairing round");
                match provider.fetch(&url).await {
                    Ok(body) => CrawlState::Parsing { round, body },
                    Err(err) => CrawlState::Stopped(StopReason::HttpFailure {
                        round,
                        status: err.status(),
                    }),
                }
            }
            CrawlState::Parsing { round, body } => match extract_round(&body) {
                RoundExtraction::Empty => CrawlState::Stopped(StopReason::EmptyRound { round }),
                RoundExtraction::Players(players) => {
                    for raw in players {
                        let snapshot = StandingSnapshot::from_raw(tournament_id, round, raw);
                        outcome.standings_observed += 1;
                        if apply_standing(db, &snapshot).await?.applied() {
                            outcome.standings_applied += 1;
                        } else {
                            outcome.stale_writes += 1;
                            debug!(round, player_id = %snapshot.player_id, "stale standing ignored");
                        }
                    }
                    CrawlState::Continue { round }
                }
            },
            CrawlState::Continue { round } => CrawlState::Fetching { round: round + 1 },
            CrawlState::Stopped(reason) => break reason,
        };
    };

    match stop {
        StopReason::HttpFailure { round, status } => {
            warn!(round, ?status, "pairing fetch failed; tournament crawl stopped")
        }
        StopReason::EmptyRound { round } => {
            info!(round, "no players on round; tournament crawl finished")
        }
    }

    outcome.stop = stop;
    outcome.rounds_completed = stop.round() - 1;
    Ok(outcome)
}

/// Crawl every tournament, up to `concurrency` at once. Rounds of one
/// tournament stay strictly sequential. Outcomes are sorted by tournament id.
pub async fn crawl_pairings(
    provider: &dyn DocumentProvider,
    db: &Db,
    base_url: &str,
    tournament_ids: &[String],
    concurrency: usize,
) -> Result<Vec<PairingCrawlOutcome>> {
    let mut outcomes: Vec<PairingCrawlOutcome> = stream::iter(tournament_ids)
        .map(|id| crawl_tournament(provider, db, base_url, id))
        .buffer_unordered(concurrency.max(1))
        .try_collect()
        .await?;
    outcomes.sort_by(|a, b| a.tournament_id.cmp(&b.tournament_id));

    let rounds: i64 = outcomes.iter().map(|o| o.rounds_completed).sum();
    info!(tournaments = outcomes.len(), rounds, "pairing crawl complete");
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::testing::FakeProvider;
    use crate::database_ops::standings::get_standing;

    const BASE: &str = "https://pairings.test";

    fn round_page(players: &[(&str, i64, i64, i64)]) -> String {
        let cells: String = players
            .iter()
            .map(|(id, w, l, t)| {
                format!(
                    r#"<td class="player" data-id="{id}" data-wins="{w}" data-losses="{l}" data-ties="{t}"><div class="name">{id}</div></td>"#
                )
            })
            .collect();
        format!("<table><tr>{cells}</tr></table>")
    }

    fn three_round_tournament(provider: &mut FakeProvider, id: &str) {
        provider.page(
            &pairings_url(BASE, id, 1),
            round_page(&[("ash", 1, 0, 0), ("gary", 0, 1, 0)]),
        );
        provider.page(
            &pairings_url(BASE, id, 2),
            round_page(&[("ash", 1, 1, 0), ("gary", 1, 1, 0)]),
        );
        provider.page(
            &pairings_url(BASE, id, 3),
            round_page(&[("ash", 2, 1, 0), ("gary", 1, 1, 1)]),
        );
    }

    #[tokio::test]
    async fn stops_at_first_failing_round() {
        let db = Db::connect_in_memory().await.unwrap();
        let mut provider = FakeProvider::default();
        three_round_tournament(&mut provider, "t1");
        provider.status(&pairings_url(BASE, "t1", 4), 404);
        // must never be reached
        provider.page(&pairings_url(BASE, "t1", 5), round_page(&[("ash", 9, 9, 9)]));

        let outcome = crawl_tournament(&provider, &db, BASE, "t1").await.unwrap();
        assert_eq!(outcome.rounds_completed, 3);
        assert_eq!(outcome.stop, StopReason::HttpFailure { round: 4, status: Some(404) });
        assert_eq!(outcome.standings_observed, 6);
        assert_eq!(outcome.standings_applied, 6);
        assert_eq!(provider.requests(), 4);

        let ash = get_standing(&db, "t1", "ash").await.unwrap().unwrap();
        assert_eq!(ash.round_number, 3);
        assert_eq!((ash.wins, ash.losses, ash.ties), (Some(2), Some(1), Some(0)));
        let gary = get_standing(&db, "t1", "gary").await.unwrap().unwrap();
        assert_eq!((gary.wins, gary.losses, gary.ties), (Some(1), Some(1), Some(1)));
    }

    #[tokio::test]
    async fn empty_round_is_a_distinct_stop_reason() {
        let db = Db::connect_in_memory().await.unwrap();
        let mut provider = FakeProvider::default();
        three_round_tournament(&mut provider, "t1");
        provider.page(&pairings_url(BASE, "t1", 4), "<p>Round not started</p>".to_string());

        let outcome = crawl_tournament(&provider, &db, BASE, "t1").await.unwrap();
        assert_eq!(outcome.rounds_completed, 3);
        assert_eq!(outcome.stop, StopReason::EmptyRound { round: 4 });
    }

    #[tokio::test]
    async fn transport_error_on_first_round_means_zero_rounds() {
        let db = Db::connect_in_memory().await.unwrap();
        let provider = FakeProvider::default();

        let outcome = crawl_tournament(&provider, &db, BASE, "ghost").await.unwrap();
        assert_eq!(outcome.rounds_completed, 0);
        assert_eq!(outcome.stop, StopReason::HttpFailure { round: 1, status: None });
        assert_eq!(db.table_counts().await.unwrap().player_standings, 0);
    }

    #[tokio::test]
    async fn recrawl_leaves_latest_round_in_place() {
        let db = Db::connect_in_memory().await.unwrap();
        let mut provider = FakeProvider::default();
        three_round_tournament(&mut provider, "t1");

        crawl_tournament(&provider, &db, BASE, "t1").await.unwrap();
        let again = crawl_tournament(&provider, &db, BASE, "t1").await.unwrap();
        // replayed rounds are never newer than the stored round 3
        assert_eq!(again.standings_applied, 0);
        assert_eq!(again.stale_writes, 6);
        let ash = get_standing(&db, "t1", "ash").await.unwrap().unwrap();
        assert_eq!(ash.round_number, 3);
    }

    #[tokio::test]
    async fn tournaments_crawl_concurrently_with_sorted_outcomes() {
        let db = Db::connect_in_memory().await.unwrap();
        let mut provider = FakeProvider::default();
        three_round_tournament(&mut provider, "t2");
        three_round_tournament(&mut provider, "t1");
        provider.page(&pairings_url(BASE, "t3", 1), round_page(&[("misty", 1, 0, 0)]));

        let ids = vec!["t2".to_string(), "t3".to_string(), "t1".to_string()];
        let outcomes = crawl_pairings(&provider, &db, BASE, &ids, 3).await.unwrap();
        let summary: Vec<(&str, i64)> = outcomes
            .iter()
            .map(|o| (o.tournament_id.as_str(), o.rounds_completed))
            .collect();
        assert_eq!(summary, vec![("t1", 3), ("t2", 3), ("t3", 1)]);
        assert_eq!(db.table_counts().await.unwrap().player_standings, 5);
    }
}
