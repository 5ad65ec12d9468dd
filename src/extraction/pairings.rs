use scraper::Html;
use tracing::debug;

use super::{select_text, selector};

const PLAYER_CELL: &str = "td.player";

/// One player cell of a pairing round: cumulative record after the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStanding {
    pub player_id: String,
    pub name: Option<String>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
    pub ties: Option<i64>,
}

/// A round page either lists players or it does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundExtraction {
    Players(Vec<RawStanding>),
    Empty,
}

impl RoundExtraction {
    pub fn len(&self) -> usize {
        match self {
            RoundExtraction::Players(players) => players.len(),
            RoundExtraction::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Enumerate every `td.player` cell of a pairing page. Cells without a
/// `data-id` cannot be keyed and are dropped; bad counters become `None`.
pub fn extract_round(html: &str) -> RoundExtraction {
    let document = Html::parse_document(html);
    let name_sel = selector("div.name");

    let players: Vec<RawStanding> = document
        .select(&selector(PLAYER_CELL))
        .filter_map(|td| {
            let attrs = td.value();
            let Some(player_id) = attrs.attr("data-id").map(str::trim).filter(|s| !s.is_empty())
            else {
                debug!("pairing cell without data-id skipped");
                return None;
            };
            let counter = |key: &str| attrs.attr(key).and_then(|v| v.trim().parse::<i64>().ok());
            Some(RawStanding {
                player_id: player_id.to_string(),
                name: select_text(&td, &name_sel),
                wins: counter("data-wins"),
                losses: counter("data-losses"),
                ties: counter("data-ties"),
            })
        })
        .collect();

    if players.is_empty() {
        RoundExtraction::Empty
    } else {
        RoundExtraction::Players(players)
    }
}
