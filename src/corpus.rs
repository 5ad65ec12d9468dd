//! Externally supplied tournament documents: one JSON file per tournament with
//! its metadata, every player's decklist and the match results.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::normalization::{MatchRecord, MatchSide};

#[derive(Debug, Clone, Deserialize)]
pub struct TournamentDocument {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub organizer: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub nb_players: Option<i64>,
    #[serde(default)]
    pub players: Vec<PlayerDocument>,
    #[serde(default)]
    pub matches: Vec<MatchDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerDocument {
    pub id: String,
    #[serde(default)]
    pub decklist: Vec<DecklistCard>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecklistCard {
    #[serde(rename = "type")]
    pub card_type: String,
    pub name: String,
    pub url: String,
    /// `None` when the export carried something that is not a whole number.
    #[serde(default, deserialize_with = "lenient_count")]
    pub count: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchDocument {
    #[serde(default)]
    pub match_results: Vec<MatchResultDocument>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchResultDocument {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub score: Option<i64>,
}

/// Numbers sometimes arrive as strings ("32"); accept both.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// RFC 3339 timestamps, or a bare `YYYY-MM-DD` read as midnight UTC. Anything
/// else becomes `None` so the rest of the tournament still loads.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        None | Some(Value::Null) => return Ok(None),
        Some(other) => {
            warn!(value = %other, "tournament date is not a string; stored as null");
            return Ok(None);
        }
    };
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(midnight.and_utc()));
    }
    warn!(value = raw, "unparsable tournament date; stored as null");
    Ok(None)
}

/// A decklist row flattened out of the corpus, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecklistEntry {
    pub tournament_id: String,
    pub player_id: String,
    pub card_type: String,
    pub card_name: String,
    pub card_url: String,
    pub count: i64,
}

impl TournamentDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid tournament document")
    }

    /// Every positive-count decklist row of every player. Rows with a missing
    /// or non-integer count are skipped one at a time.
    pub fn decklist_entries(&self) -> Vec<DecklistEntry> {
        let mut out = Vec::new();
        for player in &self.players {
            for card in &player.decklist {
                let Some(count) = card.count.filter(|c| *c >= 1) else {
                    warn!(
                        tournament_id = %self.id,
                        player_id = %player.id,
                        card = %card.name,
                        count = ?card.count,
                        "decklist row without a positive count skipped"
                    );
                    continue;
                };
                out.push(DecklistEntry {
                    tournament_id: self.id.clone(),
                    player_id: player.id.clone(),
                    card_type: card.card_type.clone(),
                    card_name: card.name.clone(),
                    card_url: card.url.clone(),
                    count,
                });
            }
        }
        out
    }

    /// Resolved matches. Entries with fewer than two results or a side without
    /// a player id are dropped; a missing score counts as 0.
    pub fn match_records(&self) -> Vec<MatchRecord> {
        let mut out = Vec::new();
        for (idx, doc) in self.matches.iter().enumerate() {
            let sides: Vec<MatchSide> = doc
                .match_results
                .iter()
                .take(2)
                .filter_map(|r| {
                    r.player_id.as_ref().map(|id| MatchSide {
                        player_id: id.clone(),
                        score: r.score.unwrap_or(0),
                    })
                })
                .collect();
            let [first, second]: [MatchSide; 2] = match sides.try_into() {
                Ok(pair) => pair,
                Err(_) => {
                    warn!(tournament_id = %self.id, match_index = idx, "incomplete match skipped");
                    continue;
                }
            };
            out.push(MatchRecord::new(&self.id, idx as i64, first, second));
        }
        out
    }
}

/// `*.json` files of `dir`, in name order.
pub fn corpus_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading corpus directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Load every readable tournament document of `dir`. Broken files are logged
/// and skipped so one bad export does not block the rest.
pub fn load_corpus_dir(dir: &Path) -> Result<Vec<TournamentDocument>> {
    let mut docs = Vec::new();
    for path in corpus_files(dir)? {
        let parsed = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))
            .and_then(|raw| TournamentDocument::from_json(&raw));
        match parsed {
            Ok(doc) => {
                debug!(path = %path.display(), tournament_id = %doc.id, "corpus document loaded");
                docs.push(doc);
            }
            Err(err) => warn!(path = %path.display(), error = %format!("{err:#}"), "corpus document skipped"),
        }
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "id": "t1",
        "name": "Weekly Cup",
        "date": "2025-03-01T10:00:00.000Z",
        "organizer": "League",
        "format": "STANDARD",
        "nb_players": "32",
        "players": [
            {"id": "ash", "decklist": [
                {"type": "Pokémon", "name": "Pikachu", "url": "https://x/cards/A1/94", "count": 2},
                {"type": "Trainer", "name": "Potion", "url": "https://x/cards/P-A/1", "count": "1"},
                {"type": "Trainer", "name": "Ghost", "url": "https://x/cards/P-A/9", "count": 0}
            ]},
            {"id": "misty"}
        ],
        "matches": [
            {"match_results": [{"player_id": "ash", "score": 2}, {"player_id": "misty", "score": 1}]},
            {"match_results": [{"player_id": "ash", "score": 1}]},
            {"match_results": [{"player_id": "ash"}, {"player_id": "misty", "score": 0}]}
        ]
    }"#;

    #[test]
    fn parses_document_with_lenient_numbers() {
        let doc = TournamentDocument::from_json(DOC).unwrap();
        assert_eq!(doc.id, "t1");
        assert_eq!(doc.nb_players, Some(32));
        assert_eq!(doc.date.unwrap().to_rfc3339(), "2025-03-01T10:00:00+00:00");
        assert_eq!(doc.players.len(), 2);
        assert!(doc.players[1].decklist.is_empty());
    }

    #[test]
    fn decklist_entries_skip_non_positive_counts() {
        let doc = TournamentDocument::from_json(DOC).unwrap();
        let entries = doc.decklist_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].card_name, "Potion");
        assert_eq!(entries[1].count, 1);
        assert!(entries.iter().all(|e| e.player_id == "ash"));
    }

    #[test]
    fn match_records_keep_index_and_skip_incomplete() {
        let doc = TournamentDocument::from_json(DOC).unwrap();
        let matches = doc.match_records();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].match_index, 0);
        assert_eq!(matches[0].winner.as_deref(), Some("ash"));
        assert_eq!(matches[1].match_index, 2);
        // missing score counts as zero: 0 vs 0 is a tie
        assert_eq!(matches[1].winner, None);
    }

    #[test]
    fn unparsable_date_becomes_null_and_keeps_tournament() {
        let dir = tempfile::tempdir().unwrap();
        let odd_date = DOC.replace("2025-03-01T10:00:00.000Z", "first of March");
        fs::write(dir.path().join("t1.json"), odd_date).unwrap();

        let docs = load_corpus_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].date, None);
        assert_eq!(docs[0].decklist_entries().len(), 2);
        assert_eq!(docs[0].match_records().len(), 2);
    }

    #[test]
    fn bare_calendar_date_is_midnight_utc() {
        let doc = TournamentDocument::from_json(
            &DOC.replace("2025-03-01T10:00:00.000Z", "2025-03-01"),
        )
        .unwrap();
        assert_eq!(doc.date.unwrap().to_rfc3339(), "2025-03-01T00:00:00+00:00");
    }

    #[test]
    fn bad_count_skips_only_that_row() {
        let dir = tempfile::tempdir().unwrap();
        let bad_counts = DOC
            .replace(r#""count": "1""#, r#""count": "one""#)
            .replace(r#""count": 0"#, r#""count": 2.5"#);
        fs::write(dir.path().join("t1.json"), bad_counts).unwrap();

        let docs = load_corpus_dir(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        let entries = docs[0].decklist_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!((entries[0].card_name.as_str(), entries[0].count), ("Pikachu", 2));
        assert_eq!(docs[0].match_records().len(), 2);
    }

    #[test]
    fn loads_json_files_in_name_order_and_skips_broken() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), DOC.replace("\"t1\"", "\"t2\"")).unwrap();
        fs::write(dir.path().join("a.json"), DOC).unwrap();
        fs::write(dir.path().join("c.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = load_corpus_dir(dir.path()).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }
}
