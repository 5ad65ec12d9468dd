//! Per-(deck, tournament) statistics: decklists are collapsed into deck
//! signatures, matches are flattened per participant, the two are joined on
//! (player, tournament) and every tournament is tagged with the most advanced
//! card extension its decklists use.
//!
//! Everything here is a pure function of its inputs; persistence lives in
//! `database_ops::results`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::corpus::DecklistEntry;
use crate::normalization::{extension_from_url, DeckSignature, ExtensionTable, MatchRecord};

/// One row of the final analytic table.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AggregatedDeckResult {
    pub deck: String,
    pub tournament_id: String,
    pub match_count: i64,
    pub victory_count: i64,
    /// `None` when the deck has no recorded match.
    pub win_rate: Option<f64>,
    pub extension_ordinal: Option<i64>,
    pub extension: Option<String>,
    pub player_count: i64,
}

pub struct AggregationInput<'a> {
    pub decklists: &'a [DecklistEntry],
    pub matches: &'a [MatchRecord],
    /// Extension stored on the Card table, keyed by card URL.
    pub card_extensions: &'a HashMap<String, Option<String>>,
}

type PlayerKey = (String, String); // (tournament_id, player_id)

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerMatchStats {
    pub matches: i64,
    pub victories: i64,
}

/// Step 1: one signature per (tournament, player).
pub fn deck_signatures(decklists: &[DecklistEntry]) -> BTreeMap<PlayerKey, DeckSignature> {
    let mut cards: BTreeMap<PlayerKey, Vec<(&str, i64)>> = BTreeMap::new();
    for entry in decklists {
        cards
            .entry((entry.tournament_id.clone(), entry.player_id.clone()))
            .or_default()
            .push((entry.card_name.as_str(), entry.count));
    }
    cards
        .into_iter()
        .map(|(key, cards)| (key, DeckSignature::from_cards(cards)))
        .collect()
}

/// Steps 2 and 3: flatten each match into its two participants, then count
/// matches and victories per (tournament, player).
pub fn player_match_stats(matches: &[MatchRecord]) -> HashMap<PlayerKey, PlayerMatchStats> {
    let mut stats: HashMap<PlayerKey, PlayerMatchStats> = HashMap::new();
    for outcome in matches.iter().flat_map(MatchRecord::participants) {
        let victory = outcome.is_victory();
        let entry = stats
            .entry((outcome.tournament_id, outcome.player_id))
            .or_default();
        entry.matches += 1;
        if victory {
            entry.victories += 1;
        }
    }
    stats
}

/// Step 5: victories / matches rounded to two decimals; undefined without matches.
pub fn win_rate(victories: i64, matches: i64) -> Option<f64> {
    if matches <= 0 {
        return None;
    }
    let ratio = victories as f64 / matches as f64;
    Some((ratio * 100.0).round() / 100.0)
}

/// Step 6: highest-ordinal extension among the card URLs of each tournament's
/// decklists. Unknown or missing extensions are ignored.
pub fn tournament_extensions(
    decklists: &[DecklistEntry],
    card_extensions: &HashMap<String, Option<String>>,
    table: &ExtensionTable,
) -> HashMap<String, (u32, String)> {
    let mut tags: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for entry in decklists {
        let tag = card_extensions
            .get(&entry.card_url)
            .cloned()
            .flatten()
            .or_else(|| extension_from_url(&entry.card_url));
        if let Some(tag) = tag {
            tags.entry(entry.tournament_id.as_str()).or_default().insert(tag);
        }
    }

    tags.into_iter()
        .filter_map(|(tournament_id, tags)| {
            table
                .highest(tags.iter().map(String::as_str))
                .map(|(ord, tag)| (tournament_id.to_string(), (ord, tag.to_string())))
        })
        .collect()
}

#[derive(Default)]
struct DeckGroup {
    matches: i64,
    victories: i64,
    players: BTreeSet<String>,
}

/// Full recomputation. Rows come out ordered by (tournament, deck).
pub fn aggregate(input: &AggregationInput<'_>, table: &ExtensionTable) -> Vec<AggregatedDeckResult> {
    let signatures = deck_signatures(input.decklists);
    let stats = player_match_stats(input.matches);
    let extensions = tournament_extensions(input.decklists, input.card_extensions, table);

    // Step 4: join on (tournament, player), group by (tournament, deck).
    let mut groups: BTreeMap<(String, DeckSignature), DeckGroup> = BTreeMap::new();
    for ((tournament_id, player_id), signature) in signatures {
        let player_stats = stats
            .get(&(tournament_id.clone(), player_id.clone()))
            .copied()
            .unwrap_or_default();
        let group = groups.entry((tournament_id, signature)).or_default();
        group.matches += player_stats.matches;
        group.victories += player_stats.victories;
        group.players.insert(player_id);
    }

    groups
        .into_iter()
        .map(|((tournament_id, signature), group)| {
            let ext = extensions.get(&tournament_id);
            AggregatedDeckResult {
                deck: signature.into_string(),
                win_rate: win_rate(group.victories, group.matches),
                match_count: group.matches,
                victory_count: group.victories,
                extension_ordinal: ext.map(|(ord, _)| i64::from(*ord)),
                extension: ext.map(|(_, tag)| tag.clone()),
                player_count: group.players.len() as i64,
                tournament_id,
            }
        })
        .collect()
}
