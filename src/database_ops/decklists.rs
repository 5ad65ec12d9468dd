use anyhow::{Context, Result};
use sqlx::{Row, SqliteConnection};

use super::db::Db;
use crate::corpus::DecklistEntry;

/// Card type (lowercased) that marks a decklist row as a Pokémon card.
pub const POKEMON_CARD_TYPE: &str = "pokémon";

/// Replace every decklist row of `tournament_id` with `entries`.
pub async fn replace_tournament_decklists(
    conn: &mut SqliteConnection,
    tournament_id: &str,
    entries: &[DecklistEntry],
) -> Result<u64> {
    sqlx::query("DELETE FROM decklist_entries WHERE tournament_id = ?")
        .bind(tournament_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("clearing decklists of {tournament_id}"))?;

    let mut inserted = 0;
    for entry in entries {
        inserted += sqlx::query(
            "INSERT INTO decklist_entries
                 (tournament_id, player_id, card_type, card_name, card_url, card_count)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.tournament_id)
        .bind(&entry.player_id)
        .bind(&entry.card_type)
        .bind(&entry.card_name)
        .bind(&entry.card_url)
        .bind(entry.count)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("inserting decklist row of {}", entry.player_id))?
        .rows_affected();
    }
    Ok(inserted)
}

pub async fn load_decklist_entries(db: &Db) -> Result<Vec<DecklistEntry>> {
    let rows = sqlx::query(
        "SELECT tournament_id, player_id, card_type, card_name, card_url, card_count
         FROM decklist_entries
         ORDER BY tournament_id, player_id, id",
    )
    .fetch_all(&db.pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<DecklistEntry> {
            Ok(DecklistEntry {
                tournament_id: row.try_get("tournament_id")?,
                player_id: row.try_get("player_id")?,
                card_type: row.try_get("card_type")?,
                card_name: row.try_get("card_name")?,
                card_url: row.try_get("card_url")?,
                count: row.try_get("card_count")?,
            })
        })
        .collect()
}

/// Distinct URLs of decklist rows typed as Pokémon, sorted. The type check is
/// a Unicode lowercase comparison done here because SQLite's `lower()` only
/// folds ASCII.
pub async fn pokemon_card_urls(db: &Db) -> Result<Vec<String>> {
    let rows = sqlx::query("SELECT DISTINCT card_url, card_type FROM decklist_entries")
        .fetch_all(&db.pool)
        .await?;

    let mut urls = Vec::new();
    for row in rows {
        let card_type: String = row.try_get("card_type")?;
        if card_type.trim().to_lowercase() == POKEMON_CARD_TYPE {
            urls.push(row.try_get::<String, _>("card_url")?);
        }
    }
    urls.sort();
    urls.dedup();
    Ok(urls)
}
