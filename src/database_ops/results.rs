use anyhow::{Context, Result};
use sqlx::Row;
use tracing::info;

use super::db::Db;
use crate::aggregation::AggregatedDeckResult;

/// Swap the whole `deck_results` table for `rows` in one transaction; readers
/// see either the previous table or the new one.
pub async fn replace_deck_results(db: &Db, rows: &[AggregatedDeckResult]) -> Result<u64> {
    let mut tx = db.pool.begin().await?;
    let removed = sqlx::query("DELETE FROM deck_results")
        .execute(&mut *tx)
        .await
        .context("clearing deck_results")?
        .rows_affected();

    let mut inserted = 0;
    for row in rows {
        inserted += sqlx::query(
            "INSERT INTO deck_results
                 (deck, tournament_id, nb_match, nb_victory, winrate, ext, extension, nb_players)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&row.deck)
        .bind(&row.tournament_id)
        .bind(row.match_count)
        .bind(row.victory_count)
        .bind(row.win_rate)
        .bind(row.extension_ordinal)
        .bind(&row.extension)
        .bind(row.player_count)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("inserting deck result for {}", row.tournament_id))?
        .rows_affected();
    }
    tx.commit().await?;

    info!(removed, inserted, "deck_results rebuilt");
    Ok(inserted)
}

pub async fn load_deck_results(db: &Db) -> Result<Vec<AggregatedDeckResult>> {
    let rows = sqlx::query(
        "SELECT deck, tournament_id, nb_match, nb_victory, winrate, ext, extension, nb_players
         FROM deck_results
         ORDER BY tournament_id, deck",
    )
    .fetch_all(&db.pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<AggregatedDeckResult> {
            Ok(AggregatedDeckResult {
                deck: row.try_get("deck")?,
                tournament_id: row.try_get("tournament_id")?,
                match_count: row.try_get("nb_match")?,
                victory_count: row.try_get("nb_victory")?,
                win_rate: row.try_get("winrate")?,
                extension_ordinal: row.try_get("ext")?,
                extension: row.try_get("extension")?,
                player_count: row.try_get("nb_players")?,
            })
        })
        .collect()
}
