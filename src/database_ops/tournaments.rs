use anyhow::{Context, Result};
use sqlx::SqliteConnection;
use tracing::{debug, instrument};

use super::db::Db;
use super::{decklists, matches};
use crate::corpus::TournamentDocument;

/// What one tournament document changed in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TournamentIngest {
    pub tournament_inserted: bool,
    pub decklist_rows: u64,
    pub matches_inserted: u64,
    pub matches_ignored: u64,
}

/// Insert the tournament row; an existing id is left untouched.
pub async fn insert_tournament(conn: &mut SqliteConnection, doc: &TournamentDocument) -> Result<bool> {
    let res = sqlx::query(
        "INSERT INTO tournaments (tournament_id, name, tournament_date, organizer, format, nb_players)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (tournament_id) DO NOTHING",
    )
    .bind(&doc.id)
    .bind(&doc.name)
    .bind(doc.date.map(|d| d.to_rfc3339()))
    .bind(&doc.organizer)
    .bind(&doc.format)
    .bind(doc.nb_players)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("inserting tournament {}", doc.id))?;
    Ok(res.rows_affected() == 1)
}

/// Persist one corpus document atomically: tournament row, decklists
/// (replacing whatever that tournament had) and matches (duplicates ignored).
#[instrument(skip(db, doc), fields(tournament_id = %doc.id))]
pub async fn ingest_tournament(db: &Db, doc: &TournamentDocument) -> Result<TournamentIngest> {
    let entries = doc.decklist_entries();
    let records = doc.match_records();

    let mut tx = db.pool.begin().await?;
    let tournament_inserted = insert_tournament(&mut tx, doc).await?;
    let decklist_rows = decklists::replace_tournament_decklists(&mut tx, &doc.id, &entries).await?;

    let mut summary = TournamentIngest {
        tournament_inserted,
        decklist_rows,
        ..TournamentIngest::default()
    };
    for record in &records {
        if matches::insert_match(&mut tx, record).await? {
            summary.matches_inserted += 1;
        } else {
            summary.matches_ignored += 1;
        }
    }
    tx.commit().await?;

    debug!(?summary, "tournament ingested");
    Ok(summary)
}

/// Tournament ids known to the store, sorted.
pub async fn tournament_ids(db: &Db) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT tournament_id FROM tournaments ORDER BY tournament_id",
    )
    .fetch_all(&db.pool)
    .await?;
    Ok(ids)
}
