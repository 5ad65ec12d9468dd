use anyhow::{Context, Result};
use sqlx::{Row, SqliteConnection};

use super::db::Db;
use crate::normalization::{MatchRecord, MatchSide};

/// Insert a resolved match; `false` when its (tournament, index) identity
/// already exists.
pub async fn insert_match(conn: &mut SqliteConnection, record: &MatchRecord) -> Result<bool> {
    let res = sqlx::query(
        "INSERT INTO matches
             (tournament_id, match_index, player1, score_p1, player2, score_p2, winner)
         VALUES (?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (tournament_id, match_index) DO NOTHING",
    )
    .bind(&record.tournament_id)
    .bind(record.match_index)
    .bind(&record.player1.player_id)
    .bind(record.player1.score)
    .bind(&record.player2.player_id)
    .bind(record.player2.score)
    .bind(&record.winner)
    .execute(&mut *conn)
    .await
    .with_context(|| {
        format!(
            "inserting match {}#{}",
            record.tournament_id, record.match_index
        )
    })?;
    Ok(res.rows_affected() == 1)
}

pub async fn load_matches(db: &Db) -> Result<Vec<MatchRecord>> {
    let rows = sqlx::query(
        "SELECT tournament_id, match_index, player1, score_p1, player2, score_p2, winner
         FROM matches
         ORDER BY tournament_id, match_index",
    )
    .fetch_all(&db.pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<MatchRecord> {
            Ok(MatchRecord {
                tournament_id: row.try_get("tournament_id")?,
                match_index: row.try_get("match_index")?,
                player1: MatchSide {
                    player_id: row.try_get("player1")?,
                    score: row.try_get("score_p1")?,
                },
                player2: MatchSide {
                    player_id: row.try_get("player2")?,
                    score: row.try_get("score_p2")?,
                },
                winner: row.try_get("winner")?,
            })
        })
        .collect()
}
