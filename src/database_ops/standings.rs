use anyhow::{Context, Result};
use sqlx::Row;

use super::db::Db;
use crate::extraction::RawStanding;

/// A player's cumulative record as observed on one pairing round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingSnapshot {
    pub tournament_id: String,
    pub player_id: String,
    pub round_number: i64,
    pub name: Option<String>,
    pub wins: Option<i64>,
    pub losses: Option<i64>,
    pub ties: Option<i64>,
}

impl StandingSnapshot {
    pub fn from_raw(tournament_id: &str, round_number: i64, raw: RawStanding) -> Self {
        Self {
            tournament_id: tournament_id.to_string(),
            player_id: raw.player_id,
            round_number,
            name: raw.name,
            wins: raw.wins,
            losses: raw.losses,
            ties: raw.ties,
        }
    }
}

/// Result of a monotonic standing write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandingWrite {
    /// First snapshot for this (tournament, player).
    Inserted,
    /// Stored snapshot was from an earlier round and got replaced.
    Advanced,
    /// Stored snapshot is from the same or a later round; nothing changed.
    Stale,
}

impl StandingWrite {
    pub fn applied(self) -> bool {
        !matches!(self, StandingWrite::Stale)
    }
}

/// Compare-and-swap on the round number: the stored row is replaced only when
/// `snapshot` comes from a strictly later round. Concurrent writers for the same
/// player converge on the newest round whatever order they land in.
pub async fn apply_standing(db: &Db, snapshot: &StandingSnapshot) -> Result<StandingWrite> {
    // Two passes cover a concurrent first insert landing between our update
    // and our insert.
    for _ in 0..2 {
        let advanced = sqlx::query(
            "UPDATE player_standings
             SET round_number = ?, name = ?, wins = ?, losses = ?, ties = ?
             WHERE tournament_id = ? AND player_id = ? AND round_number < ?",
        )
        .bind(snapshot.round_number)
        .bind(&snapshot.name)
        .bind(snapshot.wins)
        .bind(snapshot.losses)
        .bind(snapshot.ties)
        .bind(&snapshot.tournament_id)
        .bind(&snapshot.player_id)
        .bind(snapshot.round_number)
        .execute(&db.pool)
        .await
        .context("advancing player standing")?;
        if advanced.rows_affected() > 0 {
            return Ok(StandingWrite::Advanced);
        }

        let inserted = sqlx::query(
            "INSERT INTO player_standings
                 (tournament_id, player_id, round_number, name, wins, losses, ties)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (tournament_id, player_id) DO NOTHING",
        )
        .bind(&snapshot.tournament_id)
        .bind(&snapshot.player_id)
        .bind(snapshot.round_number)
        .bind(&snapshot.name)
        .bind(snapshot.wins)
        .bind(snapshot.losses)
        .bind(snapshot.ties)
        .execute(&db.pool)
        .await
        .context("inserting player standing")?;
        if inserted.rows_affected() > 0 {
            return Ok(StandingWrite::Inserted);
        }

        let stored = stored_round(db, &snapshot.tournament_id, &snapshot.player_id).await?;
        if stored.is_some_and(|round| round >= snapshot.round_number) {
            return Ok(StandingWrite::Stale);
        }
    }
    Ok(StandingWrite::Stale)
}

async fn stored_round(db: &Db, tournament_id: &str, player_id: &str) -> Result<Option<i64>> {
    let round = sqlx::query_scalar::<_, i64>(
        "SELECT round_number FROM player_standings WHERE tournament_id = ? AND player_id = ?",
    )
    .bind(tournament_id)
    .bind(player_id)
    .fetch_optional(&db.pool)
    .await?;
    Ok(round)
}

pub async fn get_standing(
    db: &Db,
    tournament_id: &str,
    player_id: &str,
) -> Result<Option<StandingSnapshot>> {
    let row = sqlx::query(
        "SELECT tournament_id, player_id, round_number, name, wins, losses, ties
         FROM player_standings WHERE tournament_id = ? AND player_id = ?",
    )
    .bind(tournament_id)
    .bind(player_id)
    .fetch_optional(&db.pool)
    .await?;

    row.map(|row| -> Result<StandingSnapshot> {
        Ok(StandingSnapshot {
            tournament_id: row.try_get("tournament_id")?,
            player_id: row.try_get("player_id")?,
            round_number: row.try_get("round_number")?,
            name: row.try_get("name")?,
            wins: row.try_get("wins")?,
            losses: row.try_get("losses")?,
            ties: row.try_get("ties")?,
        })
    })
    .transpose()
}
