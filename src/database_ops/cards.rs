use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use sqlx::Row;

use super::db::Db;
use crate::extraction::Stage;
use crate::normalization::CardRecord;

/// Insert a card keyed by URL. Returns `false` when the URL is already stored;
/// the existing row is never modified.
pub async fn insert_card(db: &Db, card: &CardRecord) -> Result<bool> {
    let res = sqlx::query(
        "INSERT INTO cards
             (url, name, element_type, hp, stage, evolves_from, weakness, retreat, extension)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (url) DO NOTHING",
    )
    .bind(&card.url)
    .bind(&card.name)
    .bind(&card.element_type)
    .bind(card.hp)
    .bind(card.stage.map(Stage::as_str))
    .bind(&card.evolves_from)
    .bind(&card.weakness)
    .bind(&card.retreat)
    .bind(&card.extension)
    .execute(&db.pool)
    .await
    .with_context(|| format!("inserting card {}", card.url))?;
    Ok(res.rows_affected() == 1)
}

pub async fn known_card_urls(db: &Db) -> Result<HashSet<String>> {
    let urls = sqlx::query_scalar::<_, String>("SELECT url FROM cards")
        .fetch_all(&db.pool)
        .await?;
    Ok(urls.into_iter().collect())
}

/// Stored extension tag per card URL (the tag itself may be null).
pub async fn card_extensions(db: &Db) -> Result<HashMap<String, Option<String>>> {
    let rows = sqlx::query("SELECT url, extension FROM cards")
        .fetch_all(&db.pool)
        .await?;
    let mut out = HashMap::with_capacity(rows.len());
    for row in rows {
        out.insert(row.try_get("url")?, row.try_get("extension")?);
    }
    Ok(out)
}

pub async fn get_card(db: &Db, url: &str) -> Result<Option<CardRecord>> {
    let row = sqlx::query(
        "SELECT url, name, element_type, hp, stage, evolves_from, weakness, retreat, extension
         FROM cards WHERE url = ?",
    )
    .bind(url)
    .fetch_optional(&db.pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let stage: Option<String> = row.try_get("stage")?;
    Ok(Some(CardRecord {
        url: row.try_get("url")?,
        name: row.try_get("name")?,
        element_type: row.try_get("element_type")?,
        hp: row.try_get("hp")?,
        stage: stage.as_deref().and_then(Stage::detect),
        evolves_from: row.try_get("evolves_from")?,
        weakness: row.try_get("weakness")?,
        retreat: row.try_get("retreat")?,
        extension: row.try_get("extension")?,
    }))
}
