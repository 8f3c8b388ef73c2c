use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::DbPool;
use crate::store::StoreError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn get(pool: &DbPool, key: &str) -> Option<String> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT value FROM site_settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .ok()
    }

    pub fn get_or(pool: &DbPool, key: &str, default: &str) -> String {
        Self::get(pool, key).unwrap_or_else(|| default.to_string())
    }

    /// Single-key upsert. Settings are one row per key; writing one key
    /// never touches another.
    pub fn set(pool: &DbPool, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO site_settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn all(pool: &DbPool) -> HashMap<String, String> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return HashMap::new(),
        };

        let mut stmt = match conn.prepare("SELECT key, value FROM site_settings") {
            Ok(s) => s,
            Err(_) => return HashMap::new(),
        };

        stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }
}

// ── JSON sub-schemas stored inside settings values ──────────────────
//
// Each is decoded independently at the edge; a missing or malformed
// value falls back to the hard-coded default instead of erroring.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionCard {
    pub emoji: String,
    pub title: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionLine {
    pub text: String,
    pub color: String, // "red" | "blue"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub icon: String,
    pub text: String,
}

fn decode_or<T: serde::de::DeserializeOwned>(raw: Option<String>, fallback: &str) -> Vec<T> {
    match raw.and_then(|v| serde_json::from_str(&v).ok()) {
        Some(list) => list,
        None => serde_json::from_str(fallback).unwrap_or_default(),
    }
}

pub fn vision_cards(raw: Option<String>) -> Vec<VisionCard> {
    decode_or(raw, crate::db::DEFAULT_VISION_CARDS)
}

pub fn vision_lines(raw: Option<String>) -> Vec<VisionLine> {
    decode_or(raw, crate::db::DEFAULT_VISION_LINES)
}

pub fn product_specs(raw: Option<String>) -> Vec<ProductSpec> {
    decode_or(raw, crate::db::DEFAULT_PRODUCT_SPECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vision_cards_fall_back_on_garbage() {
        let cards = vision_cards(Some("not json".to_string()));
        assert!(!cards.is_empty());
        assert_eq!(cards, vision_cards(None));
    }

    #[test]
    fn vision_lines_decode_stored_value() {
        let raw = r#"[{"text":"hello","color":"red"}]"#.to_string();
        let lines = vision_lines(Some(raw));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "hello");
    }

    #[test]
    fn product_specs_fall_back_when_missing() {
        assert!(!product_specs(None).is_empty());
    }
}
