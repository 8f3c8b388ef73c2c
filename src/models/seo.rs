use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::store::StoreError;

/// FAQ-style content block rendered at the bottom of the storefront.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SeoItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SeoForm {
    pub title: String,
    pub content: String,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeoPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

impl SeoItem {
    const SELECT_COLS: &'static str =
        "id, title, content, is_active, sort_order, created_at, updated_at";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let active: i64 = row.get("is_active")?;
        Ok(SeoItem {
            id: row.get("id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            is_active: active != 0,
            sort_order: row.get("sort_order")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM seo_content WHERE id = ?1", Self::SELECT_COLS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn list_public(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(&format!(
            "SELECT {} FROM seo_content WHERE is_active = 1 ORDER BY sort_order, id",
            Self::SELECT_COLS
        )) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn list_admin(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(&format!(
            "SELECT {} FROM seo_content ORDER BY sort_order, id",
            Self::SELECT_COLS
        )) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &SeoForm) -> Result<i64, StoreError> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO seo_content (title, content, is_active, sort_order)
             VALUES (?1, ?2, 1, ?3)",
            params![form.title, form.content, form.sort_order.unwrap_or(0)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, patch: &SeoPatch) -> Result<(), StoreError> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(v) = &patch.title {
            values.push(Box::new(v.clone()));
            sets.push(format!("title = ?{}", values.len()));
        }
        if let Some(v) = &patch.content {
            values.push(Box::new(v.clone()));
            sets.push(format!("content = ?{}", values.len()));
        }
        if let Some(v) = patch.is_active {
            values.push(Box::new(v as i64));
            sets.push(format!("is_active = ?{}", values.len()));
        }
        if let Some(v) = patch.sort_order {
            values.push(Box::new(v));
            sets.push(format!("sort_order = ?{}", values.len()));
        }
        if sets.is_empty() {
            return match Self::find_by_id(pool, id) {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound),
            };
        }
        sets.push("updated_at = CURRENT_TIMESTAMP".to_string());

        values.push(Box::new(id));
        let sql = format!(
            "UPDATE seo_content SET {} WHERE id = ?{}",
            sets.join(", "),
            values.len()
        );
        let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let conn = pool.get()?;
        let changed = conn.execute(&sql, refs.as_slice())?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub fn delete(pool: &DbPool, id: i64) -> Result<(), StoreError> {
        let conn = pool.get()?;
        let deleted = conn.execute("DELETE FROM seo_content WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
