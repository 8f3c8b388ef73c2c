use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::store::StoreError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: String,
    /// Products whose `category` field equals this slug. Admin listings only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

impl Category {
    const SELECT_COLS: &'static str =
        "id, name, slug, description, is_active, sort_order, created_at";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let active: i64 = row.get("is_active")?;
        Ok(Category {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
            is_active: active != 0,
            sort_order: row.get("sort_order")?,
            created_at: row.get("created_at")?,
            product_count: None,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM categories WHERE id = ?1", Self::SELECT_COLS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM categories WHERE slug = ?1", Self::SELECT_COLS),
            params![slug],
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
            "SELECT {} FROM categories WHERE is_active = 1 ORDER BY sort_order, id",
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
            "SELECT {}, (SELECT COUNT(*) FROM products p WHERE p.category = categories.slug) AS product_count
             FROM categories ORDER BY sort_order, id",
            Self::SELECT_COLS
        )) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], |row| {
            let mut cat = Self::from_row(row)?;
            cat.product_count = Some(row.get("product_count")?);
            Ok(cat)
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &CategoryForm) -> Result<i64, StoreError> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO categories (name, slug, description, is_active, sort_order)
             VALUES (?1, ?2, ?3, 1, ?4)",
            params![
                form.name,
                form.slug,
                form.description.as_deref().unwrap_or(""),
                form.sort_order.unwrap_or(0),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, patch: &CategoryPatch) -> Result<(), StoreError> {
        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(v) = &patch.name {
            values.push(Box::new(v.clone()));
            sets.push(format!("name = ?{}", values.len()));
        }
        if let Some(v) = &patch.slug {
            values.push(Box::new(v.clone()));
            sets.push(format!("slug = ?{}", values.len()));
        }
        if let Some(v) = &patch.description {
            values.push(Box::new(v.clone()));
            sets.push(format!("description = ?{}", values.len()));
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

        values.push(Box::new(id));
        let sql = format!(
            "UPDATE categories SET {} WHERE id = ?{}",
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

    /// Products keep their category slug string; no cleanup on delete.
    pub fn delete(pool: &DbPool, id: i64) -> Result<(), StoreError> {
        let conn = pool.get()?;
        let deleted = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
