use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::store::StoreError;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Brand {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub logo_url: String,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: String,
    /// Products referencing this brand. Only populated by admin listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BrandForm {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub sort_order: Option<i64>,
}

/// Partial update — only fields present in the request body are applied.
#[derive(Debug, Default, Deserialize)]
pub struct BrandPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

impl Brand {
    const SELECT_COLS: &'static str =
        "id, name, slug, description, logo_url, is_active, sort_order, created_at";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let active: i64 = row.get("is_active")?;
        Ok(Brand {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
            logo_url: row.get::<_, Option<String>>("logo_url")?.unwrap_or_default(),
            is_active: active != 0,
            sort_order: row.get("sort_order")?,
            created_at: row.get("created_at")?,
            product_count: None,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM brands WHERE id = ?1", Self::SELECT_COLS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM brands WHERE slug = ?1", Self::SELECT_COLS),
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// Active brands only, storefront order.
    pub fn list_public(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(&format!(
            "SELECT {} FROM brands WHERE is_active = 1 ORDER BY sort_order, id",
            Self::SELECT_COLS
        )) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// All brands with their product counts, for the dashboard.
    pub fn list_admin(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(&format!(
            "SELECT {}, (SELECT COUNT(*) FROM products p WHERE p.brand_id = brands.id) AS product_count
             FROM brands ORDER BY sort_order, id",
            Self::SELECT_COLS
        )) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], |row| {
            let mut brand = Self::from_row(row)?;
            brand.product_count = Some(row.get("product_count")?);
            Ok(brand)
        })
        .map(|rows| rows.filter_map(|r| r.ok()).collect())
        .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &BrandForm) -> Result<i64, StoreError> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO brands (name, slug, description, logo_url, is_active, sort_order)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                form.name,
                form.slug,
                form.description.as_deref().unwrap_or(""),
                form.logo_url.as_deref().unwrap_or(""),
                form.sort_order.unwrap_or(0),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, patch: &BrandPatch) -> Result<(), StoreError> {
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
        if let Some(v) = &patch.logo_url {
            values.push(Box::new(v.clone()));
            sets.push(format!("logo_url = ?{}", values.len()));
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
            // Nothing to apply, but the target must still exist.
            return match Self::find_by_id(pool, id) {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound),
            };
        }

        values.push(Box::new(id));
        let sql = format!(
            "UPDATE brands SET {} WHERE id = ?{}",
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

    /// Deleting a brand detaches its products instead of cascading.
    pub fn delete(pool: &DbPool, id: i64) -> Result<(), StoreError> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            "UPDATE products SET brand_id = NULL WHERE brand_id = ?1",
            params![id],
        )?;
        let deleted = tx.execute("DELETE FROM brands WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        tx.commit()?;
        Ok(())
    }
}
