use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::showcase::{ShowcaseAssignment, ShowcaseFailure, ShowcaseOutcome};
use crate::store::StoreError;

/// Badge labels the storefront knows how to style.
pub const BADGE_TYPES: &[&str] = &["hot", "new", "special"];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: f64,
    /// Category slug string. Products reference categories by slug, not id.
    pub category: String,
    pub brand_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_slug: Option<String>,
    pub image_url: String,
    /// JSON-encoded list of additional image URLs.
    pub extra_images: Option<String>,
    pub badge: String,
    pub badge_type: Option<String>,
    pub shopier_link: String,
    pub trendyol_link: String,
    pub is_active: bool,
    pub is_showcase: bool,
    pub showcase_order: i64,
    pub sort_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: String,
    pub brand_id: Option<i64>,
    pub image_url: Option<String>,
    pub extra_images: Option<String>,
    pub badge: Option<String>,
    pub badge_type: Option<String>,
    pub shopier_link: Option<String>,
    pub trendyol_link: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub brand_id: Option<i64>,
    pub image_url: Option<String>,
    pub extra_images: Option<String>,
    pub badge: Option<String>,
    pub badge_type: Option<String>,
    pub shopier_link: Option<String>,
    pub trendyol_link: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

/// An empty badge_type means "no badge" and is stored as NULL.
pub fn normalize_badge_type(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Invariants both backends enforce, regardless of what the HTTP layer
/// already checked: non-negative price, badge_type from the known set.
pub fn check_invariants(price: f64, badge_type: Option<&str>) -> Result<(), StoreError> {
    if price < 0.0 {
        return Err(StoreError::Validation("fiyat negatif olamaz".to_string()));
    }
    if let Some(bt) = badge_type {
        if !BADGE_TYPES.contains(&bt) {
            return Err(StoreError::Validation(format!(
                "geçersiz rozet türü: {}",
                bt
            )));
        }
    }
    Ok(())
}

const SELECT_COLS: &str = "p.id, p.title, p.slug, p.description, p.price, p.category, \
     p.brand_id, b.name AS brand_name, b.slug AS brand_slug, p.image_url, p.extra_images, \
     p.badge, p.badge_type, p.shopier_link, p.trendyol_link, p.is_active, p.is_showcase, \
     p.showcase_order, p.sort_order, p.created_at, p.updated_at";

const FROM_JOINED: &str = "FROM products p LEFT JOIN brands b ON p.brand_id = b.id";

impl Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let active: i64 = row.get("is_active")?;
        let showcase: i64 = row.get("is_showcase")?;
        Ok(Product {
            id: row.get("id")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
            price: row.get("price")?,
            category: row.get("category")?,
            brand_id: row.get("brand_id")?,
            brand_name: row.get("brand_name")?,
            brand_slug: row.get("brand_slug")?,
            image_url: row.get::<_, Option<String>>("image_url")?.unwrap_or_default(),
            extra_images: row.get("extra_images")?,
            badge: row.get::<_, Option<String>>("badge")?.unwrap_or_default(),
            badge_type: row.get("badge_type")?,
            shopier_link: row.get::<_, Option<String>>("shopier_link")?.unwrap_or_default(),
            trendyol_link: row.get::<_, Option<String>>("trendyol_link")?.unwrap_or_default(),
            is_active: active != 0,
            is_showcase: showcase != 0,
            showcase_order: row.get("showcase_order")?,
            sort_order: row.get("sort_order")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} {} WHERE p.id = ?1", SELECT_COLS, FROM_JOINED),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} {} WHERE p.slug = ?1", SELECT_COLS, FROM_JOINED),
            params![slug],
            Self::from_row,
        )
        .ok()
    }

    /// Active products in storefront order, optionally narrowed to one
    /// category slug and/or one brand slug.
    pub fn list_public(
        pool: &DbPool,
        category: Option<&str>,
        brand_slug: Option<&str>,
    ) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };

        let mut sql = format!("SELECT {} {} WHERE p.is_active = 1", SELECT_COLS, FROM_JOINED);
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(c) = category {
            values.push(Box::new(c.to_string()));
            sql.push_str(&format!(" AND p.category = ?{}", values.len()));
        }
        if let Some(b) = brand_slug {
            values.push(Box::new(b.to_string()));
            sql.push_str(&format!(" AND b.slug = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY p.sort_order, p.id");

        let mut stmt = match conn.prepare(&sql) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        let refs: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|p| p.as_ref()).collect();
        stmt.query_map(refs.as_slice(), Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Everything, grouped the way the dashboard shows it.
    pub fn list_admin(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(&format!(
            "SELECT {} {} ORDER BY p.category, p.sort_order, p.id",
            SELECT_COLS, FROM_JOINED
        )) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &ProductForm) -> Result<i64, StoreError> {
        let badge_type = normalize_badge_type(form.badge_type.as_deref());
        let price = form.price.unwrap_or(0.0);
        check_invariants(price, badge_type.as_deref())?;

        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO products (title, slug, description, price, category, brand_id,
                image_url, extra_images, badge, badge_type, shopier_link, trendyol_link,
                is_active, is_showcase, showcase_order, sort_order)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, 0, 1, ?13)",
            params![
                form.title,
                form.slug,
                form.description.as_deref().unwrap_or(""),
                price,
                form.category,
                form.brand_id,
                form.image_url.as_deref().unwrap_or(""),
                form.extra_images,
                form.badge.as_deref().unwrap_or(""),
                badge_type,
                form.shopier_link.as_deref().unwrap_or(""),
                form.trendyol_link.as_deref().unwrap_or(""),
                form.sort_order.unwrap_or(0),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update(pool: &DbPool, id: i64, patch: &ProductPatch) -> Result<(), StoreError> {
        if let Some(price) = patch.price {
            check_invariants(price, None)?;
        }
        let badge_type = patch
            .badge_type
            .as_deref()
            .map(|raw| normalize_badge_type(Some(raw)));
        if let Some(Some(bt)) = &badge_type {
            check_invariants(0.0, Some(bt.as_str()))?;
        }

        let mut sets: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        if let Some(v) = &patch.title {
            values.push(Box::new(v.clone()));
            sets.push(format!("title = ?{}", values.len()));
        }
        if let Some(v) = &patch.slug {
            values.push(Box::new(v.clone()));
            sets.push(format!("slug = ?{}", values.len()));
        }
        if let Some(v) = &patch.description {
            values.push(Box::new(v.clone()));
            sets.push(format!("description = ?{}", values.len()));
        }
        if let Some(v) = patch.price {
            values.push(Box::new(v));
            sets.push(format!("price = ?{}", values.len()));
        }
        if let Some(v) = &patch.category {
            values.push(Box::new(v.clone()));
            sets.push(format!("category = ?{}", values.len()));
        }
        if let Some(v) = patch.brand_id {
            values.push(Box::new(v));
            sets.push(format!("brand_id = ?{}", values.len()));
        }
        if let Some(v) = &patch.image_url {
            values.push(Box::new(v.clone()));
            sets.push(format!("image_url = ?{}", values.len()));
        }
        if let Some(v) = &patch.extra_images {
            values.push(Box::new(v.clone()));
            sets.push(format!("extra_images = ?{}", values.len()));
        }
        if let Some(v) = &patch.badge {
            values.push(Box::new(v.clone()));
            sets.push(format!("badge = ?{}", values.len()));
        }
        if let Some(v) = badge_type {
            values.push(Box::new(v));
            sets.push(format!("badge_type = ?{}", values.len()));
        }
        if let Some(v) = &patch.shopier_link {
            values.push(Box::new(v.clone()));
            sets.push(format!("shopier_link = ?{}", values.len()));
        }
        if let Some(v) = &patch.trendyol_link {
            values.push(Box::new(v.clone()));
            sets.push(format!("trendyol_link = ?{}", values.len()));
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
            "UPDATE products SET {} WHERE id = ?{}",
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
        let deleted = conn.execute("DELETE FROM products WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// Clear-all then apply-all in one transaction: either the whole batch
    /// commits or nothing does. Assignments whose product no longer exists
    /// are reported in `failed` and skipped; the rest still commit.
    pub fn showcase_reset_and_assign(
        pool: &DbPool,
        assignments: &[ShowcaseAssignment],
    ) -> Result<ShowcaseOutcome, StoreError> {
        let mut conn = pool.get()?;
        let tx = conn.transaction()?;

        let cleared = tx.execute(
            "UPDATE products SET is_showcase = 0, showcase_order = 1",
            [],
        )?;

        let mut applied = 0usize;
        let mut failed: Vec<ShowcaseFailure> = Vec::new();
        for a in assignments {
            let changed = tx.execute(
                "UPDATE products SET is_showcase = 1, showcase_order = ?1 WHERE id = ?2",
                params![a.position, a.product_id],
            )?;
            if changed == 0 {
                failed.push(ShowcaseFailure {
                    product_id: a.product_id,
                    position: a.position,
                    list: a.list.clone(),
                    error: "ürün bulunamadı".to_string(),
                });
            } else {
                applied += 1;
            }
        }

        tx.commit()?;
        Ok(ShowcaseOutcome {
            cleared,
            applied,
            failed,
        })
    }
}
