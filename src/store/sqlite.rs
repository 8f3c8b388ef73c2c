use std::collections::HashMap;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::models::admin_user::AdminUser;
use crate::models::brand::{Brand, BrandForm, BrandPatch};
use crate::models::category::{Category, CategoryForm, CategoryPatch};
use crate::models::product::{Product, ProductForm, ProductPatch};
use crate::models::seo::{SeoForm, SeoItem, SeoPatch};
use crate::models::settings::Setting;
use crate::showcase::{ShowcaseAssignment, ShowcaseOutcome};

use super::{Store, StoreError};

pub type DbPool = Pool<SqliteConnectionManager>;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool and delegates to model methods.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn new_at(path: &str) -> Result<Self, StoreError> {
        let pool = crate::db::init_pool_at(path).map_err(StoreError::Storage)?;
        Ok(Self { pool })
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), StoreError> {
        crate::db::run_migrations(&self.pool).map_err(StoreError::Storage)
    }

    fn seed_defaults(&self) -> Result<(), StoreError> {
        crate::db::seed_defaults(&self.pool).map_err(StoreError::Storage)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        Setting::get(&self.pool, key)
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Setting::set(&self.pool, key, value)
    }

    fn setting_all(&self) -> HashMap<String, String> {
        Setting::all(&self.pool)
    }

    // ── Brands ──────────────────────────────────────────────────────

    fn brand_list_public(&self) -> Vec<Brand> {
        Brand::list_public(&self.pool)
    }

    fn brand_list_admin(&self) -> Vec<Brand> {
        Brand::list_admin(&self.pool)
    }

    fn brand_get_by_id(&self, id: i64) -> Option<Brand> {
        Brand::find_by_id(&self.pool, id)
    }

    fn brand_get_by_slug(&self, slug: &str) -> Option<Brand> {
        Brand::find_by_slug(&self.pool, slug)
    }

    fn brand_create(&self, form: &BrandForm) -> Result<i64, StoreError> {
        Brand::create(&self.pool, form)
    }

    fn brand_update(&self, id: i64, patch: &BrandPatch) -> Result<(), StoreError> {
        Brand::update(&self.pool, id, patch)
    }

    fn brand_delete(&self, id: i64) -> Result<(), StoreError> {
        Brand::delete(&self.pool, id)
    }

    // ── Categories ──────────────────────────────────────────────────

    fn category_list_public(&self) -> Vec<Category> {
        Category::list_public(&self.pool)
    }

    fn category_list_admin(&self) -> Vec<Category> {
        Category::list_admin(&self.pool)
    }

    fn category_get_by_id(&self, id: i64) -> Option<Category> {
        Category::find_by_id(&self.pool, id)
    }

    fn category_get_by_slug(&self, slug: &str) -> Option<Category> {
        Category::find_by_slug(&self.pool, slug)
    }

    fn category_create(&self, form: &CategoryForm) -> Result<i64, StoreError> {
        Category::create(&self.pool, form)
    }

    fn category_update(&self, id: i64, patch: &CategoryPatch) -> Result<(), StoreError> {
        Category::update(&self.pool, id, patch)
    }

    fn category_delete(&self, id: i64) -> Result<(), StoreError> {
        Category::delete(&self.pool, id)
    }

    // ── Products ────────────────────────────────────────────────────

    fn product_list_public(
        &self,
        category: Option<&str>,
        brand_slug: Option<&str>,
    ) -> Vec<Product> {
        Product::list_public(&self.pool, category, brand_slug)
    }

    fn product_list_admin(&self) -> Vec<Product> {
        Product::list_admin(&self.pool)
    }

    fn product_get_by_id(&self, id: i64) -> Option<Product> {
        Product::find_by_id(&self.pool, id)
    }

    fn product_get_by_slug(&self, slug: &str) -> Option<Product> {
        Product::find_by_slug(&self.pool, slug)
    }

    fn product_create(&self, form: &ProductForm) -> Result<i64, StoreError> {
        Product::create(&self.pool, form)
    }

    fn product_update(&self, id: i64, patch: &ProductPatch) -> Result<(), StoreError> {
        Product::update(&self.pool, id, patch)
    }

    fn product_delete(&self, id: i64) -> Result<(), StoreError> {
        Product::delete(&self.pool, id)
    }

    fn showcase_reset_and_assign(
        &self,
        assignments: &[ShowcaseAssignment],
    ) -> Result<ShowcaseOutcome, StoreError> {
        Product::showcase_reset_and_assign(&self.pool, assignments)
    }

    // ── SEO content ─────────────────────────────────────────────────

    fn seo_list_public(&self) -> Vec<SeoItem> {
        SeoItem::list_public(&self.pool)
    }

    fn seo_list_admin(&self) -> Vec<SeoItem> {
        SeoItem::list_admin(&self.pool)
    }

    fn seo_get_by_id(&self, id: i64) -> Option<SeoItem> {
        SeoItem::find_by_id(&self.pool, id)
    }

    fn seo_create(&self, form: &SeoForm) -> Result<i64, StoreError> {
        SeoItem::create(&self.pool, form)
    }

    fn seo_update(&self, id: i64, patch: &SeoPatch) -> Result<(), StoreError> {
        SeoItem::update(&self.pool, id, patch)
    }

    fn seo_delete(&self, id: i64) -> Result<(), StoreError> {
        SeoItem::delete(&self.pool, id)
    }

    // ── Admin account ───────────────────────────────────────────────

    fn admin_get_by_id(&self, id: i64) -> Option<AdminUser> {
        AdminUser::find_by_id(&self.pool, id)
    }

    fn admin_get_by_username(&self, username: &str) -> Option<AdminUser> {
        AdminUser::find_by_username(&self.pool, username)
    }

    fn admin_count(&self) -> i64 {
        AdminUser::count(&self.pool)
    }

    fn admin_update_credentials(
        &self,
        id: i64,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        AdminUser::update_credentials(&self.pool, id, username, password_hash)
    }
}
