use std::collections::HashMap;

use thiserror::Error;

use crate::models::admin_user::AdminUser;
use crate::models::brand::{Brand, BrandForm, BrandPatch};
use crate::models::category::{Category, CategoryForm, CategoryPatch};
use crate::models::product::{Product, ProductForm, ProductPatch};
use crate::models::seo::{SeoForm, SeoItem, SeoPatch};
use crate::showcase::{ShowcaseAssignment, ShowcaseOutcome};

pub mod mongo;
pub mod sqlite;

/// Everything a storage operation can fail with. Backend-specific errors
/// never cross this boundary unwrapped; `Storage` detail is for logs only.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),
    #[error("Bu isim veya slug zaten kullanılıyor.")]
    Duplicate,
    #[error("Kayıt bulunamadı.")]
    NotFound,
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                match err.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => StoreError::Duplicate,
                    _ => StoreError::Validation("Geçersiz alan değeri.".to_string()),
                }
            }
            _ => StoreError::Storage(e.to_string()),
        }
    }
}

/// Unified data-access trait. One logical CRUD contract; the physical
/// backend (embedded SQLite vs hosted MongoDB) is chosen once at startup.
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<(), StoreError>;
    fn seed_defaults(&self) -> Result<(), StoreError>;
    /// "sqlite" or "mongodb"
    fn backend_name(&self) -> &'static str;

    // ── Settings ────────────────────────────────────────────────────
    fn setting_get(&self, key: &str) -> Option<String>;
    fn setting_get_or(&self, key: &str, default: &str) -> String {
        self.setting_get(key).unwrap_or_else(|| default.to_string())
    }
    fn setting_set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn setting_all(&self) -> HashMap<String, String>;

    // ── Brands ──────────────────────────────────────────────────────
    fn brand_list_public(&self) -> Vec<Brand>;
    fn brand_list_admin(&self) -> Vec<Brand>;
    fn brand_get_by_id(&self, id: i64) -> Option<Brand>;
    fn brand_get_by_slug(&self, slug: &str) -> Option<Brand>;
    fn brand_create(&self, form: &BrandForm) -> Result<i64, StoreError>;
    fn brand_update(&self, id: i64, patch: &BrandPatch) -> Result<(), StoreError>;
    /// Detaches referencing products (brand_id → NULL), never cascades.
    fn brand_delete(&self, id: i64) -> Result<(), StoreError>;

    // ── Categories ──────────────────────────────────────────────────
    fn category_list_public(&self) -> Vec<Category>;
    fn category_list_admin(&self) -> Vec<Category>;
    fn category_get_by_id(&self, id: i64) -> Option<Category>;
    fn category_get_by_slug(&self, slug: &str) -> Option<Category>;
    fn category_create(&self, form: &CategoryForm) -> Result<i64, StoreError>;
    fn category_update(&self, id: i64, patch: &CategoryPatch) -> Result<(), StoreError>;
    fn category_delete(&self, id: i64) -> Result<(), StoreError>;

    // ── Products ────────────────────────────────────────────────────
    fn product_list_public(
        &self,
        category: Option<&str>,
        brand_slug: Option<&str>,
    ) -> Vec<Product>;
    fn product_list_admin(&self) -> Vec<Product>;
    fn product_get_by_id(&self, id: i64) -> Option<Product>;
    fn product_get_by_slug(&self, slug: &str) -> Option<Product>;
    fn product_create(&self, form: &ProductForm) -> Result<i64, StoreError>;
    fn product_update(&self, id: i64, patch: &ProductPatch) -> Result<(), StoreError>;
    fn product_delete(&self, id: i64) -> Result<(), StoreError>;
    /// Clear every product's showcase flag, then apply the given
    /// assignments. Entries that fail are reported, never swallowed.
    fn showcase_reset_and_assign(
        &self,
        assignments: &[ShowcaseAssignment],
    ) -> Result<ShowcaseOutcome, StoreError>;

    // ── SEO content ─────────────────────────────────────────────────
    fn seo_list_public(&self) -> Vec<SeoItem>;
    fn seo_list_admin(&self) -> Vec<SeoItem>;
    fn seo_get_by_id(&self, id: i64) -> Option<SeoItem>;
    fn seo_create(&self, form: &SeoForm) -> Result<i64, StoreError>;
    fn seo_update(&self, id: i64, patch: &SeoPatch) -> Result<(), StoreError>;
    fn seo_delete(&self, id: i64) -> Result<(), StoreError>;

    // ── Admin account ───────────────────────────────────────────────
    fn admin_get_by_id(&self, id: i64) -> Option<AdminUser>;
    fn admin_get_by_username(&self, username: &str) -> Option<AdminUser>;
    fn admin_count(&self) -> i64;
    fn admin_update_credentials(
        &self,
        id: i64,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::showcase;
    use crate::store::sqlite::SqliteStore;
    use std::sync::Arc;

    /// Fresh in-memory store with migrations + seed applied. One pooled
    /// connection: callers queue on the pool, which is exactly the
    /// serialization the contract promises. A cost-4 admin hash is
    /// pre-inserted so seed_defaults skips the expensive DEFAULT_COST
    /// bcrypt call.
    fn test_store() -> SqliteStore {
        let manager = r2d2_sqlite::SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .build(manager)
            .expect("Failed to create test pool");
        let store = SqliteStore::new(pool);
        store.run_migrations().expect("migrations failed");
        {
            let conn = store.pool.get().unwrap();
            let fast = bcrypt::hash(crate::db::DEFAULT_ADMIN_PASSWORD, 4).unwrap();
            conn.execute(
                "INSERT OR IGNORE INTO admin_users (username, password_hash) VALUES ('admin', ?1)",
                rusqlite::params![fast],
            )
            .unwrap();
        }
        store.seed_defaults().expect("seed failed");
        store
    }

    fn brand_form(name: &str, slug: &str) -> BrandForm {
        BrandForm {
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            logo_url: None,
            sort_order: None,
        }
    }

    fn product_form(title: &str, slug: &str, category: &str, brand_id: i64) -> ProductForm {
        ProductForm {
            title: title.to_string(),
            slug: slug.to_string(),
            description: None,
            price: Some(199.90),
            category: category.to_string(),
            brand_id: Some(brand_id),
            image_url: None,
            extra_images: None,
            badge: None,
            badge_type: None,
            shopier_link: None,
            trendyol_link: None,
            sort_order: None,
        }
    }

    // ── Settings ────────────────────────────────────────────────────

    #[test]
    fn setting_roundtrip_is_string_exact() {
        let s = test_store();
        assert!(s.setting_get("no_such_key").is_none());
        s.setting_set("test_key", "  42 ").unwrap();
        assert_eq!(s.setting_get("test_key"), Some("  42 ".to_string()));
    }

    #[test]
    fn setting_update_leaves_other_keys_alone() {
        let s = test_store();
        s.setting_set("k1", "a").unwrap();
        s.setting_set("k2", "b").unwrap();
        s.setting_set("k1", "changed").unwrap();
        assert_eq!(s.setting_get("k1"), Some("changed".to_string()));
        assert_eq!(s.setting_get("k2"), Some("b".to_string()));
    }

    #[test]
    fn setting_all_contains_seeded_defaults() {
        let s = test_store();
        let all = s.setting_all();
        assert_eq!(all.get("show_sele_collection").map(String::as_str), Some("1"));
        assert!(all.contains_key("hero_title"));
        assert!(all.contains_key("session_secret"));
    }

    // ── Seeding ─────────────────────────────────────────────────────

    #[test]
    fn seed_is_idempotent() {
        let s = test_store();
        s.seed_defaults().unwrap();
        s.seed_defaults().unwrap();
        assert_eq!(s.admin_count(), 1);
        assert_eq!(s.brand_list_admin().len(), 1);
        assert_eq!(s.category_list_admin().len(), 2);
        assert_eq!(s.product_list_admin().len(), 10);
        assert_eq!(s.seo_list_admin().len(), 3);
    }

    #[test]
    fn seed_does_not_overwrite_customized_settings() {
        let s = test_store();
        s.setting_set("hero_title", "Özel Başlık").unwrap();
        s.seed_defaults().unwrap();
        assert_eq!(s.setting_get("hero_title"), Some("Özel Başlık".to_string()));
    }

    // ── Brands ──────────────────────────────────────────────────────

    #[test]
    fn brand_create_and_get() {
        let s = test_store();
        let id = s.brand_create(&brand_form("Moto Pro", "moto-pro")).unwrap();
        assert!(id > 0);

        let b = s.brand_get_by_id(id).expect("brand not found");
        assert_eq!(b.name, "Moto Pro");
        assert_eq!(b.slug, "moto-pro");
        assert!(b.is_active);
        assert_eq!(b.sort_order, 0);
        assert_eq!(b.description, "");

        let by_slug = s.brand_get_by_slug("moto-pro").unwrap();
        assert_eq!(by_slug.id, id);
    }

    #[test]
    fn brand_duplicate_slug_is_distinguishable() {
        let s = test_store();
        s.brand_create(&brand_form("A", "dup-slug")).unwrap();
        let err = s.brand_create(&brand_form("B", "dup-slug")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[test]
    fn brand_public_listing_hides_inactive() {
        let s = test_store();
        let id = s.brand_create(&brand_form("Pasif", "pasif")).unwrap();
        s.brand_update(
            id,
            &BrandPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!s.brand_list_public().iter().any(|b| b.id == id));
        assert!(s.brand_list_admin().iter().any(|b| b.id == id));
    }

    #[test]
    fn brand_delete_detaches_products() {
        let s = test_store();
        let bid = s.brand_create(&brand_form("Gone", "gone")).unwrap();
        let p1 = s
            .product_create(&product_form("P1", "p1-gone", "sele-kilifi", bid))
            .unwrap();
        let p2 = s
            .product_create(&product_form("P2", "p2-gone", "sele-kilifi", bid))
            .unwrap();

        s.brand_delete(bid).unwrap();
        assert!(s.brand_get_by_id(bid).is_none());
        assert!(!s.brand_list_admin().iter().any(|b| b.id == bid));

        let p1 = s.product_get_by_id(p1).unwrap();
        let p2 = s.product_get_by_id(p2).unwrap();
        assert_eq!(p1.brand_id, None);
        assert_eq!(p2.brand_id, None);
        assert_eq!(p1.title, "P1"); // otherwise untouched
    }

    #[test]
    fn brand_admin_listing_counts_products() {
        let s = test_store();
        let bid = s.brand_create(&brand_form("Counted", "counted")).unwrap();
        s.product_create(&product_form("C1", "c1", "sele-kilifi", bid))
            .unwrap();
        s.product_create(&product_form("C2", "c2", "sele-kilifi", bid))
            .unwrap();

        let listing = s.brand_list_admin();
        let row = listing.iter().find(|b| b.id == bid).unwrap();
        assert_eq!(row.product_count, Some(2));
    }

    #[test]
    fn brand_update_missing_id_is_not_found() {
        let s = test_store();
        let patch = BrandPatch {
            name: Some("x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            s.brand_update(99999, &patch),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(s.brand_delete(99999), Err(StoreError::NotFound)));
    }

    // ── Categories ──────────────────────────────────────────────────

    #[test]
    fn category_listings_respect_is_active() {
        let s = test_store();
        let id = s
            .category_create(&CategoryForm {
                name: "Kask".to_string(),
                slug: "kask".to_string(),
                description: None,
                sort_order: Some(3),
            })
            .unwrap();
        s.category_update(
            id,
            &CategoryPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!s.category_list_public().iter().any(|c| c.id == id));
        assert!(s.category_list_admin().iter().any(|c| c.id == id));

        let by_slug = s.category_get_by_slug("kask").unwrap();
        assert_eq!(by_slug.id, id);
        assert_eq!(s.category_get_by_id(id).unwrap().sort_order, 3);
    }

    #[test]
    fn category_admin_listing_counts_by_slug() {
        let s = test_store();
        let listing = s.category_list_admin();
        let sele = listing.iter().find(|c| c.slug == "sele-kilifi").unwrap();
        // five seeded sele products
        assert_eq!(sele.product_count, Some(5));
    }

    // ── Products ────────────────────────────────────────────────────

    #[test]
    fn product_create_then_get_returns_input_plus_defaults() {
        let s = test_store();
        let bid = s.brand_create(&brand_form("PB", "pb")).unwrap();
        let id = s
            .product_create(&product_form("Yeni Ürün", "yeni-urun", "sele-kilifi", bid))
            .unwrap();

        let p = s.product_get_by_id(id).unwrap();
        assert_eq!(p.id, id);
        assert_eq!(p.title, "Yeni Ürün");
        assert_eq!(p.slug, "yeni-urun");
        assert_eq!(p.price, 199.90);
        assert_eq!(p.category, "sele-kilifi");
        assert_eq!(p.brand_id, Some(bid));
        assert_eq!(p.brand_name.as_deref(), Some("PB"));
        assert_eq!(p.brand_slug.as_deref(), Some("pb"));
        assert!(p.is_active);
        assert!(!p.is_showcase);
        assert_eq!(p.sort_order, 0);
        assert_eq!(p.badge, "");
        assert_eq!(p.badge_type, None);
        assert!(!p.created_at.is_empty());
    }

    #[test]
    fn product_ids_are_never_reissued() {
        let s = test_store();
        let bid = s.brand_create(&brand_form("Fresh", "fresh")).unwrap();
        let a = s
            .product_create(&product_form("A", "fresh-a", "sele-kilifi", bid))
            .unwrap();
        s.product_delete(a).unwrap();
        let b = s
            .product_create(&product_form("B", "fresh-b", "sele-kilifi", bid))
            .unwrap();
        assert!(b > a);
    }

    #[test]
    fn product_concurrent_creates_get_distinct_ids() {
        let s = Arc::new(test_store());
        let bid = s.brand_create(&brand_form("Race", "race")).unwrap();

        let mut handles = Vec::new();
        for t in 0..4 {
            let s = Arc::clone(&s);
            handles.push(std::thread::spawn(move || {
                let mut ids = Vec::new();
                for i in 0..5 {
                    let slug = format!("race-{}-{}", t, i);
                    ids.push(
                        s.product_create(&product_form(&slug, &slug, "sele-kilifi", bid))
                            .unwrap(),
                    );
                }
                ids
            }));
        }

        let mut all: Vec<i64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), total);
    }

    #[test]
    fn product_public_listing_hides_inactive_and_filters() {
        let s = test_store();
        let bid = s.brand_create(&brand_form("Filt", "filt")).unwrap();
        let active = s
            .product_create(&product_form("Act", "filt-act", "sele-kilifi", bid))
            .unwrap();
        let hidden = s
            .product_create(&product_form("Hid", "filt-hid", "sele-kilifi", bid))
            .unwrap();
        s.product_update(
            hidden,
            &ProductPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let public = s.product_list_public(None, None);
        assert!(public.iter().any(|p| p.id == active));
        assert!(!public.iter().any(|p| p.id == hidden));
        assert!(s.product_list_admin().iter().any(|p| p.id == hidden));

        let by_brand = s.product_list_public(None, Some("filt"));
        assert_eq!(by_brand.len(), 1);
        assert_eq!(by_brand[0].id, active);

        let by_cat = s.product_list_public(Some("vites-sweatshirt"), None);
        assert!(by_cat.iter().all(|p| p.category == "vites-sweatshirt"));
    }

    #[test]
    fn product_public_listing_orders_by_sort_then_insertion() {
        let s = test_store();
        let bid = s.brand_create(&brand_form("Ord", "ord")).unwrap();
        let late = s
            .product_create(&ProductForm {
                sort_order: Some(1),
                ..product_form("Late", "ord-late", "sele-kilifi", bid)
            })
            .unwrap();
        let early = s
            .product_create(&ProductForm {
                sort_order: Some(1),
                ..product_form("Early", "ord-early", "sele-kilifi", bid)
            })
            .unwrap();
        let first = s
            .product_create(&ProductForm {
                sort_order: Some(0),
                ..product_form("First", "ord-first", "sele-kilifi", bid)
            })
            .unwrap();

        let ids: Vec<i64> = s
            .product_list_public(None, Some("ord"))
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![first, late, early]);
    }

    #[test]
    fn product_partial_update_touches_only_given_fields() {
        let s = test_store();
        let bid = s.brand_create(&brand_form("Up", "up")).unwrap();
        let id = s
            .product_create(&product_form("Before", "up-p", "sele-kilifi", bid))
            .unwrap();

        s.product_update(
            id,
            &ProductPatch {
                title: Some("After".to_string()),
                price: Some(10.0),
                ..Default::default()
            },
        )
        .unwrap();

        let p = s.product_get_by_id(id).unwrap();
        assert_eq!(p.title, "After");
        assert_eq!(p.price, 10.0);
        assert_eq!(p.slug, "up-p");
        assert_eq!(p.category, "sele-kilifi");
    }

    #[test]
    fn product_invariants_enforced_at_storage_layer() {
        let s = test_store();
        let bid = s.brand_create(&brand_form("Inv", "inv")).unwrap();

        let negative = ProductForm {
            price: Some(-1.0),
            ..product_form("Neg", "inv-neg", "sele-kilifi", bid)
        };
        assert!(matches!(
            s.product_create(&negative),
            Err(StoreError::Validation(_))
        ));

        let bad_badge = ProductForm {
            badge_type: Some("mega".to_string()),
            ..product_form("Bad", "inv-bad", "sele-kilifi", bid)
        };
        assert!(matches!(
            s.product_create(&bad_badge),
            Err(StoreError::Validation(_))
        ));

        // empty badge_type is "no badge", not an error
        let no_badge = ProductForm {
            badge_type: Some("".to_string()),
            ..product_form("None", "inv-none", "sele-kilifi", bid)
        };
        let id = s.product_create(&no_badge).unwrap();
        assert_eq!(s.product_get_by_id(id).unwrap().badge_type, None);
    }

    #[test]
    fn product_update_missing_id_is_not_found() {
        let s = test_store();
        assert!(matches!(
            s.product_update(424242, &ProductPatch::default()),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            s.product_delete(424242),
            Err(StoreError::NotFound)
        ));
    }

    // ── Showcase ────────────────────────────────────────────────────

    #[test]
    fn showcase_resolution_skips_holes_dangling_and_inactive() {
        let s = test_store();
        // seeded products 1..=10 exist; 9999 does not, 0 is a hole
        s.setting_set("showcase_sele", "[5, 0, 3, 9999, 2]").unwrap();

        let resolved = showcase::resolve(&s, "showcase_sele");
        let ids: Vec<i64> = resolved.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![5, 3, 2]);
    }

    #[test]
    fn showcase_resolution_skips_inactive_products() {
        let s = test_store();
        s.product_update(
            3,
            &ProductPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        s.setting_set("showcase_sele", "[5, 3, 2]").unwrap();

        let ids: Vec<i64> = showcase::resolve(&s, "showcase_sele")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![5, 2]);
    }

    #[test]
    fn showcase_resolution_caps_at_five() {
        let s = test_store();
        s.setting_set("showcase_sele", "[1,2,3,4,5,6,7]").unwrap();
        assert_eq!(showcase::resolve(&s, "showcase_sele").len(), 5);
    }

    #[test]
    fn showcase_resolution_never_errors_on_bad_input() {
        let s = test_store();
        s.setting_set("showcase_sele", "not json").unwrap();
        assert!(showcase::resolve(&s, "showcase_sele").is_empty());
        assert!(showcase::resolve(&s, "showcase_missing_key").is_empty());
    }

    #[test]
    fn showcase_reset_and_assign_reports_failures() {
        let s = test_store();
        s.setting_set("showcase_sele", "[5, 0, 3, 9999]").unwrap();
        s.setting_set("showcase_vites", "[7]").unwrap();

        let outcome = showcase::reset_and_assign(&s).unwrap();
        assert_eq!(outcome.applied, 3);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].product_id, 9999);
        assert_eq!(outcome.failed[0].position, 4);

        // 1-indexed positions, holes keep their slot
        let p5 = s.product_get_by_id(5).unwrap();
        assert!(p5.is_showcase);
        assert_eq!(p5.showcase_order, 1);
        let p3 = s.product_get_by_id(3).unwrap();
        assert_eq!(p3.showcase_order, 3);
        let p7 = s.product_get_by_id(7).unwrap();
        assert_eq!(p7.showcase_order, 1);

        // everything not assigned was cleared
        let p1 = s.product_get_by_id(1).unwrap();
        assert!(!p1.is_showcase);
    }

    #[test]
    fn showcase_rerun_clears_stale_flags() {
        let s = test_store();
        s.setting_set("showcase_sele", "[1, 2]").unwrap();
        showcase::reset_and_assign(&s).unwrap();
        assert!(s.product_get_by_id(2).unwrap().is_showcase);

        s.setting_set("showcase_sele", "[1]").unwrap();
        showcase::reset_and_assign(&s).unwrap();
        assert!(s.product_get_by_id(1).unwrap().is_showcase);
        assert!(!s.product_get_by_id(2).unwrap().is_showcase);
    }

    // ── SEO content ─────────────────────────────────────────────────

    #[test]
    fn seo_crud() {
        let s = test_store();
        let id = s
            .seo_create(&SeoForm {
                title: "Soru".to_string(),
                content: "Cevap".to_string(),
                sort_order: None,
            })
            .unwrap();

        let item = s.seo_get_by_id(id).unwrap();
        assert_eq!(item.title, "Soru");
        assert!(item.is_active);

        s.seo_update(
            id,
            &SeoPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(!s.seo_list_public().iter().any(|i| i.id == id));
        assert!(s.seo_list_admin().iter().any(|i| i.id == id));

        s.seo_delete(id).unwrap();
        assert!(s.seo_get_by_id(id).is_none());
    }

    // ── Admin account ───────────────────────────────────────────────

    #[test]
    fn admin_credentials_update_and_lookup() {
        let s = test_store();
        let admin = s.admin_get_by_username("admin").unwrap();
        let hash = bcrypt::hash("yeni-sifre", 4).unwrap();
        s.admin_update_credentials(admin.id, "utku", &hash).unwrap();

        assert!(s.admin_get_by_username("admin").is_none());
        let renamed = s.admin_get_by_username("utku").unwrap();
        assert_eq!(renamed.id, admin.id);
        assert!(bcrypt::verify("yeni-sifre", &renamed.password_hash).unwrap());
    }
}
