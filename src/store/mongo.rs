use std::collections::HashMap;

use log::error;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, IndexOptions, ReturnDocument, UpdateOptions};
use mongodb::sync::{Client, Database};
use mongodb::IndexModel;

use crate::models::admin_user::AdminUser;
use crate::models::brand::{Brand, BrandForm, BrandPatch};
use crate::models::category::{Category, CategoryForm, CategoryPatch};
use crate::models::product::{self, Product, ProductForm, ProductPatch};
use crate::models::seo::{SeoForm, SeoItem, SeoPatch};
use crate::showcase::{ShowcaseAssignment, ShowcaseFailure, ShowcaseOutcome};

use super::{Store, StoreError};

/// MongoDB-backed implementation of the Store trait.
///
/// One document per row, keyed by the stringified integer id (`_id`),
/// mirroring the relational schema. A `counters` collection emulates
/// auto-increment: `{_id: <entity>, last_id}` bumped atomically.
pub struct MongoStore {
    db: Database,
}

fn map_err(e: mongodb::error::Error) -> StoreError {
    use mongodb::error::{ErrorKind, WriteFailure};
    match *e.kind {
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == 11000 => {
            StoreError::Duplicate
        }
        _ => StoreError::Storage(e.to_string()),
    }
}

fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ── Document field readers ──────────────────────────────────────────
// Numeric fields may come back as Int32, Int64, or Double depending on
// which client wrote them; read them permissively.

fn get_i64(d: &Document, key: &str) -> i64 {
    match d.get(key) {
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Int32(v)) => i64::from(*v),
        Some(Bson::Double(v)) => *v as i64,
        _ => 0,
    }
}

fn get_opt_i64(d: &Document, key: &str) -> Option<i64> {
    match d.get(key) {
        Some(Bson::Int64(v)) => Some(*v),
        Some(Bson::Int32(v)) => Some(i64::from(*v)),
        Some(Bson::Double(v)) => Some(*v as i64),
        _ => None,
    }
}

fn get_f64(d: &Document, key: &str) -> f64 {
    match d.get(key) {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int64(v)) => *v as f64,
        Some(Bson::Int32(v)) => f64::from(*v),
        _ => 0.0,
    }
}

fn get_str(d: &Document, key: &str) -> String {
    d.get_str(key).unwrap_or_default().to_string()
}

fn get_opt_str(d: &Document, key: &str) -> Option<String> {
    match d.get(key) {
        Some(Bson::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn get_flag(d: &Document, key: &str) -> bool {
    match d.get(key) {
        Some(Bson::Boolean(b)) => *b,
        _ => get_i64(d, key) != 0,
    }
}

fn brand_from_doc(d: &Document) -> Brand {
    Brand {
        id: get_i64(d, "id"),
        name: get_str(d, "name"),
        slug: get_str(d, "slug"),
        description: get_str(d, "description"),
        logo_url: get_str(d, "logo_url"),
        is_active: get_flag(d, "is_active"),
        sort_order: get_i64(d, "sort_order"),
        created_at: get_str(d, "created_at"),
        product_count: None,
    }
}

fn category_from_doc(d: &Document) -> Category {
    Category {
        id: get_i64(d, "id"),
        name: get_str(d, "name"),
        slug: get_str(d, "slug"),
        description: get_str(d, "description"),
        is_active: get_flag(d, "is_active"),
        sort_order: get_i64(d, "sort_order"),
        created_at: get_str(d, "created_at"),
        product_count: None,
    }
}

fn product_from_doc(d: &Document) -> Product {
    Product {
        id: get_i64(d, "id"),
        title: get_str(d, "title"),
        slug: get_str(d, "slug"),
        description: get_str(d, "description"),
        price: get_f64(d, "price"),
        category: get_str(d, "category"),
        brand_id: get_opt_i64(d, "brand_id"),
        brand_name: None,
        brand_slug: None,
        image_url: get_str(d, "image_url"),
        extra_images: get_opt_str(d, "extra_images"),
        badge: get_str(d, "badge"),
        badge_type: get_opt_str(d, "badge_type"),
        shopier_link: get_str(d, "shopier_link"),
        trendyol_link: get_str(d, "trendyol_link"),
        is_active: get_flag(d, "is_active"),
        is_showcase: get_flag(d, "is_showcase"),
        showcase_order: get_i64(d, "showcase_order"),
        sort_order: get_i64(d, "sort_order"),
        created_at: get_str(d, "created_at"),
        updated_at: get_str(d, "updated_at"),
    }
}

fn seo_from_doc(d: &Document) -> SeoItem {
    SeoItem {
        id: get_i64(d, "id"),
        title: get_str(d, "title"),
        content: get_str(d, "content"),
        is_active: get_flag(d, "is_active"),
        sort_order: get_i64(d, "sort_order"),
        created_at: get_str(d, "created_at"),
        updated_at: get_str(d, "updated_at"),
    }
}

fn admin_from_doc(d: &Document) -> AdminUser {
    AdminUser {
        id: get_i64(d, "id"),
        username: get_str(d, "username"),
        password_hash: get_str(d, "password_hash"),
        created_at: get_str(d, "created_at"),
    }
}

impl MongoStore {
    /// Connect to the given URI and database name.
    pub fn new(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let client_options = ClientOptions::parse(uri).map_err(map_err)?;
        let client = Client::with_options(client_options).map_err(map_err)?;
        let db = client.database(db_name);
        Ok(Self { db })
    }

    /// Ping the server so a bad URI fails at startup, not mid-request.
    pub fn test_connection(&self) -> Result<(), StoreError> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .map_err(|e| StoreError::Storage(format!("MongoDB connection test failed: {}", e)))?;
        Ok(())
    }

    /// Next auto-increment id for a collection. The counter document is
    /// bumped with an atomic `$inc` inside find_one_and_update, so two
    /// concurrent creators can never receive the same id.
    fn next_id(&self, collection_name: &str) -> Result<i64, StoreError> {
        let counters = self.db.collection::<Document>("counters");
        let filter = doc! { "_id": collection_name };
        let update = doc! { "$inc": { "last_id": 1_i64 } };
        let opts = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let result = counters
            .find_one_and_update(filter, update, opts)
            .map_err(map_err)?;
        match result {
            Some(d) => Ok(get_i64(&d, "last_id")),
            None => Err(StoreError::Storage(
                "counter document missing after upsert".to_string(),
            )),
        }
    }

    fn unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut keys = Document::new();
        keys.insert(field, 1_i32);
        self.db
            .collection::<Document>(collection)
            .create_index(
                IndexModel::builder()
                    .keys(keys)
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
                None,
            )
            .map_err(map_err)?;
        Ok(())
    }

    fn plain_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut keys = Document::new();
        keys.insert(field, 1_i32);
        self.db
            .collection::<Document>(collection)
            .create_index(IndexModel::builder().keys(keys).build(), None)
            .map_err(map_err)?;
        Ok(())
    }

    fn all_docs(&self, collection: &str) -> Vec<Document> {
        let coll = self.db.collection::<Document>(collection);
        match coll.find(None, None) {
            Ok(cursor) => cursor.filter_map(|r| r.ok()).collect(),
            Err(e) => {
                error!("mongo find on {} failed: {}", collection, e);
                vec![]
            }
        }
    }

    fn find_doc(&self, collection: &str, filter: Document) -> Option<Document> {
        self.db
            .collection::<Document>(collection)
            .find_one(filter, None)
            .ok()
            .flatten()
    }

    /// Brand id → (name, slug) lookup used to join products in memory,
    /// the same way the admin dashboard's backing API does it.
    fn brand_map(&self) -> HashMap<i64, (String, String)> {
        self.all_docs("brands")
            .iter()
            .map(|d| (get_i64(d, "id"), (get_str(d, "name"), get_str(d, "slug"))))
            .collect()
    }

    fn attach_brand(&self, mut p: Product, brands: &HashMap<i64, (String, String)>) -> Product {
        if let Some(bid) = p.brand_id {
            if let Some((name, slug)) = brands.get(&bid) {
                p.brand_name = Some(name.clone());
                p.brand_slug = Some(slug.clone());
            }
        }
        p
    }

    fn product_with_brand(&self, d: &Document) -> Product {
        let p = product_from_doc(d);
        match p.brand_id {
            Some(bid) => {
                let brand = self.find_doc("brands", doc! { "id": bid });
                match brand {
                    Some(b) => {
                        let mut p = p;
                        p.brand_name = Some(get_str(&b, "name"));
                        p.brand_slug = Some(get_str(&b, "slug"));
                        p
                    }
                    None => p,
                }
            }
            None => p,
        }
    }
}

impl Store for MongoStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), StoreError> {
        self.unique_index("site_settings", "key")?;
        self.unique_index("admin_users", "username")?;
        self.unique_index("brands", "slug")?;
        self.unique_index("brands", "name")?;
        self.unique_index("categories", "slug")?;
        self.unique_index("categories", "name")?;
        self.unique_index("products", "slug")?;
        self.plain_index("products", "category")?;
        self.plain_index("products", "brand_id")?;
        Ok(())
    }

    fn seed_defaults(&self) -> Result<(), StoreError> {
        let settings = self.db.collection::<Document>("site_settings");
        for (key, value) in crate::db::default_settings() {
            let filter = doc! { "key": key };
            let update = doc! { "$setOnInsert": { "key": key, "value": value } };
            let opts = UpdateOptions::builder().upsert(true).build();
            settings.update_one(filter, update, opts).map_err(map_err)?;
        }

        // Token-signing secret, generated once per installation
        if self.setting_get("session_secret").is_none() {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            let bytes: [u8; 32] = rng.gen();
            self.setting_set("session_secret", &hex::encode(bytes))?;
        }

        let admins = self.db.collection::<Document>("admin_users");
        let admin_count = admins.count_documents(None, None).map_err(map_err)?;
        if admin_count == 0 {
            let hash = bcrypt::hash(crate::db::DEFAULT_ADMIN_PASSWORD, bcrypt::DEFAULT_COST)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            let id = self.next_id("admin_users")?;
            admins
                .insert_one(
                    doc! {
                        "_id": id.to_string(),
                        "id": id,
                        "username": crate::db::DEFAULT_ADMIN_USERNAME,
                        "password_hash": hash,
                        "created_at": now_stamp(),
                    },
                    None,
                )
                .map_err(map_err)?;
        }

        let brands = self.db.collection::<Document>("brands");
        let default_brand_id;
        let brand_count = brands.count_documents(None, None).map_err(map_err)?;
        if brand_count == 0 {
            let id = self.next_id("brands")?;
            brands
                .insert_one(
                    doc! {
                        "_id": id.to_string(),
                        "id": id,
                        "name": "Utku Giyim",
                        "slug": "utku-giyim",
                        "description": "Premium motosiklet aksesuarları ve vites sweatshirtleri.",
                        "logo_url": "",
                        "is_active": 1_i64,
                        "sort_order": 1_i64,
                        "created_at": now_stamp(),
                    },
                    None,
                )
                .map_err(map_err)?;
            default_brand_id = id;
        } else {
            default_brand_id = self
                .all_docs("brands")
                .first()
                .map(|d| get_i64(d, "id"))
                .unwrap_or(1);
        }

        let categories = self.db.collection::<Document>("categories");
        if categories.count_documents(None, None).map_err(map_err)? == 0 {
            for (name, slug, description, order) in [
                ("Sele Kılıfı", "sele-kilifi", "Motosiklet sele kılıfları", 1_i64),
                (
                    "Vites Sweatshirt",
                    "vites-sweatshirt",
                    "Vites temalı sweatshirtler",
                    2_i64,
                ),
            ] {
                let id = self.next_id("categories")?;
                categories
                    .insert_one(
                        doc! {
                            "_id": id.to_string(),
                            "id": id,
                            "name": name,
                            "slug": slug,
                            "description": description,
                            "is_active": 1_i64,
                            "sort_order": order,
                            "created_at": now_stamp(),
                        },
                        None,
                    )
                    .map_err(map_err)?;
            }
        }

        let products = self.db.collection::<Document>("products");
        if products.count_documents(None, None).map_err(map_err)? == 0 {
            for (i, (title, slug, description, price, category, badge, badge_type)) in
                crate::db::default_products().into_iter().enumerate()
            {
                let id = self.next_id("products")?;
                let badge_type_bson = match badge_type {
                    Some(bt) => Bson::String(bt.to_string()),
                    None => Bson::Null,
                };
                products
                    .insert_one(
                        doc! {
                            "_id": id.to_string(),
                            "id": id,
                            "title": title,
                            "slug": slug,
                            "description": description,
                            "price": price,
                            "category": category,
                            "brand_id": default_brand_id,
                            "image_url": format!("/images/products/{}.webp", slug),
                            "extra_images": Bson::Null,
                            "badge": badge,
                            "badge_type": badge_type_bson,
                            "shopier_link": "",
                            "trendyol_link": "",
                            "is_active": 1_i64,
                            "is_showcase": 0_i64,
                            "showcase_order": 1_i64,
                            "sort_order": (i % 5) as i64 + 1,
                            "created_at": now_stamp(),
                            "updated_at": now_stamp(),
                        },
                        None,
                    )
                    .map_err(map_err)?;
            }
        }

        let seo = self.db.collection::<Document>("seo_content");
        if seo.count_documents(None, None).map_err(map_err)? == 0 {
            for (i, (title, content)) in crate::db::default_seo_items().into_iter().enumerate() {
                let id = self.next_id("seo_content")?;
                seo.insert_one(
                    doc! {
                        "_id": id.to_string(),
                        "id": id,
                        "title": title,
                        "content": content,
                        "is_active": 1_i64,
                        "sort_order": i as i64 + 1,
                        "created_at": now_stamp(),
                        "updated_at": now_stamp(),
                    },
                    None,
                )
                .map_err(map_err)?;
            }
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }

    // ── Settings ────────────────────────────────────────────────────

    fn setting_get(&self, key: &str) -> Option<String> {
        let d = self.find_doc("site_settings", doc! { "key": key })?;
        d.get_str("value").ok().map(|s| s.to_string())
    }

    fn setting_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        // One document per key; writing one key never touches another.
        let coll = self.db.collection::<Document>("site_settings");
        let opts = UpdateOptions::builder().upsert(true).build();
        coll.update_one(
            doc! { "key": key },
            doc! { "$set": { "key": key, "value": value } },
            opts,
        )
        .map_err(map_err)?;
        Ok(())
    }

    fn setting_all(&self) -> HashMap<String, String> {
        self.all_docs("site_settings")
            .iter()
            .map(|d| (get_str(d, "key"), get_str(d, "value")))
            .collect()
    }

    // ── Brands ──────────────────────────────────────────────────────

    fn brand_list_public(&self) -> Vec<Brand> {
        let mut brands: Vec<Brand> = self
            .all_docs("brands")
            .iter()
            .map(brand_from_doc)
            .filter(|b| b.is_active)
            .collect();
        brands.sort_by_key(|b| (b.sort_order, b.id));
        brands
    }

    fn brand_list_admin(&self) -> Vec<Brand> {
        let products = self.db.collection::<Document>("products");
        let mut brands: Vec<Brand> = self.all_docs("brands").iter().map(brand_from_doc).collect();
        brands.sort_by_key(|b| (b.sort_order, b.id));
        for b in &mut brands {
            let count = products
                .count_documents(doc! { "brand_id": b.id }, None)
                .unwrap_or(0);
            b.product_count = Some(count as i64);
        }
        brands
    }

    fn brand_get_by_id(&self, id: i64) -> Option<Brand> {
        self.find_doc("brands", doc! { "id": id })
            .map(|d| brand_from_doc(&d))
    }

    fn brand_get_by_slug(&self, slug: &str) -> Option<Brand> {
        self.find_doc("brands", doc! { "slug": slug })
            .map(|d| brand_from_doc(&d))
    }

    fn brand_create(&self, form: &BrandForm) -> Result<i64, StoreError> {
        let id = self.next_id("brands")?;
        self.db
            .collection::<Document>("brands")
            .insert_one(
                doc! {
                    "_id": id.to_string(),
                    "id": id,
                    "name": form.name.as_str(),
                    "slug": form.slug.as_str(),
                    "description": form.description.as_deref().unwrap_or(""),
                    "logo_url": form.logo_url.as_deref().unwrap_or(""),
                    "is_active": 1_i64,
                    "sort_order": form.sort_order.unwrap_or(0),
                    "created_at": now_stamp(),
                },
                None,
            )
            .map_err(map_err)?;
        Ok(id)
    }

    fn brand_update(&self, id: i64, patch: &BrandPatch) -> Result<(), StoreError> {
        let mut set = Document::new();
        if let Some(v) = &patch.name {
            set.insert("name", v.as_str());
        }
        if let Some(v) = &patch.slug {
            set.insert("slug", v.as_str());
        }
        if let Some(v) = &patch.description {
            set.insert("description", v.as_str());
        }
        if let Some(v) = &patch.logo_url {
            set.insert("logo_url", v.as_str());
        }
        if let Some(v) = patch.is_active {
            set.insert("is_active", v as i64);
        }
        if let Some(v) = patch.sort_order {
            set.insert("sort_order", v);
        }
        if set.is_empty() {
            return match self.brand_get_by_id(id) {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound),
            };
        }

        let result = self
            .db
            .collection::<Document>("brands")
            .update_one(doc! { "id": id }, doc! { "$set": set }, None)
            .map_err(map_err)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn brand_delete(&self, id: i64) -> Result<(), StoreError> {
        // Detach referencing products first, then drop the brand.
        self.db
            .collection::<Document>("products")
            .update_many(
                doc! { "brand_id": id },
                doc! { "$set": { "brand_id": Bson::Null } },
                None,
            )
            .map_err(map_err)?;
        let result = self
            .db
            .collection::<Document>("brands")
            .delete_one(doc! { "id": id }, None)
            .map_err(map_err)?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ── Categories ──────────────────────────────────────────────────

    fn category_list_public(&self) -> Vec<Category> {
        let mut cats: Vec<Category> = self
            .all_docs("categories")
            .iter()
            .map(category_from_doc)
            .filter(|c| c.is_active)
            .collect();
        cats.sort_by_key(|c| (c.sort_order, c.id));
        cats
    }

    fn category_list_admin(&self) -> Vec<Category> {
        let products = self.db.collection::<Document>("products");
        let mut cats: Vec<Category> = self
            .all_docs("categories")
            .iter()
            .map(category_from_doc)
            .collect();
        cats.sort_by_key(|c| (c.sort_order, c.id));
        for c in &mut cats {
            let count = products
                .count_documents(doc! { "category": c.slug.as_str() }, None)
                .unwrap_or(0);
            c.product_count = Some(count as i64);
        }
        cats
    }

    fn category_get_by_id(&self, id: i64) -> Option<Category> {
        self.find_doc("categories", doc! { "id": id })
            .map(|d| category_from_doc(&d))
    }

    fn category_get_by_slug(&self, slug: &str) -> Option<Category> {
        self.find_doc("categories", doc! { "slug": slug })
            .map(|d| category_from_doc(&d))
    }

    fn category_create(&self, form: &CategoryForm) -> Result<i64, StoreError> {
        let id = self.next_id("categories")?;
        self.db
            .collection::<Document>("categories")
            .insert_one(
                doc! {
                    "_id": id.to_string(),
                    "id": id,
                    "name": form.name.as_str(),
                    "slug": form.slug.as_str(),
                    "description": form.description.as_deref().unwrap_or(""),
                    "is_active": 1_i64,
                    "sort_order": form.sort_order.unwrap_or(0),
                    "created_at": now_stamp(),
                },
                None,
            )
            .map_err(map_err)?;
        Ok(id)
    }

    fn category_update(&self, id: i64, patch: &CategoryPatch) -> Result<(), StoreError> {
        let mut set = Document::new();
        if let Some(v) = &patch.name {
            set.insert("name", v.as_str());
        }
        if let Some(v) = &patch.slug {
            set.insert("slug", v.as_str());
        }
        if let Some(v) = &patch.description {
            set.insert("description", v.as_str());
        }
        if let Some(v) = patch.is_active {
            set.insert("is_active", v as i64);
        }
        if let Some(v) = patch.sort_order {
            set.insert("sort_order", v);
        }
        if set.is_empty() {
            return match self.category_get_by_id(id) {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound),
            };
        }

        let result = self
            .db
            .collection::<Document>("categories")
            .update_one(doc! { "id": id }, doc! { "$set": set }, None)
            .map_err(map_err)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn category_delete(&self, id: i64) -> Result<(), StoreError> {
        let result = self
            .db
            .collection::<Document>("categories")
            .delete_one(doc! { "id": id }, None)
            .map_err(map_err)?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ── Products ────────────────────────────────────────────────────

    fn product_list_public(
        &self,
        category: Option<&str>,
        brand_slug: Option<&str>,
    ) -> Vec<Product> {
        // In-memory filter and sort, joined against one brand fetch.
        let brands = self.brand_map();
        let mut products: Vec<Product> = self
            .all_docs("products")
            .iter()
            .map(product_from_doc)
            .filter(|p| p.is_active)
            .map(|p| self.attach_brand(p, &brands))
            .collect();
        if let Some(c) = category {
            products.retain(|p| p.category == c);
        }
        if let Some(b) = brand_slug {
            products.retain(|p| p.brand_slug.as_deref() == Some(b));
        }
        products.sort_by_key(|p| (p.sort_order, p.id));
        products
    }

    fn product_list_admin(&self) -> Vec<Product> {
        let brands = self.brand_map();
        let mut products: Vec<Product> = self
            .all_docs("products")
            .iter()
            .map(product_from_doc)
            .map(|p| self.attach_brand(p, &brands))
            .collect();
        products.sort_by(|a, b| {
            (a.category.as_str(), a.sort_order, a.id).cmp(&(b.category.as_str(), b.sort_order, b.id))
        });
        products
    }

    fn product_get_by_id(&self, id: i64) -> Option<Product> {
        self.find_doc("products", doc! { "id": id })
            .map(|d| self.product_with_brand(&d))
    }

    fn product_get_by_slug(&self, slug: &str) -> Option<Product> {
        self.find_doc("products", doc! { "slug": slug })
            .map(|d| self.product_with_brand(&d))
    }

    fn product_create(&self, form: &ProductForm) -> Result<i64, StoreError> {
        let badge_type = product::normalize_badge_type(form.badge_type.as_deref());
        let price = form.price.unwrap_or(0.0);
        product::check_invariants(price, badge_type.as_deref())?;

        let id = self.next_id("products")?;
        let badge_type_bson = match badge_type {
            Some(bt) => Bson::String(bt),
            None => Bson::Null,
        };
        let extra_images_bson = match &form.extra_images {
            Some(v) => Bson::String(v.clone()),
            None => Bson::Null,
        };
        let brand_id_bson = match form.brand_id {
            Some(b) => Bson::Int64(b),
            None => Bson::Null,
        };
        self.db
            .collection::<Document>("products")
            .insert_one(
                doc! {
                    "_id": id.to_string(),
                    "id": id,
                    "title": form.title.as_str(),
                    "slug": form.slug.as_str(),
                    "description": form.description.as_deref().unwrap_or(""),
                    "price": price,
                    "category": form.category.as_str(),
                    "brand_id": brand_id_bson,
                    "image_url": form.image_url.as_deref().unwrap_or(""),
                    "extra_images": extra_images_bson,
                    "badge": form.badge.as_deref().unwrap_or(""),
                    "badge_type": badge_type_bson,
                    "shopier_link": form.shopier_link.as_deref().unwrap_or(""),
                    "trendyol_link": form.trendyol_link.as_deref().unwrap_or(""),
                    "is_active": 1_i64,
                    "is_showcase": 0_i64,
                    "showcase_order": 1_i64,
                    "sort_order": form.sort_order.unwrap_or(0),
                    "created_at": now_stamp(),
                    "updated_at": now_stamp(),
                },
                None,
            )
            .map_err(map_err)?;
        Ok(id)
    }

    fn product_update(&self, id: i64, patch: &ProductPatch) -> Result<(), StoreError> {
        if let Some(price) = patch.price {
            product::check_invariants(price, None)?;
        }
        let badge_type = patch
            .badge_type
            .as_deref()
            .map(|raw| product::normalize_badge_type(Some(raw)));
        if let Some(Some(bt)) = &badge_type {
            product::check_invariants(0.0, Some(bt.as_str()))?;
        }

        let mut set = Document::new();
        if let Some(v) = &patch.title {
            set.insert("title", v.as_str());
        }
        if let Some(v) = &patch.slug {
            set.insert("slug", v.as_str());
        }
        if let Some(v) = &patch.description {
            set.insert("description", v.as_str());
        }
        if let Some(v) = patch.price {
            set.insert("price", v);
        }
        if let Some(v) = &patch.category {
            set.insert("category", v.as_str());
        }
        if let Some(v) = patch.brand_id {
            set.insert("brand_id", v);
        }
        if let Some(v) = &patch.image_url {
            set.insert("image_url", v.as_str());
        }
        if let Some(v) = &patch.extra_images {
            set.insert("extra_images", v.as_str());
        }
        if let Some(v) = &patch.badge {
            set.insert("badge", v.as_str());
        }
        if let Some(v) = badge_type {
            match v {
                Some(bt) => set.insert("badge_type", bt),
                None => set.insert("badge_type", Bson::Null),
            };
        }
        if let Some(v) = &patch.shopier_link {
            set.insert("shopier_link", v.as_str());
        }
        if let Some(v) = &patch.trendyol_link {
            set.insert("trendyol_link", v.as_str());
        }
        if let Some(v) = patch.is_active {
            set.insert("is_active", v as i64);
        }
        if let Some(v) = patch.sort_order {
            set.insert("sort_order", v);
        }
        if set.is_empty() {
            return match self.product_get_by_id(id) {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound),
            };
        }
        set.insert("updated_at", now_stamp());

        let result = self
            .db
            .collection::<Document>("products")
            .update_one(doc! { "id": id }, doc! { "$set": set }, None)
            .map_err(map_err)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn product_delete(&self, id: i64) -> Result<(), StoreError> {
        let result = self
            .db
            .collection::<Document>("products")
            .delete_one(doc! { "id": id }, None)
            .map_err(map_err)?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    /// No multi-document transaction here: the clear phase runs fully
    /// before the assign phase, and every assignment that does not apply
    /// ends up in the report instead of being silently skipped.
    fn showcase_reset_and_assign(
        &self,
        assignments: &[ShowcaseAssignment],
    ) -> Result<ShowcaseOutcome, StoreError> {
        let products = self.db.collection::<Document>("products");

        let cleared = products
            .update_many(
                doc! {},
                doc! { "$set": { "is_showcase": 0_i64, "showcase_order": 1_i64 } },
                None,
            )
            .map_err(map_err)?
            .modified_count as usize;

        let mut applied = 0usize;
        let mut failed: Vec<ShowcaseFailure> = Vec::new();
        for a in assignments {
            let result = products.update_one(
                doc! { "id": a.product_id },
                doc! { "$set": { "is_showcase": 1_i64, "showcase_order": a.position } },
                None,
            );
            match result {
                Ok(r) if r.matched_count > 0 => applied += 1,
                Ok(_) => failed.push(ShowcaseFailure {
                    product_id: a.product_id,
                    position: a.position,
                    list: a.list.clone(),
                    error: "ürün bulunamadı".to_string(),
                }),
                Err(e) => {
                    error!("showcase assign {} failed: {}", a.product_id, e);
                    failed.push(ShowcaseFailure {
                        product_id: a.product_id,
                        position: a.position,
                        list: a.list.clone(),
                        error: "güncelleme başarısız".to_string(),
                    });
                }
            }
        }

        Ok(ShowcaseOutcome {
            cleared,
            applied,
            failed,
        })
    }

    // ── SEO content ─────────────────────────────────────────────────

    fn seo_list_public(&self) -> Vec<SeoItem> {
        let mut items: Vec<SeoItem> = self
            .all_docs("seo_content")
            .iter()
            .map(seo_from_doc)
            .filter(|s| s.is_active)
            .collect();
        items.sort_by_key(|s| (s.sort_order, s.id));
        items
    }

    fn seo_list_admin(&self) -> Vec<SeoItem> {
        let mut items: Vec<SeoItem> = self
            .all_docs("seo_content")
            .iter()
            .map(seo_from_doc)
            .collect();
        items.sort_by_key(|s| (s.sort_order, s.id));
        items
    }

    fn seo_get_by_id(&self, id: i64) -> Option<SeoItem> {
        self.find_doc("seo_content", doc! { "id": id })
            .map(|d| seo_from_doc(&d))
    }

    fn seo_create(&self, form: &SeoForm) -> Result<i64, StoreError> {
        let id = self.next_id("seo_content")?;
        self.db
            .collection::<Document>("seo_content")
            .insert_one(
                doc! {
                    "_id": id.to_string(),
                    "id": id,
                    "title": form.title.as_str(),
                    "content": form.content.as_str(),
                    "is_active": 1_i64,
                    "sort_order": form.sort_order.unwrap_or(0),
                    "created_at": now_stamp(),
                    "updated_at": now_stamp(),
                },
                None,
            )
            .map_err(map_err)?;
        Ok(id)
    }

    fn seo_update(&self, id: i64, patch: &SeoPatch) -> Result<(), StoreError> {
        let mut set = Document::new();
        if let Some(v) = &patch.title {
            set.insert("title", v.as_str());
        }
        if let Some(v) = &patch.content {
            set.insert("content", v.as_str());
        }
        if let Some(v) = patch.is_active {
            set.insert("is_active", v as i64);
        }
        if let Some(v) = patch.sort_order {
            set.insert("sort_order", v);
        }
        if set.is_empty() {
            return match self.seo_get_by_id(id) {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound),
            };
        }
        set.insert("updated_at", now_stamp());

        let result = self
            .db
            .collection::<Document>("seo_content")
            .update_one(doc! { "id": id }, doc! { "$set": set }, None)
            .map_err(map_err)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    fn seo_delete(&self, id: i64) -> Result<(), StoreError> {
        let result = self
            .db
            .collection::<Document>("seo_content")
            .delete_one(doc! { "id": id }, None)
            .map_err(map_err)?;
        if result.deleted_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    // ── Admin account ───────────────────────────────────────────────

    fn admin_get_by_id(&self, id: i64) -> Option<AdminUser> {
        self.find_doc("admin_users", doc! { "id": id })
            .map(|d| admin_from_doc(&d))
    }

    fn admin_get_by_username(&self, username: &str) -> Option<AdminUser> {
        self.find_doc("admin_users", doc! { "username": username })
            .map(|d| admin_from_doc(&d))
    }

    fn admin_count(&self) -> i64 {
        self.db
            .collection::<Document>("admin_users")
            .count_documents(None, None)
            .unwrap_or(0) as i64
    }

    fn admin_update_credentials(
        &self,
        id: i64,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let result = self
            .db
            .collection::<Document>("admin_users")
            .update_one(
                doc! { "id": id },
                doc! { "$set": { "username": username, "password_hash": password_hash } },
                None,
            )
            .map_err(map_err)?;
        if result.matched_count == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
