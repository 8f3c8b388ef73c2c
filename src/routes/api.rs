use std::collections::HashMap;
use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::State;
use serde_json::{json, Value};

use crate::auth::AdminSession;
use crate::models::brand::{BrandForm, BrandPatch};
use crate::models::category::{CategoryForm, CategoryPatch};
use crate::models::product::{ProductForm, ProductPatch};
use crate::models::seo::{SeoForm, SeoPatch};
use crate::models::settings;
use crate::routes::{ok_json, ApiError, ApiResult};
use crate::showcase;
use crate::store::Store;

fn field_str<'a>(body: &'a Value, key: &str) -> &'a str {
    body.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn parse_body<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|_| ApiError::bad_request("Geçersiz istek gövdesi."))
}

/// All settings minus the token-signing secret, which never leaves the
/// process.
fn public_settings(store: &dyn Store) -> HashMap<String, String> {
    let mut all = store.setting_all();
    all.remove("session_secret");
    all
}

// ── Products ────────────────────────────────────────────────────────

#[get("/products?<admin>&<category>&<brand>")]
pub fn products_index(
    admin: Option<bool>,
    category: Option<String>,
    brand: Option<String>,
    session: Option<AdminSession>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    if admin == Some(true) {
        if session.is_none() {
            return Err(ApiError::unauthorized("Yetkisiz erişim."));
        }
        return ok_json(json!(store.product_list_admin()));
    }

    let products = store.product_list_public(category.as_deref(), brand.as_deref());
    ok_json(json!(products))
}

#[post("/products", format = "json", data = "<body>")]
pub fn products_create(
    _session: AdminSession,
    body: Json<Value>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let body = body.into_inner();
    if field_str(&body, "title").is_empty()
        || field_str(&body, "slug").is_empty()
        || field_str(&body, "category").is_empty()
    {
        return Err(ApiError::bad_request("Başlık, slug ve kategori zorunludur."));
    }
    if body.get("brand_id").and_then(|v| v.as_i64()).is_none() {
        return Err(ApiError::bad_request("Marka bilgisi zorunludur."));
    }

    let form: ProductForm = parse_body(body)?;
    let id = store.product_create(&form)?;
    ok_json(json!({ "success": true, "id": id }))
}

#[get("/products/<id>")]
pub fn products_show(id: i64, store: &State<Arc<dyn Store>>) -> ApiResult {
    match store.product_get_by_id(id) {
        Some(product) => ok_json(json!(product)),
        None => Err(ApiError::new(
            rocket::http::Status::NotFound,
            "Ürün bulunamadı.",
        )),
    }
}

/// Detail lookup for the product page, which addresses by slug.
#[get("/products/slug/<slug>")]
pub fn products_show_by_slug(slug: &str, store: &State<Arc<dyn Store>>) -> ApiResult {
    match store.product_get_by_slug(slug) {
        Some(product) => ok_json(json!(product)),
        None => Err(ApiError::new(
            rocket::http::Status::NotFound,
            "Ürün bulunamadı.",
        )),
    }
}

#[put("/products/<id>", format = "json", data = "<body>")]
pub fn products_update(
    _session: AdminSession,
    id: i64,
    body: Json<Value>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let patch: ProductPatch = parse_body(body.into_inner())?;
    store.product_update(id, &patch)?;
    ok_json(json!({ "success": true }))
}

#[delete("/products/<id>")]
pub fn products_delete(
    _session: AdminSession,
    id: i64,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    store.product_delete(id)?;
    ok_json(json!({ "success": true }))
}

// ── Brands ──────────────────────────────────────────────────────────

#[get("/brands?<admin>")]
pub fn brands_index(
    admin: Option<bool>,
    session: Option<AdminSession>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    if admin == Some(true) {
        if session.is_none() {
            return Err(ApiError::unauthorized("Yetkisiz erişim."));
        }
        return ok_json(json!(store.brand_list_admin()));
    }
    ok_json(json!(store.brand_list_public()))
}

#[post("/brands", format = "json", data = "<body>")]
pub fn brands_create(
    _session: AdminSession,
    body: Json<Value>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let body = body.into_inner();
    if field_str(&body, "name").is_empty() || field_str(&body, "slug").is_empty() {
        return Err(ApiError::bad_request("İsim ve slug zorunlu."));
    }
    let form: BrandForm = parse_body(body)?;
    let id = store.brand_create(&form)?;
    ok_json(json!({ "success": true, "id": id }))
}

#[put("/brands", format = "json", data = "<body>")]
pub fn brands_update(
    _session: AdminSession,
    body: Json<Value>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let body = body.into_inner();
    let id = match body.get("id").and_then(|v| v.as_i64()) {
        Some(id) => id,
        None => return Err(ApiError::bad_request("ID zorunlu.")),
    };
    let patch: BrandPatch = parse_body(body)?;
    store.brand_update(id, &patch)?;
    ok_json(json!({ "success": true }))
}

#[delete("/brands?<id>")]
pub fn brands_delete(
    _session: AdminSession,
    id: Option<i64>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let id = match id {
        Some(id) if id > 0 => id,
        _ => return Err(ApiError::bad_request("ID zorunlu.")),
    };
    store.brand_delete(id)?;
    ok_json(json!({ "success": true }))
}

// ── Categories ──────────────────────────────────────────────────────

#[get("/categories?<admin>")]
pub fn categories_index(
    admin: Option<bool>,
    session: Option<AdminSession>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    if admin == Some(true) {
        if session.is_none() {
            return Err(ApiError::unauthorized("Yetkisiz."));
        }
        return ok_json(json!(store.category_list_admin()));
    }
    ok_json(json!(store.category_list_public()))
}

#[post("/categories", format = "json", data = "<body>")]
pub fn categories_create(
    _session: AdminSession,
    body: Json<Value>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let body = body.into_inner();
    if field_str(&body, "name").is_empty() || field_str(&body, "slug").is_empty() {
        return Err(ApiError::bad_request("İsim ve slug zorunlu."));
    }
    let form: CategoryForm = parse_body(body)?;
    let id = store.category_create(&form)?;
    ok_json(json!({ "success": true, "id": id }))
}

#[put("/categories", format = "json", data = "<body>")]
pub fn categories_update(
    _session: AdminSession,
    body: Json<Value>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let body = body.into_inner();
    let id = match body.get("id").and_then(|v| v.as_i64()) {
        Some(id) => id,
        None => return Err(ApiError::bad_request("ID zorunlu.")),
    };
    let patch: CategoryPatch = parse_body(body)?;
    store.category_update(id, &patch)?;
    ok_json(json!({ "success": true }))
}

#[delete("/categories?<id>")]
pub fn categories_delete(
    _session: AdminSession,
    id: Option<i64>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let id = match id {
        Some(id) if id > 0 => id,
        _ => return Err(ApiError::bad_request("ID zorunlu.")),
    };
    store.category_delete(id)?;
    ok_json(json!({ "success": true }))
}

// ── SEO content ─────────────────────────────────────────────────────

#[get("/seo-content?<admin>")]
pub fn seo_index(
    admin: Option<bool>,
    session: Option<AdminSession>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    if admin == Some(true) {
        if session.is_none() {
            return Err(ApiError::unauthorized("Yetkisiz erişim."));
        }
        return ok_json(json!(store.seo_list_admin()));
    }
    ok_json(json!(store.seo_list_public()))
}

#[post("/seo-content", format = "json", data = "<body>")]
pub fn seo_create(
    _session: AdminSession,
    body: Json<Value>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let body = body.into_inner();
    if field_str(&body, "title").is_empty() || field_str(&body, "content").is_empty() {
        return Err(ApiError::bad_request("Başlık ve içerik zorunludur."));
    }
    let form: SeoForm = parse_body(body)?;
    let id = store.seo_create(&form)?;
    ok_json(json!({ "success": true, "id": id }))
}

#[put("/seo-content", format = "json", data = "<body>")]
pub fn seo_update(
    _session: AdminSession,
    body: Json<Value>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let body = body.into_inner();
    let id = match body.get("id").and_then(|v| v.as_i64()) {
        Some(id) => id,
        None => return Err(ApiError::bad_request("ID zorunludur.")),
    };
    let patch: SeoPatch = parse_body(body)?;
    store.seo_update(id, &patch)?;
    ok_json(json!({ "success": true }))
}

#[delete("/seo-content?<id>")]
pub fn seo_delete(
    _session: AdminSession,
    id: Option<i64>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let id = match id {
        Some(id) if id > 0 => id,
        _ => return Err(ApiError::bad_request("ID zorunludur.")),
    };
    store.seo_delete(id)?;
    ok_json(json!({ "success": true }))
}

// ── Settings ────────────────────────────────────────────────────────

#[get("/settings")]
pub fn settings_index(store: &State<Arc<dyn Store>>) -> ApiResult {
    ok_json(json!(public_settings(&***store)))
}

/// Each key is written as its own row; concurrent updates to different
/// keys never clobber each other.
#[put("/settings", format = "json", data = "<body>")]
pub fn settings_update(
    _session: AdminSession,
    body: Json<HashMap<String, Value>>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    for (key, value) in body.into_inner() {
        let value = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        store.setting_set(&key, &value)?;
    }
    ok_json(json!({ "success": true }))
}

// ── Showcase ────────────────────────────────────────────────────────

#[get("/showcase")]
pub fn showcase_index(store: &State<Arc<dyn Store>>) -> ApiResult {
    let store = &***store;
    ok_json(json!({
        "sele": showcase::resolve(store, "showcase_sele"),
        "vites": showcase::resolve(store, "showcase_vites"),
    }))
}

/// Backfill per-product showcase flags from the JSON lists. The outcome
/// lists exactly which entries failed; nothing is silently skipped.
#[post("/showcase/migrate")]
pub fn showcase_migrate(_session: AdminSession, store: &State<Arc<dyn Store>>) -> ApiResult {
    let outcome = showcase::reset_and_assign(&***store)?;
    ok_json(json!({ "success": outcome.failed.is_empty(), "result": outcome }))
}

// ── Home ────────────────────────────────────────────────────────────

/// Everything the landing page needs in one response: settings, the two
/// product collections, resolved showcases, SEO blocks, and the decoded
/// vision/spec content with fallbacks.
#[get("/home")]
pub fn home(store: &State<Arc<dyn Store>>) -> ApiResult {
    let store = &***store;
    ok_json(json!({
        "settings": public_settings(store),
        "sele_products": store.product_list_public(Some("sele-kilifi"), None),
        "vites_products": store.product_list_public(Some("vites-sweatshirt"), None),
        "showcase_sele": showcase::resolve(store, "showcase_sele"),
        "showcase_vites": showcase::resolve(store, "showcase_vites"),
        "seo_content": store.seo_list_public(),
        "vision_cards": settings::vision_cards(store.setting_get("vision_cards")),
        "vision_lines": settings::vision_lines(store.setting_get("vision_lines")),
        "product_specs": settings::product_specs(store.setting_get("product_specs")),
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![
        products_index,
        products_create,
        products_show,
        products_show_by_slug,
        products_update,
        products_delete,
        brands_index,
        brands_create,
        brands_update,
        brands_delete,
        categories_index,
        categories_create,
        categories_update,
        categories_delete,
        seo_index,
        seo_create,
        seo_update,
        seo_delete,
        settings_index,
        settings_update,
        showcase_index,
        showcase_migrate,
        home,
    ]
}
