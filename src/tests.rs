#![cfg(test)]

use std::sync::Arc;

use rocket::http::{ContentType, Status};
use rocket::local::blocking::Client;
use serde_json::Value;

use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// Atomic counter for unique shared-cache DB names so parallel tests
/// don't collide.
static TEST_DB_COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(0);

/// Client over a full rocket instance backed by a fresh named
/// shared-cache in-memory SQLite store. A cost-4 admin hash is
/// pre-inserted so seed_defaults skips the expensive DEFAULT_COST call.
fn test_client() -> Client {
    let id = TEST_DB_COUNTER.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    let uri = format!("file:http_testdb_{}?mode=memory&cache=shared", id);
    let manager = r2d2_sqlite::SqliteConnectionManager::file(uri);
    let pool = r2d2::Pool::builder()
        .max_size(4)
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

    let secret = store.setting_get_or("session_secret", "test-secret");
    Client::tracked(crate::build_rocket(Arc::new(store), secret)).expect("valid rocket instance")
}

fn login(client: &Client) {
    let resp = client
        .post("/api/auth")
        .header(ContentType::JSON)
        .body(r#"{"username":"admin","password":"admin123"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
}

fn body_json(resp: rocket::local::blocking::LocalResponse<'_>) -> Value {
    resp.into_json::<Value>().expect("JSON body expected")
}

// ═══════════════════════════════════════════════════════════
// Authorization gate
// ═══════════════════════════════════════════════════════════

#[test]
fn mutating_routes_require_session() {
    let client = test_client();

    let resp = client
        .post("/api/products")
        .header(ContentType::JSON)
        .body(r#"{"title":"X","slug":"x","category":"sele-kilifi","brand_id":1}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);

    let resp = client.get("/api/products?admin=true").dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);

    let resp = client
        .put("/api/settings")
        .header(ContentType::JSON)
        .body(r#"{"phone":"x"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);

    let resp = client.delete("/api/products/1").dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);

    let resp = client.post("/api/showcase/migrate").dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);

    let resp = client
        .put("/api/auth/account")
        .header(ContentType::JSON)
        .body(r#"{"currentPassword":"a","newUsername":"b","newPassword":"cccccc"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);
}

#[test]
fn login_validates_and_rejects_bad_credentials() {
    let client = test_client();

    let resp = client
        .post("/api/auth")
        .header(ContentType::JSON)
        .body(r#"{"username":"admin"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);

    let resp = client
        .post("/api/auth")
        .header(ContentType::JSON)
        .body(r#"{"username":"admin","password":"yanlis"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);
    assert!(resp.cookies().get("utku_admin_token").is_none());

    // unknown user gets the same message as a wrong password
    let resp = client
        .post("/api/auth")
        .header(ContentType::JSON)
        .body(r#"{"username":"kimse","password":"admin123"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);
    let body = body_json(resp);
    assert_eq!(body["error"], "Geçersiz kullanıcı adı veya şifre.");
}

#[test]
fn login_sets_session_cookie() {
    let client = test_client();
    let resp = client
        .post("/api/auth")
        .header(ContentType::JSON)
        .body(r#"{"username":"admin","password":"admin123"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert!(resp.cookies().get("utku_admin_token").is_some());
    let body = body_json(resp);
    assert_eq!(body["success"], true);
    assert_eq!(body["username"], "admin");
}

#[test]
fn logout_is_idempotent() {
    let client = test_client();
    assert_eq!(client.delete("/api/auth").dispatch().status(), Status::Ok);
    assert_eq!(client.delete("/api/auth").dispatch().status(), Status::Ok);
}

// ═══════════════════════════════════════════════════════════
// Products
// ═══════════════════════════════════════════════════════════

#[test]
fn product_create_end_to_end() {
    let client = test_client();
    login(&client);

    // missing brand gets its own message
    let resp = client
        .post("/api/products")
        .header(ContentType::JSON)
        .body(r#"{"title":"Yeni","slug":"yeni","category":"sele-kilifi"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
    assert_eq!(body_json(resp)["error"], "Marka bilgisi zorunludur.");

    // missing title/slug/category
    let resp = client
        .post("/api/products")
        .header(ContentType::JSON)
        .body(r#"{"title":"Yeni","brand_id":1}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
    assert_eq!(body_json(resp)["error"], "Başlık, slug ve kategori zorunludur.");

    let resp = client
        .post("/api/products")
        .header(ContentType::JSON)
        .body(
            r#"{"title":"Test Kılıf","slug":"test-kilif","category":"sele-kilifi",
                "brand_id":1,"price":299.9,"badge":"YENİ","badge_type":"new"}"#,
        )
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = body_json(resp);
    assert_eq!(body["success"], true);
    let id = body["id"].as_i64().expect("numeric id");

    // created product comes back with the joined brand name
    let resp = client.get(format!("/api/products/{}", id)).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let product = body_json(resp);
    assert_eq!(product["title"], "Test Kılıf");
    assert_eq!(product["brand_name"], "Utku Giyim");
    assert_eq!(product["brand_slug"], "utku-giyim");
    assert_eq!(product["is_active"], true);

    // partial update
    let resp = client
        .put(format!("/api/products/{}", id))
        .header(ContentType::JSON)
        .body(r#"{"price":199.9}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let resp = client.get(format!("/api/products/{}", id)).dispatch();
    let product = body_json(resp);
    assert_eq!(product["price"], 199.9);
    assert_eq!(product["title"], "Test Kılıf");

    // delete, then 404
    let resp = client.delete(format!("/api/products/{}", id)).dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let resp = client.get(format!("/api/products/{}", id)).dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[test]
fn product_lookup_by_slug() {
    let client = test_client();
    let resp = client
        .get("/api/products/slug/klasik-siyah-sele-kilifi")
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(body_json(resp)["id"], 1);

    let resp = client.get("/api/products/slug/yok-boyle-urun").dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[test]
fn product_duplicate_slug_is_conflict() {
    let client = test_client();
    login(&client);

    let resp = client
        .post("/api/products")
        .header(ContentType::JSON)
        .body(r#"{"title":"Kopya","slug":"klasik-siyah-sele-kilifi","category":"sele-kilifi","brand_id":1}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Conflict);
}

#[test]
fn product_invalid_badge_type_is_rejected() {
    let client = test_client();
    login(&client);

    let resp = client
        .post("/api/products")
        .header(ContentType::JSON)
        .body(r#"{"title":"R","slug":"rozet","category":"sele-kilifi","brand_id":1,"badge_type":"mega"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test]
fn public_product_listing_and_filters() {
    let client = test_client();

    let resp = client.get("/api/products").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let all = body_json(resp);
    assert_eq!(all.as_array().unwrap().len(), 10);

    let resp = client.get("/api/products?category=sele-kilifi").dispatch();
    let sele = body_json(resp);
    assert_eq!(sele.as_array().unwrap().len(), 5);

    let resp = client.get("/api/products?brand=utku-giyim").dispatch();
    let branded = body_json(resp);
    assert_eq!(branded.as_array().unwrap().len(), 10);
}

// ═══════════════════════════════════════════════════════════
// Categories / SEO content
// ═══════════════════════════════════════════════════════════

#[test]
fn category_admin_flow() {
    let client = test_client();

    let resp = client.get("/api/categories").dispatch();
    assert_eq!(body_json(resp).as_array().unwrap().len(), 2);

    let resp = client.get("/api/categories?admin=true").dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);

    login(&client);

    let resp = client.get("/api/categories?admin=true").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let cats = body_json(resp);
    let sele = cats
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["slug"] == "sele-kilifi")
        .unwrap();
    assert_eq!(sele["product_count"], 5);

    let resp = client
        .post("/api/categories")
        .header(ContentType::JSON)
        .body(r#"{"name":"Kask","slug":"kask"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let id = body_json(resp)["id"].as_i64().unwrap();

    let resp = client
        .put("/api/categories")
        .header(ContentType::JSON)
        .body(format!(r#"{{"id":{},"name":"Kasklar"}}"#, id))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    let resp = client
        .delete(format!("/api/categories?id={}", id))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    let resp = client
        .delete(format!("/api/categories?id={}", id))
        .dispatch();
    assert_eq!(resp.status(), Status::NotFound);
}

#[test]
fn seo_content_flow() {
    let client = test_client();

    let resp = client.get("/api/seo-content").dispatch();
    assert_eq!(body_json(resp).as_array().unwrap().len(), 3);

    login(&client);

    let resp = client
        .post("/api/seo-content")
        .header(ContentType::JSON)
        .body(r#"{"title":"Soru","content":"Cevap"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let id = body_json(resp)["id"].as_i64().unwrap();

    let resp = client
        .post("/api/seo-content")
        .header(ContentType::JSON)
        .body(r#"{"title":"Eksik"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);

    let resp = client
        .put("/api/seo-content")
        .header(ContentType::JSON)
        .body(format!(r#"{{"id":{},"is_active":false}}"#, id))
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    // deactivated item is gone from the public listing
    let resp = client.get("/api/seo-content").dispatch();
    assert_eq!(body_json(resp).as_array().unwrap().len(), 3);
}

// ═══════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════

#[test]
fn settings_roundtrip_and_secret_hygiene() {
    let client = test_client();

    let resp = client.get("/api/settings").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let settings = body_json(resp);
    assert!(settings.get("hero_title").is_some());
    assert!(settings.get("session_secret").is_none());

    login(&client);

    let resp = client
        .put("/api/settings")
        .header(ContentType::JSON)
        .body(r#"{"phone":"+90 500 000 0000"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    let resp = client.get("/api/settings").dispatch();
    let settings = body_json(resp);
    assert_eq!(settings["phone"], "+90 500 000 0000");
    // untouched keys keep their values
    assert_eq!(settings["show_sele_collection"], "1");
}

// ═══════════════════════════════════════════════════════════
// Showcase
// ═══════════════════════════════════════════════════════════

#[test]
fn showcase_resolution_over_http() {
    let client = test_client();
    login(&client);

    let resp = client
        .put("/api/settings")
        .header(ContentType::JSON)
        .body(r#"{"showcase_sele":"[5, 0, 3, 9999, 2]"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    let resp = client.get("/api/showcase").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = body_json(resp);
    let ids: Vec<i64> = body["sele"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![5, 3, 2]);

    let resp = client.post("/api/showcase/migrate").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = body_json(resp);
    // entry 9999 cannot apply and must be reported
    assert_eq!(body["success"], false);
    assert_eq!(body["result"]["applied"], 3);
    assert_eq!(body["result"]["failed"][0]["product_id"], 9999);
}

// ═══════════════════════════════════════════════════════════
// Home
// ═══════════════════════════════════════════════════════════

#[test]
fn home_bundles_storefront_data() {
    let client = test_client();
    let resp = client.get("/api/home").dispatch();
    assert_eq!(resp.status(), Status::Ok);
    let body = body_json(resp);

    assert_eq!(body["sele_products"].as_array().unwrap().len(), 5);
    assert_eq!(body["vites_products"].as_array().unwrap().len(), 5);
    assert_eq!(body["seo_content"].as_array().unwrap().len(), 3);
    assert!(!body["vision_cards"].as_array().unwrap().is_empty());
    assert!(body["settings"].get("session_secret").is_none());
    // nothing picked yet
    assert!(body["showcase_sele"].as_array().unwrap().is_empty());
}

// ═══════════════════════════════════════════════════════════
// Account credentials
// ═══════════════════════════════════════════════════════════

#[test]
fn account_change_requires_current_password() {
    let client = test_client();
    login(&client);

    let resp = client
        .put("/api/auth/account")
        .header(ContentType::JSON)
        .body(r#"{"currentPassword":"yanlis","newUsername":"utku","newPassword":"yenisifre"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);
    assert_eq!(body_json(resp)["error"], "Mevcut şifre hatalı.");

    let resp = client
        .put("/api/auth/account")
        .header(ContentType::JSON)
        .body(r#"{"currentPassword":"admin123","newUsername":"utku","newPassword":"kisa"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::BadRequest);
}

#[test]
fn account_change_end_to_end() {
    let client = test_client();
    login(&client);

    let resp = client
        .put("/api/auth/account")
        .header(ContentType::JSON)
        .body(r#"{"currentPassword":"admin123","newUsername":"utku","newPassword":"yenisifre"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);

    // the old username no longer authenticates
    let resp = client
        .post("/api/auth")
        .header(ContentType::JSON)
        .body(r#"{"username":"admin","password":"admin123"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);

    // the new credentials do
    let resp = client
        .post("/api/auth")
        .header(ContentType::JSON)
        .body(r#"{"username":"utku","password":"yenisifre"}"#)
        .dispatch();
    assert_eq!(resp.status(), Status::Ok);
}

// ═══════════════════════════════════════════════════════════
// Upload
// ═══════════════════════════════════════════════════════════

#[test]
fn upload_requires_session() {
    let client = test_client();
    let resp = client.post("/api/upload").dispatch();
    assert_eq!(resp.status(), Status::Unauthorized);
}
