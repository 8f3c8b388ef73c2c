#[macro_use]
extern crate rocket;

use std::sync::Arc;

use log::info;
use rocket::fs::FileServer;
use rocket::serde::json::Json;
use rocket::{Build, Rocket};
use serde_json::{json, Value};

mod auth;
mod boot;
mod config;
mod db;
mod models;
mod routes;
mod showcase;
mod store;

#[cfg(test)]
mod tests;

use auth::AuthConfig;
use store::Store;

#[catch(400)]
fn bad_request() -> Json<Value> {
    Json(json!({ "error": "Geçersiz istek." }))
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    Json(json!({ "error": "Yetkisiz erişim." }))
}

#[catch(404)]
fn not_found() -> Json<Value> {
    Json(json!({ "error": "Kayıt bulunamadı." }))
}

#[catch(422)]
fn unprocessable() -> Json<Value> {
    Json(json!({ "error": "Geçersiz istek gövdesi." }))
}

#[catch(500)]
fn server_error() -> Json<Value> {
    Json(json!({ "error": "Sunucu hatası." }))
}

pub fn build_rocket(store: Arc<dyn Store>, secret: String) -> Rocket<Build> {
    // FileServer refuses to mount a missing directory
    let _ = std::fs::create_dir_all(routes::upload::UPLOAD_DIR);

    let figment = rocket::Config::figment()
        .merge(("limits.file", "6MiB"))
        .merge(("limits.data-form", "7MiB"));

    rocket::custom(figment)
        .manage(store)
        .manage(AuthConfig { secret })
        .mount("/uploads", FileServer::from(routes::upload::UPLOAD_DIR))
        .mount("/api", routes::auth::routes())
        .mount("/api", routes::api::routes())
        .mount("/api", routes::upload::routes())
        .register(
            "/",
            catchers![bad_request, unauthorized, not_found, unprocessable, server_error],
        )
}

#[launch]
fn rocket() -> _ {
    env_logger::init();

    // Boot check — create missing data directories before anything opens them
    boot::run();

    let db_config = config::load();
    let store = config::create_store(&db_config).expect("Failed to initialize storage backend");
    store
        .run_migrations()
        .expect("Failed to run storage migrations");
    store.seed_defaults().expect("Failed to seed defaults");
    info!("Storage backend ready: {}", store.backend_name());

    // Seeded per installation; the env var wins when set
    let secret = std::env::var("UTKU_SESSION_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| store.setting_get_or("session_secret", "utku-giyim-super-secret-key-2024"));

    build_rocket(store, secret)
}
