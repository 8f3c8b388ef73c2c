use std::sync::Arc;

use log::info;

use crate::store::mongo::MongoStore;
use crate::store::sqlite::SqliteStore;
use crate::store::{Store, StoreError};

/// `[database]` section of utku.toml. Anything missing falls back to the
/// embedded SQLite backend next to the site files.
pub struct DatabaseConfig {
    pub backend: String,
    pub sqlite_path: String,
    pub mongo_uri: String,
    pub mongo_db: String,
}

pub fn load() -> DatabaseConfig {
    let toml_str = std::fs::read_to_string("utku.toml").unwrap_or_default();
    let toml_val: toml::Value = toml_str
        .parse()
        .unwrap_or(toml::Value::Table(Default::default()));
    let database = toml_val.get("database").cloned();
    let get = |key: &str, default: &str| -> String {
        database
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    };

    DatabaseConfig {
        backend: get("backend", "sqlite"),
        sqlite_path: get("sqlite_path", "website/db/utku.db"),
        mongo_uri: get("mongo_uri", "mongodb://localhost:27017"),
        mongo_db: get("mongo_db", "utku_store"),
    }
}

/// Build the configured backend. Called exactly once, before launch; the
/// resulting handle is shared immutably for the life of the process.
pub fn create_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>, StoreError> {
    match config.backend.as_str() {
        "mongodb" => {
            info!("Using MongoDB backend ({})", config.mongo_db);
            let store = MongoStore::new(&config.mongo_uri, &config.mongo_db)?;
            store.test_connection()?;
            Ok(Arc::new(store) as Arc<dyn Store>)
        }
        _ => {
            info!("Using SQLite backend ({})", config.sqlite_path);
            let store = SqliteStore::new_at(&config.sqlite_path)?;
            Ok(Arc::new(store) as Arc<dyn Store>)
        }
    }
}
