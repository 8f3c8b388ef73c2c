use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::store::StoreError;

/// The single dashboard account. There is no role model; whoever holds
/// these credentials administers the site.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

impl AdminUser {
    const SELECT_COLS: &'static str = "id, username, password_hash, created_at";

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AdminUser {
            id: row.get("id")?,
            username: row.get("username")?,
            password_hash: row.get("password_hash")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM admin_users WHERE id = ?1", Self::SELECT_COLS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn find_by_username(pool: &DbPool, username: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM admin_users WHERE username = ?1",
                Self::SELECT_COLS
            ),
            params![username],
            Self::from_row,
        )
        .ok()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM admin_users", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, username: &str, password_hash: &str) -> Result<i64, StoreError> {
        let conn = pool.get()?;
        conn.execute(
            "INSERT INTO admin_users (username, password_hash) VALUES (?1, ?2)",
            params![username, password_hash],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn update_credentials(
        pool: &DbPool,
        id: i64,
        username: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let conn = pool.get()?;
        let changed = conn.execute(
            "UPDATE admin_users SET username = ?1, password_hash = ?2 WHERE id = ?3",
            params![username, password_hash, id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
