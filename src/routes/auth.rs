use std::sync::Arc;

use rocket::http::{CookieJar, Status};
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, AdminSession, AuthConfig};
use crate::routes::{ok_json, ApiError, ApiResult};
use crate::store::Store;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[post("/auth", format = "json", data = "<body>")]
pub fn login(
    body: Json<LoginRequest>,
    store: &State<Arc<dyn Store>>,
    config: &State<AuthConfig>,
    cookies: &CookieJar<'_>,
) -> ApiResult {
    let username = body.username.as_deref().unwrap_or("").trim();
    let password = body.password.as_deref().unwrap_or("");
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Kullanıcı adı ve şifre gereklidir."));
    }

    // One generic message whether the username or the password was wrong
    let admin = match store.admin_get_by_username(username) {
        Some(a) if auth::verify_password(password, &a.password_hash) => a,
        _ => {
            return Err(ApiError::unauthorized(
                "Geçersiz kullanıcı adı veya şifre.",
            ))
        }
    };

    let token = auth::create_token(&config.secret, admin.id, &admin.username).map_err(|e| {
        log::error!("token creation failed: {}", e);
        ApiError::new(Status::InternalServerError, "Sunucu hatası.")
    })?;
    auth::set_session_cookie(cookies, &token);

    ok_json(json!({ "success": true, "username": admin.username }))
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar<'_>) -> ApiResult {
    auth::clear_session_cookie(cookies);
    ok_json(json!({ "success": true }))
}

#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    #[serde(rename = "currentPassword")]
    pub current_password: Option<String>,
    #[serde(rename = "newUsername")]
    pub new_username: Option<String>,
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}

#[put("/auth/account", format = "json", data = "<body>")]
pub fn update_account(
    session: AdminSession,
    body: Json<AccountRequest>,
    store: &State<Arc<dyn Store>>,
) -> ApiResult {
    let current_password = body.current_password.as_deref().unwrap_or("");
    let new_username = body.new_username.as_deref().unwrap_or("").trim();
    let new_password = body.new_password.as_deref().unwrap_or("");

    if current_password.is_empty() || new_username.is_empty() || new_password.is_empty() {
        return Err(ApiError::bad_request(
            "Mevcut şifre, yeni kullanıcı adı ve yeni şifre zorunludur.",
        ));
    }
    if new_password.chars().count() < 6 {
        return Err(ApiError::bad_request(
            "Yeni şifre en az 6 karakter olmalıdır.",
        ));
    }

    // A valid-but-stale session is not enough: the change requires the
    // password currently on record.
    let admin = match store.admin_get_by_id(session.user_id) {
        Some(a) => a,
        None => return Err(ApiError::unauthorized("Yetkisiz erişim.")),
    };
    if !auth::verify_password(current_password, &admin.password_hash) {
        return Err(ApiError::unauthorized("Mevcut şifre hatalı."));
    }

    if new_username != admin.username && store.admin_get_by_username(new_username).is_some() {
        return Err(ApiError::new(
            Status::Conflict,
            "Bu kullanıcı adı zaten kullanılıyor.",
        ));
    }

    let hash = auth::hash_password(new_password).map_err(|e| {
        log::error!("password hash failed: {}", e);
        ApiError::new(Status::InternalServerError, "Sunucu hatası.")
    })?;
    store.admin_update_credentials(admin.id, new_username, &hash)?;

    ok_json(json!({ "success": true, "message": "Hesap bilgileri güncellendi." }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![login, logout, update_account]
}
