use log::error;
use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::{json, Value};

use crate::store::StoreError;

pub mod api;
pub mod auth;
pub mod upload;

pub type ApiResult = Result<Json<Value>, ApiError>;

/// Failure response: a status code plus a localized `{"error": ...}` body.
pub struct ApiError {
    pub status: Status,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Status, message: &str) -> Self {
        ApiError {
            status,
            message: message.to_string(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new(Status::BadRequest, message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(Status::Unauthorized, message)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let mut resp = Json(json!({ "error": self.message })).respond_to(req)?;
        resp.set_status(self.status);
        Ok(resp)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(message) => ApiError {
                status: Status::BadRequest,
                message,
            },
            StoreError::Duplicate => {
                Self::new(Status::Conflict, "Bu isim veya slug zaten kullanılıyor.")
            }
            StoreError::NotFound => Self::new(Status::NotFound, "Kayıt bulunamadı."),
            StoreError::Storage(detail) => {
                // internal detail stays in the log, clients get a generic line
                error!("storage failure: {}", detail);
                Self::new(Status::InternalServerError, "Sunucu hatası.")
            }
        }
    }
}

pub fn ok_json(value: Value) -> ApiResult {
    Ok(Json(value))
}
