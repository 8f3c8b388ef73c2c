use log::error;
use rocket::form::Form;
use rocket::fs::TempFile;
use rocket::http::{ContentType, Status};
use serde_json::json;

use crate::auth::AdminSession;
use crate::routes::{ok_json, ApiError, ApiResult};

pub const UPLOAD_DIR: &str = "website/uploads";
const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(FromForm)]
pub struct UploadForm<'f> {
    pub file: TempFile<'f>,
}

fn allowed_extension(ct: &ContentType) -> Option<&'static str> {
    if *ct == ContentType::JPEG {
        Some("jpg")
    } else if *ct == ContentType::PNG {
        Some("png")
    } else if *ct == ContentType::WEBP {
        Some("webp")
    } else if *ct == ContentType::GIF {
        Some("gif")
    } else {
        None
    }
}

#[post("/upload", data = "<form>")]
pub async fn upload(_session: AdminSession, mut form: Form<UploadForm<'_>>) -> ApiResult {
    let file = &mut form.file;

    if file.len() == 0 {
        return Err(ApiError::bad_request("Dosya bulunamadı."));
    }

    let ext = match file.content_type().and_then(allowed_extension) {
        Some(ext) => ext,
        None => {
            return Err(ApiError::bad_request(
                "Sadece JPEG, PNG, WebP ve GIF desteklenir.",
            ))
        }
    };

    if file.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::bad_request(
            "Dosya boyutu 5MB'dan büyük olamaz.",
        ));
    }

    let filename = format!("urun_{}.{}", uuid::Uuid::new_v4(), ext);
    let upload_dir = std::path::Path::new(UPLOAD_DIR);
    let _ = std::fs::create_dir_all(upload_dir);
    let dest = upload_dir.join(&filename);

    if let Err(e) = file.persist_to(&dest).await {
        error!("upload persist failed: {}", e);
        return Err(ApiError::new(
            Status::InternalServerError,
            "Dosya yüklenemedi.",
        ));
    }

    ok_json(json!({ "success": true, "url": format!("/uploads/{}", filename) }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![upload]
}
