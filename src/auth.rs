use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

const SESSION_COOKIE: &str = "utku_admin_token";
const SESSION_HOURS: i64 = 24;

type HmacSha256 = Hmac<Sha256>;

/// Token-signing secret, read from settings (or env override) at startup
/// and shared via Rocket managed state.
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub username: String,
    /// Unix timestamp past which the token is dead.
    pub exp: i64,
}

/// Guard for admin-mutating routes. Verifies the signed cookie before
/// the handler body runs; failure lands in the JSON 401 catcher.
pub struct AdminSession {
    pub user_id: i64,
    pub username: String,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSession {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let config = match request.guard::<&State<AuthConfig>>().await {
            Outcome::Success(c) => c,
            _ => return Outcome::Error((Status::Unauthorized, ())),
        };

        let token = match request.cookies().get(SESSION_COOKIE) {
            Some(c) => c.value().to_string(),
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        match verify_token(&config.secret, &token) {
            Some(claims) => Outcome::Success(AdminSession {
                user_id: claims.user_id,
                username: claims.username,
            }),
            None => {
                request.cookies().remove(Cookie::from(SESSION_COOKIE));
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

pub fn hash_password(password: &str) -> Result<String, String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| e.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

fn sign(secret: &str, claims: &SessionClaims) -> Result<String, String> {
    let payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).map_err(|e| e.to_string())?);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| e.to_string())?;
    mac.update(payload.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{}.{}", payload, sig))
}

/// Issue a signed token carrying the admin identity, valid for 24 hours.
pub fn create_token(secret: &str, user_id: i64, username: &str) -> Result<String, String> {
    let claims = SessionClaims {
        user_id,
        username: username.to_string(),
        exp: (Utc::now() + Duration::hours(SESSION_HOURS)).timestamp(),
    };
    sign(secret, &claims)
}

/// Check signature and expiry. Malformed input is simply invalid — this
/// never panics and never errors.
pub fn verify_token(secret: &str, token: &str) -> Option<SessionClaims> {
    let (payload, sig) = token.split_once('.')?;
    let sig_bytes = URL_SAFE_NO_PAD.decode(sig).ok()?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    // verify_slice is constant-time
    mac.verify_slice(&sig_bytes).ok()?;

    let claims: SessionClaims =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).ok()?).ok()?;
    if claims.exp <= Utc::now().timestamp() {
        return None;
    }
    Some(claims)
}

pub fn set_session_cookie(cookies: &CookieJar<'_>, token: &str) {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie.set_max_age(rocket::time::Duration::hours(SESSION_HOURS));
    cookies.add(cookie);
}

/// Safe to call when no session exists.
pub fn clear_session_cookie(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::from(SESSION_COOKIE));
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn token_roundtrip_returns_identity() {
        let token = create_token(SECRET, 1, "admin").unwrap();
        let claims = verify_token(SECRET, &token).expect("token should verify");
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.username, "admin");
    }

    #[test]
    fn tampered_token_is_invalid() {
        let token = create_token(SECRET, 1, "admin").unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(verify_token(SECRET, &tampered).is_none());

        // altered payload with original signature
        let (_, sig) = token.split_once('.').unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"user_id":2,"username":"evil","exp":9999999999}"#);
        assert!(verify_token(SECRET, &format!("{}.{}", forged_payload, sig)).is_none());
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = create_token(SECRET, 1, "admin").unwrap();
        assert!(verify_token("other-secret", &token).is_none());
    }

    #[test]
    fn expired_token_is_invalid() {
        let claims = SessionClaims {
            user_id: 1,
            username: "admin".to_string(),
            exp: Utc::now().timestamp() - 60,
        };
        let token = sign(SECRET, &claims).unwrap();
        assert!(verify_token(SECRET, &token).is_none());
    }

    #[test]
    fn malformed_tokens_never_panic() {
        for junk in ["", ".", "abc", "a.b.c", "🙂.🙂", "not-base64.also-not"] {
            assert!(verify_token(SECRET, junk).is_none());
        }
    }

    #[test]
    fn password_hash_and_verify() {
        let hash = bcrypt::hash("parola123", 4).unwrap();
        assert!(verify_password("parola123", &hash));
        assert!(!verify_password("yanlis", &hash));
        assert!(!verify_password("parola123", "not-a-hash"));
    }
}
