//! Double-submit CSRF protection.
//!
//! A random secret lives in the httpOnly `_csrfSecret` cookie. Every rendered
//! form carries a token derived from it as `salt-HMAC(secret, salt)`, so any
//! number of tokens can be outstanding at once and each one only verifies
//! against the secret that produced it.

use axum::extract::Request;
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::Sha256;

use crate::auth::cookie_value;

pub const SECRET_COOKIE: &str = "_csrfSecret";
pub const FORM_FIELD: &str = "_csrf";

const SECRET_BYTES: usize = 18;
const SALT_LEN: usize = 8;

type HmacSha256 = Hmac<Sha256>;

/// The CSRF secret resolved for the current request.
#[derive(Debug, Clone)]
pub struct CsrfSecret {
    value: String,
    from_request: bool,
}

impl CsrfSecret {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let bytes: [u8; SECRET_BYTES] = rng.gen();
        Self {
            value: URL_SAFE_NO_PAD.encode(bytes),
            from_request: false,
        }
    }

    pub fn from_cookie(value: &str) -> Self {
        Self {
            value: value.to_string(),
            from_request: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// False when the browser sent no secret and one was minted for this
    /// response. Such a secret must never authorize a state change.
    pub fn is_from_request(&self) -> bool {
        self.from_request
    }

    pub fn create_token(&self) -> String {
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LEN)
            .map(char::from)
            .collect();
        let signature = self.mac(&salt).finalize().into_bytes();
        format!("{}-{}", salt, URL_SAFE_NO_PAD.encode(signature))
    }

    pub fn verify(&self, token: &str) -> bool {
        let Some((salt, signature)) = token.split_once('-') else {
            return false;
        };
        if salt.len() != SALT_LEN {
            return false;
        }
        let Ok(signature) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        self.mac(salt).verify_slice(&signature).is_ok()
    }

    fn mac(&self, salt: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.value.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(salt.as_bytes());
        mac
    }
}

pub fn secret_cookie(secret: &str) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/",
        SECRET_COOKIE, secret
    )
}

/// Middleware that resolves the CSRF secret for every request, stores it in
/// the request extensions, and sets the cookie when a new one was minted.
pub async fn ensure_secret(mut req: Request, next: Next) -> Response {
    let secret = cookie_value(req.headers(), SECRET_COOKIE)
        .filter(|v| !v.is_empty())
        .map(CsrfSecret::from_cookie)
        .unwrap_or_else(CsrfSecret::generate);

    let new_cookie = if secret.is_from_request() {
        None
    } else {
        Some(secret_cookie(secret.value()))
    };

    req.extensions_mut().insert(secret);
    let mut response = next.run(req).await;

    if let Some(cookie) = new_cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Invalid CSRF cookie header: {}", e),
        }
    }

    response
}
