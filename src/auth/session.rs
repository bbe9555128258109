use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "authentication";

const MAX_SESSION_HOURS: i64 = 24 * 365;

/// Identity carried in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    id: i64,
    username: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies session tokens (HS256 JWT).
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl SessionCodec {
    pub fn new(secret: &[u8], lifetime_hours: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `verify_at` against the caller's clock.
        validation.validate_exp = false;

        let hours = i64::try_from(lifetime_hours)
            .unwrap_or(MAX_SESSION_HOURS)
            .min(MAX_SESSION_HOURS);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            lifetime: Duration::hours(hours),
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn issue(&self, claim: &Claim) -> Result<String, SessionError> {
        self.issue_at(claim, Utc::now())
    }

    pub fn issue_at(&self, claim: &Claim, now: DateTime<Utc>) -> Result<String, SessionError> {
        let claims = TokenClaims {
            id: claim.id,
            username: claim.username.clone(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    pub fn verify(&self, token: &str) -> Option<Claim> {
        self.verify_at(token, Utc::now())
    }

    /// Bad signature, malformed payload and expiry all come back as `None`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<Claim> {
        let data = match decode::<TokenClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                return None;
            }
        };

        if data.claims.exp <= now.timestamp() {
            tracing::debug!("Rejected expired session token");
            return None;
        }

        Some(Claim {
            id: data.claims.id,
            username: data.claims.username,
        })
    }
}

pub fn session_cookie(token: &str, lifetime: Duration) -> String {
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        SESSION_COOKIE,
        token,
        lifetime.num_seconds()
    )
}

pub fn clear_session_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        SESSION_COOKIE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> SessionCodec {
        SessionCodec::new(b"test-secret", 24)
    }

    fn alice() -> Claim {
        Claim {
            id: 7,
            username: "alice".to_string(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let codec = codec();
        let token = codec.issue(&alice()).unwrap();
        assert_eq!(codec.verify(&token), Some(alice()));
    }

    #[test]
    fn token_is_valid_for_24_hours() {
        let codec = codec();
        let issued = Utc::now();
        let token = codec.issue_at(&alice(), issued).unwrap();

        assert_eq!(
            codec.verify_at(&token, issued + Duration::hours(23)),
            Some(alice())
        );
        assert_eq!(codec.verify_at(&token, issued + Duration::hours(25)), None);
    }

    #[test]
    fn token_signed_with_other_key_is_rejected() {
        let token = SessionCodec::new(b"other-secret", 24)
            .issue(&alice())
            .unwrap();
        assert_eq!(codec().verify(&token), None);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let codec = codec();
        let token = codec.issue(&alice()).unwrap();
        let mut parts: Vec<String> = token.split('.').map(String::from).collect();
        let forged = SessionCodec::new(b"attacker", 24)
            .issue(&Claim {
                id: 1,
                username: "admin".to_string(),
            })
            .unwrap();
        parts[1] = forged.split('.').nth(1).unwrap().to_string();
        assert_eq!(codec.verify(&parts.join(".")), None);
    }

    #[test]
    fn garbage_is_rejected() {
        let codec = codec();
        assert_eq!(codec.verify(""), None);
        assert_eq!(codec.verify("not.a.jwt"), None);
        assert_eq!(codec.verify("definitely not a token"), None);
    }

    #[test]
    fn session_cookie_has_expected_attributes() {
        let cookie = session_cookie("abc", Duration::hours(24));
        assert!(cookie.starts_with("authentication=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }
}
