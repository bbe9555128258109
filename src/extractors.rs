use std::collections::HashMap;
use std::convert::Infallible;

use axum::extract::{Form, FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;

use crate::auth::csrf::{CsrfSecret, FORM_FIELD};
use crate::auth::cookie_value;
use crate::auth::session::{Claim, SESSION_COOKIE};
use crate::error::{AppError, AppResult};
use crate::routes::Page;
use crate::state::AppState;
use crate::validation;

/// Per-request view of who is asking, plus a freshly derived CSRF token for
/// any form the handler renders. Never rejects.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub auth: Option<Claim>,
    pub csrf_token: String,
}

impl RequestContext {
    /// The session claim, or `Unauthenticated` for item-scoped routes.
    pub fn require_user(&self) -> AppResult<&Claim> {
        self.auth.as_ref().ok_or(AppError::Unauthenticated)
    }

    pub fn page(&self) -> Page {
        Page {
            username: self.auth.as_ref().map(|claim| claim.username.clone()),
            csrf_token: self.csrf_token.clone(),
        }
    }
}

impl RequestContext {
    /// Build the context from the raw session cookie and the CSRF secret
    /// resolved by `csrf::ensure_secret`.
    pub fn resolve(
        state: &AppState,
        session: Option<&str>,
        secret: Option<&CsrfSecret>,
    ) -> Self {
        let auth = session.and_then(|token| state.sessions.verify(token));
        let csrf_token = secret.map(CsrfSecret::create_token).unwrap_or_default();
        RequestContext { auth, csrf_token }
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::resolve(
            state,
            cookie_value(&parts.headers, SESSION_COOKIE),
            parts.extensions.get::<CsrfSecret>(),
        ))
    }
}

/// The `{post_id}` route segment. `None` when it is not a positive integer,
/// including segments that do not even decode as UTF-8. Never rejects, so
/// the handler can check authentication before reporting not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostIdParam(pub Option<i64>);

impl<S> FromRequestParts<S> for PostIdParam
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let post_id = Path::<String>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Path(raw)| validation::parse_post_id(&raw));
        Ok(PostIdParam(post_id))
    }
}

/// Submitted form fields, normalized to strings.
#[derive(Debug, Clone, Default)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    /// The first value wins when a key repeats.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut fields = HashMap::new();
        for (key, value) in pairs {
            fields.entry(key).or_insert(value);
        }
        Self(fields)
    }

    /// Field value, or the empty string when absent.
    pub fn text(&self, name: &str) -> String {
        self.0.get(name).cloned().unwrap_or_default()
    }
}

/// Urlencoded form body whose `_csrf` token has been checked against the
/// secret cookie. Runs before the handler body, so a rejected request never
/// reaches the repository.
pub struct CsrfForm(pub FormFields);

impl<S> FromRequest<S> for CsrfForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let secret = req
            .extensions()
            .get::<CsrfSecret>()
            .filter(|secret| secret.is_from_request())
            .cloned();

        let Some(secret) = secret else {
            tracing::warn!("Rejected {} {}: missing CSRF secret", req.method(), req.uri());
            return Err(AppError::CsrfMissing);
        };

        let method = req.method().clone();
        let uri = req.uri().clone();

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let fields = FormFields::from_pairs(pairs);

        if !secret.verify(&fields.text(FORM_FIELD)) {
            tracing::warn!("Rejected {} {}: invalid CSRF token", method, uri);
            return Err(AppError::CsrfMismatch);
        }

        Ok(CsrfForm(fields))
    }
}
