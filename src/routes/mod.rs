pub mod assets;
pub mod auth;
pub mod home;
pub mod posts;

use askama::Template;
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::csrf;
use crate::error;
use crate::state::AppState;

/// Layout data every page needs: who is logged in and the CSRF token for
/// any form on the page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub username: Option<String>,
    pub csrf_token: String,
}

impl Page {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(auth::router())
        .merge(posts::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error::render_error_page,
        ))
        .layer(middleware::from_fn(csrf::ensure_secret))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
