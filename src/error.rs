use askama::Template;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::cookie_value;
use crate::auth::csrf::CsrfSecret;
use crate::auth::session::{SessionError, SESSION_COOKIE};
use crate::db::repository::RepositoryError;
use crate::extractors::RequestContext;
use crate::routes::{Html, Page};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/error.html")]
pub struct ErrorTemplate {
    pub page: Page,
    pub message: &'static str,
}

/// Marker left on error responses so `render_error_page` can redraw them
/// with the caller's navigation.
#[derive(Debug, Clone, Copy)]
struct ErrorView {
    status: StatusCode,
    message: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing post, or a post owned by someone else.
    #[error("Not found")]
    NotFound,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("CSRF secret cookie missing")]
    CsrfMissing,

    #[error("CSRF token mismatch")]
    CsrfMismatch,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "That post does not exist or you do not have access to it.",
            ),
            AppError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "You need to log in to do that.",
            ),
            // Both CSRF failures share one body.
            AppError::CsrfMissing | AppError::CsrfMismatch => (
                StatusCode::FORBIDDEN,
                "The form has expired. Please go back and try again.",
            ),
            AppError::BadRequest(msg) => {
                tracing::debug!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "The request could not be understood.")
            }
            AppError::Repository(e) => {
                tracing::error!("Repository error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.")
            }
            AppError::Session(e) => {
                tracing::error!("Session error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.")
            }
        };

        let template = ErrorTemplate {
            page: Page::anonymous(),
            message,
        };
        let mut response = (status, Html(template)).into_response();
        response
            .extensions_mut()
            .insert(ErrorView { status, message });
        response
    }
}

/// Middleware that re-renders `AppError` responses with the visitor's login
/// state and a fresh CSRF token, including rejections from extractors.
pub async fn render_error_page(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let session = cookie_value(req.headers(), SESSION_COOKIE).map(str::to_owned);
    let secret = req.extensions().get::<CsrfSecret>().cloned();

    let mut response = next.run(req).await;
    let Some(view) = response.extensions_mut().remove::<ErrorView>() else {
        return response;
    };

    let ctx = RequestContext::resolve(&state, session.as_deref(), secret.as_ref());
    let template = ErrorTemplate {
        page: ctx.page(),
        message: view.message,
    };
    (view.status, Html(template)).into_response()
}

pub type AppResult<T> = Result<T, AppError>;
