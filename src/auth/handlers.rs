use askama::Template;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::password;
use crate::auth::session::{clear_session_cookie, session_cookie, Claim};
use crate::db::repository::RepositoryError;
use crate::error::AppResult;
use crate::extractors::{CsrfForm, RequestContext};
use crate::routes::{Html, Page};
use crate::state::AppState;
use crate::validation::{self, INVALID_CREDENTIALS, USERNAME_TAKEN};

// -- Templates --

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub page: Page,
    pub errors: Vec<String>,
    pub username: String,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub page: Page,
    pub errors: Vec<String>,
    pub username: String,
}

impl RegisterTemplate {
    pub fn empty(page: Page) -> Self {
        Self {
            page,
            errors: Vec::new(),
            username: String::new(),
        }
    }
}

// -- Registration --

/// GET /register
pub async fn register_page(ctx: RequestContext) -> Html<RegisterTemplate> {
    Html(RegisterTemplate::empty(ctx.page()))
}

/// POST /register: validate, hash, insert, then send the user to log in
pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    CsrfForm(form): CsrfForm,
) -> AppResult<Response> {
    let username = form.text("username").trim().to_string();
    let password = form.text("password");

    let taken = !username.is_empty()
        && state
            .users
            .find_user_by_username(&username)
            .await?
            .is_some();

    let errors = validation::registration_errors(&username, &password, taken);
    if !errors.is_empty() {
        return Ok(Html(RegisterTemplate {
            page: ctx.page(),
            errors,
            username,
        })
        .into_response());
    }

    let password_hash = password::hash_blocking(password).await?;

    match state.users.create_user(&username, &password_hash).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "Registered user {}", user.username);
            Ok(Redirect::to("/login").into_response())
        }
        // Lost a race with a concurrent registration for the same name.
        Err(RepositoryError::Conflict(_)) => Ok(Html(RegisterTemplate {
            page: ctx.page(),
            errors: vec![USERNAME_TAKEN.to_string()],
            username,
        })
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

// -- Login --

/// GET /login
pub async fn login_page(ctx: RequestContext) -> Html<LoginTemplate> {
    Html(LoginTemplate {
        page: ctx.page(),
        errors: Vec::new(),
        username: String::new(),
    })
}

/// POST /login: check credentials and issue the session cookie
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    CsrfForm(form): CsrfForm,
) -> AppResult<Response> {
    let username = form.text("username").trim().to_string();
    let password = form.text("password");

    let mut errors = validation::login_errors(&username, &password);

    let user = if username.is_empty() {
        None
    } else {
        state.users.find_user_by_username(&username).await?
    };

    let authenticated = match &user {
        Some(user) if !password.is_empty() => {
            password::verify_blocking(password, user.password_hash.clone()).await?
        }
        _ => false,
    };

    // Unknown user and wrong password read the same to the visitor.
    let user = match user {
        Some(user) if authenticated => Some(user),
        _ => {
            if errors.is_empty() {
                errors.push(INVALID_CREDENTIALS.to_string());
            }
            None
        }
    };

    let Some(user) = user else {
        return Ok(Html(LoginTemplate {
            page: ctx.page(),
            errors,
            username,
        })
        .into_response());
    };

    let claim = Claim {
        id: user.id,
        username: user.username,
    };
    let token = state.sessions.issue(&claim)?;
    tracing::info!(user_id = claim.id, "User logged in");

    Ok((
        [(
            header::SET_COOKIE,
            session_cookie(&token, state.sessions.lifetime()),
        )],
        Redirect::to("/"),
    )
        .into_response())
}

// -- Logout --

/// GET /logout: drop the session cookie and go home
pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}
