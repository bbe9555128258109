use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::db::models::Post;
use crate::error::{AppError, AppResult};
use crate::extractors::{CsrfForm, PostIdParam, RequestContext};
use crate::routes::{Html, Page};
use crate::state::AppState;
use crate::validation;

#[derive(Template)]
#[template(path = "pages/create_post.html")]
struct CreatePostTemplate {
    page: Page,
    errors: Vec<String>,
    title: String,
    content: String,
}

#[derive(Template)]
#[template(path = "pages/post.html")]
struct PostTemplate {
    page: Page,
    post: Post,
}

#[derive(Template)]
#[template(path = "pages/edit_post.html")]
struct EditPostTemplate {
    page: Page,
    errors: Vec<String>,
    post_id: i64,
    title: String,
    content: String,
}

/// Load a post the caller owns. Unparseable ids, missing rows and other
/// people's posts all collapse into `NotFound`.
async fn owned_post(state: &AppState, post_id: PostIdParam, author_id: i64) -> AppResult<Post> {
    let PostIdParam(Some(post_id)) = post_id else {
        return Err(AppError::NotFound);
    };
    state
        .posts
        .find_post_by_id_and_author(post_id, author_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// GET /create-post: anonymous visitors are sent to the login page
async fn create_post_page(ctx: RequestContext) -> Response {
    if ctx.auth.is_none() {
        return Redirect::to("/login").into_response();
    }

    Html(CreatePostTemplate {
        page: ctx.page(),
        errors: Vec::new(),
        title: String::new(),
        content: String::new(),
    })
    .into_response()
}

/// POST /create-post
async fn create_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    CsrfForm(form): CsrfForm,
) -> AppResult<Response> {
    let claim = ctx.require_user()?;
    let title = form.text("title").trim().to_string();
    let content = form.text("content");

    let errors = validation::post_errors(&title, &content);
    if !errors.is_empty() {
        return Ok(Html(CreatePostTemplate {
            page: ctx.page(),
            errors,
            title,
            content,
        })
        .into_response());
    }

    let post = state.posts.create_post(&title, &content, claim.id).await?;
    tracing::info!(post_id = post.post_id, user_id = claim.id, "Created post");

    Ok(Redirect::to(&format!("/post/{}", post.post_id)).into_response())
}

/// GET /post/{post_id}
async fn view_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    post_id: PostIdParam,
) -> AppResult<Response> {
    let claim = ctx.require_user()?;
    let post = owned_post(&state, post_id, claim.id).await?;

    Ok(Html(PostTemplate {
        page: ctx.page(),
        post,
    })
    .into_response())
}

/// GET /post/edit/{post_id}
async fn edit_post_page(
    State(state): State<AppState>,
    ctx: RequestContext,
    post_id: PostIdParam,
) -> AppResult<Response> {
    let claim = ctx.require_user()?;
    let post = owned_post(&state, post_id, claim.id).await?;

    Ok(Html(EditPostTemplate {
        page: ctx.page(),
        errors: Vec::new(),
        post_id: post.post_id,
        title: post.title,
        content: post.content,
    })
    .into_response())
}

/// POST /post/edit/{post_id}
async fn edit_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    post_id: PostIdParam,
    CsrfForm(form): CsrfForm,
) -> AppResult<Response> {
    let claim = ctx.require_user()?;
    let existing = owned_post(&state, post_id, claim.id).await?;

    let title = form.text("title").trim().to_string();
    let content = form.text("content");

    let errors = validation::post_errors(&title, &content);
    if !errors.is_empty() {
        return Ok(Html(EditPostTemplate {
            page: ctx.page(),
            errors,
            post_id: existing.post_id,
            title,
            content,
        })
        .into_response());
    }

    state
        .posts
        .update_post(existing.post_id, claim.id, &title, &content)
        .await?;
    tracing::info!(post_id = existing.post_id, user_id = claim.id, "Updated post");

    Ok(Redirect::to(&format!("/post/{}", existing.post_id)).into_response())
}

/// POST /post/delete/{post_id}
async fn delete_post(
    State(state): State<AppState>,
    ctx: RequestContext,
    post_id: PostIdParam,
    CsrfForm(_form): CsrfForm,
) -> AppResult<Response> {
    let claim = ctx.require_user()?;
    let existing = owned_post(&state, post_id, claim.id).await?;

    state.posts.delete_post(existing.post_id, claim.id).await?;
    tracing::info!(post_id = existing.post_id, user_id = claim.id, "Deleted post");

    Ok(Redirect::to("/").into_response())
}

/// Post router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-post", get(create_post_page).post(create_post))
        .route("/post/{post_id}", get(view_post))
        .route("/post/edit/{post_id}", get(edit_post_page).post(edit_post))
        .route("/post/delete/{post_id}", post(delete_post))
}
