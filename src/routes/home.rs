use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::auth::handlers::RegisterTemplate;
use crate::db::models::Post;
use crate::error::AppResult;
use crate::extractors::RequestContext;
use crate::routes::{Html, Page};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/dashboard.html")]
pub struct DashboardTemplate {
    pub page: Page,
    pub posts: Vec<Post>,
}

/// GET /: the visitor's own posts, or the registration form for strangers
pub async fn index(State(state): State<AppState>, ctx: RequestContext) -> AppResult<Response> {
    let Some(claim) = &ctx.auth else {
        return Ok(Html(RegisterTemplate::empty(ctx.page())).into_response());
    };

    let posts = state.posts.list_posts_by_author(claim.id).await?;

    Ok(Html(DashboardTemplate {
        page: ctx.page(),
        posts,
    })
    .into_response())
}
