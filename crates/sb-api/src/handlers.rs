//! # sb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and Core traits.

use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{TimeDelta, Utc};
use sb_core::error::AppError;
use sb_core::models::{NewComment, NewPost, PostView};
use sb_core::traits::{AuthProvider, ForumRepo, NewsStore, TokenKind, UserRepo};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiError;

const LOGIN_ACCESS_TTL_MINUTES: i64 = 15;
const REFRESH_TTL_HOURS: i64 = 2;
const REFRESHED_ACCESS_TTL_HOURS: i64 = 2;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub forum: Arc<dyn ForumRepo>,
    pub users: Arc<dyn UserRepo>,
    pub news: Arc<dyn NewsStore>,
    pub auth: Arc<dyn AuthProvider>,
}

type ApiResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Extracts and verifies the `Authorization: Bearer` token.
fn bearer_user(req: &HttpRequest, auth: &dyn AuthProvider, kind: TokenKind) -> Result<i64, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;
    Ok(auth.verify_token(token, kind)?)
}

pub async fn signup(data: web::Data<AppState>, body: web::Json<Credentials>) -> ApiResult {
    let Credentials { username, password } = body.into_inner();
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AppError::ValidationError("username and password are required".into()).into());
    }

    if data.users.find_by_username(username).await?.is_some() {
        return Err(AppError::Conflict("username already exists".into()).into());
    }

    let hash = data.auth.hash_password(&password)?;
    let user = data.users.create_user(username, &hash).await?;
    let access_token = data.auth.issue_token(
        user.id,
        TokenKind::Access,
        TimeDelta::minutes(LOGIN_ACCESS_TTL_MINUTES),
    )?;

    info!(user_id = user.id, "User signed up");
    Ok(HttpResponse::Created().json(json!({
        "message": "User created successfully.",
        "access_token": access_token,
    })))
}

pub async fn login(data: web::Data<AppState>, body: web::Json<Credentials>) -> ApiResult {
    let Credentials { username, password } = body.into_inner();
    let rejected = || ApiError::from(AppError::Unauthorized("bad username or password".into()));

    let user = data
        .users
        .find_by_username(username.trim())
        .await?
        .ok_or_else(rejected)?;
    if !data.auth.verify_password(&password, &user.password_hash).await {
        return Err(rejected());
    }

    let access_token = data.auth.issue_token(
        user.id,
        TokenKind::Access,
        TimeDelta::minutes(LOGIN_ACCESS_TTL_MINUTES),
    )?;
    let refresh_token =
        data.auth
            .issue_token(user.id, TokenKind::Refresh, TimeDelta::hours(REFRESH_TTL_HOURS))?;

    Ok(HttpResponse::Ok().json(json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "user_id": user.id,
    })))
}

/// Trades a refresh token for a new access token.
pub async fn refresh(data: web::Data<AppState>, req: HttpRequest) -> ApiResult {
    let user_id = bearer_user(&req, data.auth.as_ref(), TokenKind::Refresh)?;
    let access_token = data.auth.issue_token(
        user_id,
        TokenKind::Access,
        TimeDelta::hours(REFRESHED_ACCESS_TTL_HOURS),
    )?;
    Ok(HttpResponse::Ok().json(json!({ "access_token": access_token })))
}

pub async fn list_posts(data: web::Data<AppState>) -> ApiResult {
    let posts = data.forum.list_posts().await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn create_post(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<PostForm>,
) -> ApiResult {
    let user_id = bearer_user(&req, data.auth.as_ref(), TokenKind::Access)?;
    let PostForm { title, content, category } = body.into_inner();
    if [&title, &content, &category].iter().any(|f| f.trim().is_empty()) {
        return Err(AppError::Unprocessable("title, content, and category are required".into()).into());
    }

    let user = data
        .users
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User".into(), user_id.to_string()))?;

    let post = data
        .forum
        .create_post(NewPost {
            title,
            content,
            category,
            user_id,
            created_at: Utc::now(),
        })
        .await?;

    info!(post_id = post.id, user_id, "Post created");
    let view = PostView {
        id: post.id,
        title: post.title,
        content: post.content,
        author: user.username,
        created_at: post.created_at,
        category: post.category,
    };
    Ok(HttpResponse::Created().json(json!({
        "message": "Post created successfully.",
        "post": view,
    })))
}

pub async fn get_post(data: web::Data<AppState>, path: web::Path<i64>) -> ApiResult {
    let post_id = path.into_inner();
    let post = data
        .forum
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post".into(), post_id.to_string()))?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn list_comments(data: web::Data<AppState>, path: web::Path<i64>) -> ApiResult {
    let comments = data.forum.list_comments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn create_comment(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<CommentForm>,
) -> ApiResult {
    let user_id = bearer_user(&req, data.auth.as_ref(), TokenKind::Access)?;
    let post_id = path.into_inner();
    let content = body.into_inner().content;
    if content.trim().is_empty() {
        return Err(AppError::ValidationError("content is required".into()).into());
    }

    if data.forum.get_post(post_id).await?.is_none() {
        return Err(AppError::NotFound("Post".into(), post_id.to_string()).into());
    }
    if data.users.get_user(user_id).await?.is_none() {
        return Err(AppError::NotFound("User".into(), user_id.to_string()).into());
    }

    let comment = data
        .forum
        .create_comment(NewComment {
            content,
            user_id,
            post_id,
            created_at: Utc::now(),
        })
        .await?;

    info!(comment_id = comment.id, post_id, user_id, "Comment added");
    Ok(HttpResponse::Created().json(json!({ "message": "Comment added successfully." })))
}

pub async fn search_posts(data: web::Data<AppState>, query: web::Query<SearchQuery>) -> ApiResult {
    let posts = data.forum.search_posts(&query.q).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Lists cached news articles whose title matches `q`.
pub async fn search_articles(data: web::Data<AppState>, query: web::Query<SearchQuery>) -> ApiResult {
    let articles = data.news.search_articles(&query.q).await?;
    Ok(HttpResponse::Ok().json(articles))
}
