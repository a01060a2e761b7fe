//! # sb-api
//!
//! The web routing and orchestration layer for Sister-Board.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;

pub use error::ApiError;
pub use handlers::AppState;

/// Mounts the forum API under `/api`.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Accounts
            .route("/signup", web::post().to(handlers::signup))
            .route("/login", web::post().to(handlers::login))
            .route("/refresh", web::post().to(handlers::refresh))
            // Posts
            .route("/posts", web::get().to(handlers::list_posts))
            .route("/posts", web::post().to(handlers::create_post))
            .route("/posts/{post_id}", web::get().to(handlers::get_post))
            // Comments
            .route("/posts/{post_id}/comments", web::get().to(handlers::list_comments))
            .route("/posts/{post_id}/comments", web::post().to(handlers::create_comment))
            // Search
            .route("/search", web::get().to(handlers::search_posts))
            .route("/articles", web::get().to(handlers::search_articles)),
    );
}
