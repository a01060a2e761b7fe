//! # Sister-Board Binary
//!
//! Assembles the forum API and the background maintenance jobs from the
//! configured plugins.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sb_api::{configure_routes, middleware, AppState};
use sb_auth_simple::SimpleAuthProvider;
use sb_config::Settings;
use sb_core::jobs::MaintenanceService;
use sb_db_sqlite::SqliteStore;
use sb_news_currents::CurrentsClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(settings.log.json);
    if let Some(path) = &settings.env_file {
        info!(path = %path.display(), "Loaded .env file");
    }

    // 1. Storage
    let store = SqliteStore::new(&settings.database.url)
        .await
        .context("failed to open database")?;

    // 2. News source; the key only ever comes from settings
    let news_source = CurrentsClient::new(settings.news.api_key.clone())?;

    // 3. Auth
    let auth = SimpleAuthProvider::new(&settings.auth.jwt_secret);

    // 4. Background jobs
    let maintenance = MaintenanceService::new(
        Arc::new(news_source),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    );
    maintenance.start();
    info!(jobs = ?maintenance.job_ids(), "Maintenance jobs scheduled");

    let state = web::Data::new(AppState {
        forum: Arc::new(store.clone()),
        users: Arc::new(store.clone()),
        news: Arc::new(store),
        auth: Arc::new(auth),
    });

    let bind = (settings.server.host.clone(), settings.server.port);
    info!(host = %bind.0, port = bind.1, "Sister-Board starting");

    let served = HttpServer::new(move || {
        App::new()
            .wrap(middleware::standard_middleware())
            .wrap(middleware::security_headers())
            .wrap(middleware::cors_policy())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(bind)
    .context("failed to bind listener")?
    .run()
    .await;

    maintenance.shutdown();
    info!("Sister-Board stopped");
    Ok(served?)
}
