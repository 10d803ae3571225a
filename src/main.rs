use axum::{
    extract::Extension,
    routing::{get, get_service},
    Router,
};
use diesel::{
    r2d2::{ConnectionManager, Pool},
    SqliteConnection,
};
use std::sync::Arc;
use tera::Tera;
use time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

mod config;
mod data;
mod features;
mod handlers;
mod schema;
mod utils;

use data::repositories::SqliteWordStore;
use features::review::ReviewService;
use handlers::{auth, pages, review, vocabulary};

type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = config::Config::load();

    // Database configuration
    let pool = data::db::init_pool(&config.database_url, config.db_pool_size)?;
    {
        let mut conn = pool.get()?;
        data::db::create_schema(&mut conn)?;
    }
    let word_store = SqliteWordStore::new(pool.clone());

    // Templates configuration
    let templates = Arc::new(Tera::new(&config.templates_glob)?);

    // Sessions configuration
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)))
        .with_secure(false);

    let review_service = ReviewService::new(
        Arc::new(word_store.clone()),
        config.store_timeout,
        config.review_page_size,
    );

    // Combined API router
    let api_router = Router::new()
        .merge(vocabulary::vocabulary_router(word_store))
        .nest("/review", review::review_router(review_service));

    // Auth router
    let auth_router = Router::new()
        .merge(auth::login::auth_router(pool.clone(), templates.clone()))
        .merge(auth::register::auth_router(pool.clone(), templates.clone()));

    // Main application router
    let app = Router::new()
        .route("/", get(pages::home))
        .route("/vocabulary", get(pages::vocabulary_page))
        .route("/review", get(pages::review_page))
        .nest("/auth", auth_router)
        .nest("/api", api_router)
        .nest_service("/static", get_service(ServeDir::new(&config.static_dir)))
        .layer(Extension(templates))
        .layer(session_layer);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    log::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
