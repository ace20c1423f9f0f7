mod auth;
mod booking;
mod catalog;
mod db;
mod models;
mod routes;
mod schedule;
mod staff;
mod state;
mod store;
mod templates;
mod timeutil;

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::staff::StaticRoster;
use crate::state::AppState;
use crate::store::{ChangeBus, SqliteKvStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let db_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/salondesk.db".to_string());
    db::ensure_sqlite_dir(&db_url)?;

    let connect_options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;

    db::init_schema(&pool).await?;

    let admin_pass = env::var("ADMIN_PASS").unwrap_or_else(|_| "admin123".to_string());
    if admin_pass == "admin123" {
        log::warn!("ADMIN_PASS not set. Using the default admin password. Set ADMIN_PASS in production.");
    }

    let state = AppState {
        store: Arc::new(SqliteKvStore::new(pool)),
        bus: ChangeBus::new(),
        staff: Arc::new(StaticRoster),
        admin_pass,
    };

    state.services().seed_if_empty().await?;

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);

    let address = format!("0.0.0.0:{port}");
    log::info!("Starting SalonDesk on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .configure(routes::public::configure)
            .configure(routes::admin::configure)
            .configure(routes::events::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
