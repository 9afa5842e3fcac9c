use server::data::state::HttpState;
use server::repo::database::base::DataBase;
use server::repo::database::sqlite::SqliteDatabase;
use server::repo::handlers::cleanup::{spawn_cleanup, CLEANUP_EVERY, STALE_AFTER};
use server::repo::http::configure;

use std::env;
use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{middleware, App, HttpServer};
use anyhow::Context;

const DEFAULT_DATABASE_URL: &str = "sqlite://locations.db";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8000";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    pretty_env_logger::init();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());

    let database: Arc<dyn DataBase> = Arc::new(
        SqliteDatabase::connect(&database_url)
            .await
            .with_context(|| format!("opening {}", database_url))?,
    );

    log::info!("using database {}", database_url);

    let cleanup = spawn_cleanup(Arc::clone(&database), CLEANUP_EVERY, STALE_AFTER);

    let state = Data::new(HttpState { database });

    log::info!("listening on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("binding {}", bind_address))?
    .run()
    .await?;

    cleanup.abort();

    Ok(())
}
