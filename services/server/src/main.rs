use std::io;

use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use dotenvy::dotenv;
use log::info;
use sqlx::postgres::PgPoolOptions;

use lottery_server::config::Config;
use lottery_server::routes::routes;

fn invalid_input<E: std::error::Error + Send + Sync + 'static>(e: E) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e)
}

async fn run() -> io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(invalid_input)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
    info!("Connected to Postgres");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    info!("Database migrations applied");

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let bind_addr = (config.host.clone(), config.port);
    let upload_dir = config.upload_dir.clone();
    let pool = web::Data::new(pool);
    let config = web::Data::new(config);

    info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .app_data(pool.clone())
            .app_data(config.clone())
            .configure(|cfg| routes(cfg, &upload_dir))
    })
    .bind(bind_addr)?
    .run()
    .await
}

fn main() -> io::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run())
}
