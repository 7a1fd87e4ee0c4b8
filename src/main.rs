mod config;
mod database;
mod error;
mod model;
mod routes;
mod service;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use std::io;

fn io_error<E: std::fmt::Display>(err: E) -> io::Error {
    log::error!("{}", err);
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("filmorate=debug,actix_web=info"),
    )
    .init();

    let config = Config::load().map_err(io_error)?;
    let db = database::open(&config).map_err(io_error)?;
    let data = web::Data::new(db.clone());

    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(data.clone())
            .configure(routes::configure)
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }
    log::info!("Listening on {}", config.bind);
    server.bind(&config.bind)?.run().await?;

    db.flush().map_err(io_error)?;
    Ok(())
}
