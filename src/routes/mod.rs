#[cfg(test)]
macro_rules! test_app {
    () => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(crate::database::temporary()))
                .configure(crate::routes::configure),
        )
        .await
    };
}

mod catalog;
mod films;
mod users;

use crate::error::Error;
use actix_web::web;

type Db = web::Data<sled::Db>;

/// Registers every endpoint together with the extractor error handlers, so
/// malformed bodies and queries answer with the same JSON errors as the rest.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| Error::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| Error::BadRequest(err.to_string()).into()),
    )
    .configure(users::configure)
    .configure(films::configure)
    .configure(catalog::configure);
}
