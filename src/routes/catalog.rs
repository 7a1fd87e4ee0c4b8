use super::Db;
use crate::error::Result;
use crate::service::catalog;
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/genres", web::get().to(genres))
        .route("/genres/{id}", web::get().to(genre))
        .route("/mpa", web::get().to(ratings))
        .route("/mpa/{id}", web::get().to(rating));
}

async fn genres(db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog::genres(db.get_ref())?))
}

async fn genre(path: web::Path<u32>, db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog::genre(db.get_ref(), path.into_inner())?))
}

async fn ratings(db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog::ratings(db.get_ref())?))
}

async fn rating(path: web::Path<u32>, db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(catalog::rating(db.get_ref(), path.into_inner())?))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    #[actix_rt::test]
    async fn lookups() {
        let app = test_app!();
        let req = test::TestRequest::get().uri("/genres").to_request();
        let genres: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(genres.as_array().unwrap().len(), 6);

        let req = test::TestRequest::get().uri("/genres/5").to_request();
        let genre: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(genre, json!({ "id": 5, "name": "Documentary" }));

        let req = test::TestRequest::get().uri("/mpa").to_request();
        let ratings: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ratings[4], json!({ "id": 5, "name": "NC-17" }));

        let req = test::TestRequest::get().uri("/mpa/1").to_request();
        let rating: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rating["name"], "G");
    }

    #[actix_rt::test]
    async fn unknown_lookups() {
        let app = test_app!();
        for uri in &["/genres/99", "/mpa/0", "/mpa/x"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
        }
    }
}
