use super::Db;
use crate::error::Result;
use crate::model::Film;
use crate::service::films::{self, DEFAULT_POPULAR_COUNT};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Registered before `/films/{id}`, which would otherwise claim "popular".
    cfg.route("/films/popular", web::get().to(popular))
        .service(
            web::resource("/films")
                .route(web::get().to(find_all))
                .route(web::post().to(create))
                .route(web::put().to(update)),
        )
        .service(
            web::resource("/films/{id}")
                .route(web::get().to(find_by_id))
                .route(web::delete().to(delete)),
        )
        .service(
            web::resource("/films/{id}/like/{user_id}")
                .route(web::put().to(like))
                .route(web::delete().to(unlike)),
        );
}

#[derive(Deserialize)]
struct PopularParams {
    count: Option<usize>,
}

async fn find_all(db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films::all(db.get_ref())?))
}

async fn create(film: web::Json<Film>, db: Db) -> Result<HttpResponse> {
    let film = film.into_inner();
    film.validate()?;
    Ok(HttpResponse::Created().json(films::create(db.get_ref(), film)?))
}

async fn update(film: web::Json<Film>, db: Db) -> Result<HttpResponse> {
    let film = film.into_inner();
    film.validate()?;
    Ok(HttpResponse::Ok().json(films::update(db.get_ref(), film)?))
}

async fn find_by_id(path: web::Path<u64>, db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(films::find(db.get_ref(), path.into_inner())?))
}

async fn delete(path: web::Path<u64>, db: Db) -> Result<HttpResponse> {
    films::delete(db.get_ref(), path.into_inner())?;
    Ok(HttpResponse::Ok().finish())
}

async fn like(path: web::Path<(u64, u64)>, db: Db) -> Result<HttpResponse> {
    let (id, user_id) = path.into_inner();
    films::like(db.get_ref(), id, user_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn unlike(path: web::Path<(u64, u64)>, db: Db) -> Result<HttpResponse> {
    let (id, user_id) = path.into_inner();
    films::unlike(db.get_ref(), id, user_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn popular(params: web::Query<PopularParams>, db: Db) -> Result<HttpResponse> {
    let count = params.count.unwrap_or(DEFAULT_POPULAR_COUNT);
    Ok(HttpResponse::Ok().json(films::popular(db.get_ref(), count)?))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    fn pirates() -> Value {
        json!({
            "name": "Pirates of the Caribbean: The Curse of the Black Pearl",
            "description": "American fantasy swashbuckler film",
            "duration": 143,
            "releaseDate": "2003-07-09",
            "mpa": { "id": 2 },
            "genres": [{ "id": 2 }, { "id": 1 }, { "id": 2 }]
        })
    }

    #[actix_rt::test]
    async fn create_fills_lookup_names() {
        let app = test_app!();
        let req = test::TestRequest::post().uri("/films").set_json(pirates()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["id"], 1);
        assert_eq!(created["mpa"], json!({ "id": 2, "name": "PG" }));
        assert_eq!(
            created["genres"],
            json!([{ "id": 1, "name": "Comedy" }, { "id": 2, "name": "Drama" }])
        );
        assert_eq!(created["likes_count"], 0);

        let req = test::TestRequest::get()
            .uri(&format!("/films/{}", created["id"]))
            .to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found, created);
    }

    #[actix_rt::test]
    async fn invalid_film_is_rejected() {
        let app = test_app!();
        let mut body = pirates();
        body["releaseDate"] = json!("1895-12-28");
        body["description"] = json!("x".repeat(201));
        let req = test::TestRequest::post().uri("/films").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: Value = test::read_body_json(resp).await;
        assert_eq!(error["violations"].as_array().unwrap().len(), 2);

        let mut body = pirates();
        body["mpa"] = json!({ "id": 42 });
        let req = test::TestRequest::post().uri("/films").set_json(&body).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn update_missing_film() {
        let app = test_app!();
        let mut body = pirates();
        body["id"] = json!(77);
        let req = test::TestRequest::put().uri("/films").set_json(&body).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn likes_and_popular() {
        let app = test_app!();
        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(json!({
                "email": "mike@mail.ru",
                "login": "Mike123",
                "birthday": "2000-04-05"
            }))
            .to_request();
        let user: Value = test::call_and_read_body_json(&app, req).await;

        let mut film_ids = Vec::new();
        for _ in 0..3 {
            let req = test::TestRequest::post().uri("/films").set_json(pirates()).to_request();
            let film: Value = test::call_and_read_body_json(&app, req).await;
            film_ids.push(film["id"].as_u64().unwrap());
        }

        let like_uri = format!("/films/{}/like/{}", film_ids[1], user["id"]);
        let req = test::TestRequest::put().uri(&like_uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/films/popular?count=2").to_request();
        let popular: Value = test::call_and_read_body_json(&app, req).await;
        let popular = popular.as_array().unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0]["id"].as_u64(), Some(film_ids[1]));
        assert_eq!(popular[0]["likes_count"], 1);
        assert_eq!(popular[1]["id"].as_u64(), Some(film_ids[0]));

        let req = test::TestRequest::get().uri("/films/popular").to_request();
        let popular: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(popular.as_array().unwrap().len(), 3);

        let req = test::TestRequest::get().uri("/films/popular?count=0").to_request();
        let none: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(none, json!([]));
        let req = test::TestRequest::get().uri("/films/popular?count=-1").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete().uri(&like_uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::delete().uri(&like_uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put()
            .uri(&format!("/films/{}/like/999", film_ids[0]))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn delete_film() {
        let app = test_app!();
        let req = test::TestRequest::post().uri("/films").set_json(pirates()).to_request();
        let film: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/films/{}", film["id"]);

        let req = test::TestRequest::delete().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::get().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        let req = test::TestRequest::get().uri("/films").to_request();
        let all: Value = test::call_and_read_body_json(&app, req).await;
        assert!(all.as_array().unwrap().is_empty());
    }
}
