use super::Db;
use crate::error::Result;
use crate::model::User;
use crate::service::users;
use actix_web::{web, HttpResponse};
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users")
            .route(web::get().to(find_all))
            .route(web::post().to(create))
            .route(web::put().to(update)),
    )
    .service(
        web::resource("/users/{id}")
            .route(web::get().to(find_by_id))
            .route(web::delete().to(delete)),
    )
    .route("/users/{id}/friends", web::get().to(friends))
    .route(
        "/users/{id}/friends/common/{other_id}",
        web::get().to(common_friends),
    )
    .service(
        web::resource("/users/{id}/friends/{friend_id}")
            .route(web::put().to(add_friend))
            .route(web::delete().to(remove_friend)),
    );
}

async fn find_all(db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(users::all(db.get_ref())?))
}

async fn create(user: web::Json<User>, db: Db) -> Result<HttpResponse> {
    let user = user.into_inner();
    user.validate()?;
    Ok(HttpResponse::Created().json(users::create(db.get_ref(), user)?))
}

async fn update(user: web::Json<User>, db: Db) -> Result<HttpResponse> {
    let user = user.into_inner();
    user.validate()?;
    Ok(HttpResponse::Ok().json(users::update(db.get_ref(), user)?))
}

async fn find_by_id(path: web::Path<u64>, db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(users::find(db.get_ref(), path.into_inner())?))
}

async fn delete(path: web::Path<u64>, db: Db) -> Result<HttpResponse> {
    users::delete(db.get_ref(), path.into_inner())?;
    Ok(HttpResponse::Ok().finish())
}

async fn friends(path: web::Path<u64>, db: Db) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(users::friends(db.get_ref(), path.into_inner())?))
}

async fn common_friends(path: web::Path<(u64, u64)>, db: Db) -> Result<HttpResponse> {
    let (id, other_id) = path.into_inner();
    Ok(HttpResponse::Ok().json(users::common_friends(db.get_ref(), id, other_id)?))
}

async fn add_friend(path: web::Path<(u64, u64)>, db: Db) -> Result<HttpResponse> {
    let (id, friend_id) = path.into_inner();
    users::add_friend(db.get_ref(), id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn remove_friend(path: web::Path<(u64, u64)>, db: Db) -> Result<HttpResponse> {
    let (id, friend_id) = path.into_inner();
    users::remove_friend(db.get_ref(), id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};

    fn mike_json() -> Value {
        json!({
            "email": "mike@mail.ru",
            "login": "Mike123",
            "name": "Mike",
            "birthday": "2000-04-05"
        })
    }

    #[actix_rt::test]
    async fn create_and_get_user() {
        let app = test_app!();
        let req = test::TestRequest::post().uri("/users").set_json(mike_json()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["login"], "Mike123");
        let id = created["id"].as_u64().unwrap();
        assert_eq!(id, 1);

        let req = test::TestRequest::get().uri(&format!("/users/{}", id)).to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found, created);

        let req = test::TestRequest::get().uri("/users").to_request();
        let all: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[actix_rt::test]
    async fn blank_name_is_filled_from_login() {
        let app = test_app!();
        let mut body = mike_json();
        body["name"] = json!("");
        let req = test::TestRequest::post().uri("/users").set_json(&body).to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["name"], "Mike123");
    }

    #[actix_rt::test]
    async fn invalid_user_is_rejected() {
        let app = test_app!();
        let mut body = mike_json();
        body["login"] = json!("Mike Smith");
        body["birthday"] = json!("2999-01-01");
        let req = test::TestRequest::post().uri("/users").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: Value = test::read_body_json(resp).await;
        assert_eq!(error["violations"].as_array().unwrap().len(), 2);

        let mut body = mike_json();
        body["email"] = json!("миша@почта.ru");
        let req = test::TestRequest::post().uri("/users").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: Value = test::read_body_json(resp).await;
        assert_eq!(
            error["violations"],
            json!([{ "field": "email", "message": "Email should be valid" }])
        );

        let req = test::TestRequest::post()
            .uri("/users")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn unknown_user() {
        let app = test_app!();
        let req = test::TestRequest::get().uri("/users/99").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let mut body = mike_json();
        body["id"] = json!(99);
        let req = test::TestRequest::put().uri("/users").set_json(&body).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri("/users/99").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn delete_reports_second_attempt() {
        let app = test_app!();
        let req = test::TestRequest::post().uri("/users").set_json(mike_json()).to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/users/{}", created["id"]);

        let req = test::TestRequest::delete().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::delete().uri(&uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn friends_and_common_friends() {
        let app = test_app!();
        let mut ids = Vec::new();
        for login in &["Mike", "Tom", "Kate"] {
            let mut body = mike_json();
            body["login"] = json!(login);
            let req = test::TestRequest::post().uri("/users").set_json(&body).to_request();
            let created: Value = test::call_and_read_body_json(&app, req).await;
            ids.push(created["id"].as_u64().unwrap());
        }
        let (mike, tom, kate) = (ids[0], ids[1], ids[2]);

        for (from, to) in &[(mike, kate), (tom, kate), (mike, tom)] {
            let req = test::TestRequest::put()
                .uri(&format!("/users/{}/friends/{}", from, to))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/users/{}/friends", mike))
            .to_request();
        let friends: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(friends.as_array().unwrap().len(), 2);

        let req = test::TestRequest::get()
            .uri(&format!("/users/{}/friends/common/{}", mike, tom))
            .to_request();
        let common: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(common.as_array().unwrap().len(), 1);
        assert_eq!(common[0]["id"].as_u64(), Some(kate));

        let req = test::TestRequest::delete()
            .uri(&format!("/users/{}/friends/{}", mike, kate))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::delete()
            .uri(&format!("/users/{}/friends/{}", mike, kate))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put()
            .uri(&format!("/users/{}/friends/{}", mike, 999))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
