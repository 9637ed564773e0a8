//! JSON endpoints over the registry. Handlers only translate between HTTP
//! and catalog calls; every rule lives in the catalogs.

use crate::error::{Error, ErrorKind};
use crate::model::{ContentRating, Film, Genre, Person};
use crate::registry;
use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use log::{debug, error};
use serde::{Deserialize, Serialize};

type Registry = web::Data<registry::Registry>;
type Json<T> = actix_web::Result<web::Json<T>>;

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub description: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument | ErrorKind::ConditionsNotMet => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let category = match self.kind() {
            ErrorKind::NotFound => "not found",
            ErrorKind::InvalidArgument | ErrorKind::ConditionsNotMet => "validation failed",
            ErrorKind::Internal => "internal server error",
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: category.to_owned(),
            description: self.to_string(),
        })
    }
}

fn log_error(err: Error) -> actix_web::Error {
    match err.kind() {
        ErrorKind::Internal => error!("{:?}", err),
        _ => debug!("{}", err),
    }
    err.into()
}

async fn list_people(registry: Registry) -> Json<Vec<Person>> {
    Ok(web::Json(registry.people.list().map_err(log_error)?))
}

async fn get_person(registry: Registry, id: web::Path<u64>) -> Json<Person> {
    let person = registry
        .people
        .get_by_id(id.into_inner())
        .map_err(log_error)?;
    Ok(web::Json(person))
}

async fn create_person(registry: Registry, person: web::Json<Person>) -> Json<Person> {
    let person = registry
        .people
        .create(person.into_inner())
        .map_err(log_error)?;
    Ok(web::Json(person))
}

async fn update_person(registry: Registry, person: web::Json<Person>) -> Json<Person> {
    let person = registry
        .people
        .update(person.into_inner())
        .map_err(log_error)?;
    Ok(web::Json(person))
}

async fn delete_person(registry: Registry, id: web::Path<u64>) -> actix_web::Result<HttpResponse> {
    registry
        .people
        .delete(id.into_inner())
        .map_err(log_error)?;
    Ok(HttpResponse::Ok().finish())
}

async fn add_friend(registry: Registry, ids: web::Path<(u64, u64)>) -> actix_web::Result<HttpResponse> {
    let (id, friend_id) = ids.into_inner();
    registry
        .people
        .add_friend(id, friend_id)
        .map_err(log_error)?;
    Ok(HttpResponse::Ok().finish())
}

async fn remove_friend(
    registry: Registry,
    ids: web::Path<(u64, u64)>,
) -> actix_web::Result<HttpResponse> {
    let (id, friend_id) = ids.into_inner();
    registry
        .people
        .remove_friend(id, friend_id)
        .map_err(log_error)?;
    Ok(HttpResponse::Ok().finish())
}

async fn friends(registry: Registry, id: web::Path<u64>) -> Json<Vec<Person>> {
    let friends = registry
        .people
        .friends_of(id.into_inner())
        .map_err(log_error)?;
    Ok(web::Json(friends))
}

async fn mutual_friends(registry: Registry, ids: web::Path<(u64, u64)>) -> Json<Vec<Person>> {
    let (id, other_id) = ids.into_inner();
    let friends = registry
        .people
        .mutual_friends_of(id, other_id)
        .map_err(log_error)?;
    Ok(web::Json(friends))
}

async fn list_films(registry: Registry) -> Json<Vec<Film>> {
    Ok(web::Json(registry.films.list().map_err(log_error)?))
}

async fn get_film(registry: Registry, id: web::Path<u64>) -> Json<Film> {
    let film = registry
        .films
        .get_by_id(id.into_inner())
        .map_err(log_error)?;
    Ok(web::Json(film))
}

async fn create_film(registry: Registry, film: web::Json<Film>) -> Json<Film> {
    let film = registry.films.create(film.into_inner()).map_err(log_error)?;
    Ok(web::Json(film))
}

async fn update_film(registry: Registry, film: web::Json<Film>) -> Json<Film> {
    let film = registry.films.update(film.into_inner()).map_err(log_error)?;
    Ok(web::Json(film))
}

async fn delete_film(registry: Registry, id: web::Path<u64>) -> actix_web::Result<HttpResponse> {
    registry.films.delete(id.into_inner()).map_err(log_error)?;
    Ok(HttpResponse::Ok().finish())
}

async fn add_like(registry: Registry, ids: web::Path<(u64, u64)>) -> actix_web::Result<HttpResponse> {
    let (id, user_id) = ids.into_inner();
    registry.films.add_like(id, user_id).map_err(log_error)?;
    Ok(HttpResponse::Ok().finish())
}

async fn remove_like(
    registry: Registry,
    ids: web::Path<(u64, u64)>,
) -> actix_web::Result<HttpResponse> {
    let (id, user_id) = ids.into_inner();
    registry.films.remove_like(id, user_id).map_err(log_error)?;
    Ok(HttpResponse::Ok().finish())
}

fn default_count() -> usize {
    10
}

#[derive(Deserialize)]
struct PopularParams {
    #[serde(default = "default_count")]
    count: usize,
}

async fn popular_films(registry: Registry, params: web::Query<PopularParams>) -> Json<Vec<Film>> {
    let films = registry
        .films
        .popular_films(params.count)
        .map_err(log_error)?;
    Ok(web::Json(films))
}

async fn list_genres(registry: Registry) -> Json<Vec<Genre>> {
    Ok(web::Json(registry.reference.genres()))
}

async fn get_genre(registry: Registry, id: web::Path<i32>) -> Json<Genre> {
    let genre = registry
        .reference
        .genre(id.into_inner())
        .map_err(log_error)?;
    Ok(web::Json(genre))
}

async fn list_ratings(registry: Registry) -> Json<Vec<ContentRating>> {
    Ok(web::Json(registry.reference.ratings()))
}

async fn get_rating(registry: Registry, id: web::Path<i32>) -> Json<ContentRating> {
    let rating = registry
        .reference
        .rating(id.into_inner())
        .map_err(log_error)?;
    Ok(web::Json(rating))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::get().to(list_people))
        .route("/users", web::post().to(create_person))
        .route("/users", web::put().to(update_person))
        .route("/users/{id}", web::get().to(get_person))
        .route("/users/{id}", web::delete().to(delete_person))
        .route("/users/{id}/friends", web::get().to(friends))
        .route("/users/{id}/friends/{friend_id}", web::put().to(add_friend))
        .route("/users/{id}/friends/{friend_id}", web::delete().to(remove_friend))
        .route(
            "/users/{id}/friends/common/{other_id}",
            web::get().to(mutual_friends),
        )
        // before /films/{id}, which would otherwise claim "popular"
        .route("/films/popular", web::get().to(popular_films))
        .route("/films", web::get().to(list_films))
        .route("/films", web::post().to(create_film))
        .route("/films", web::put().to(update_film))
        .route("/films/{id}", web::get().to(get_film))
        .route("/films/{id}", web::delete().to(delete_film))
        .route("/films/{id}/like/{user_id}", web::put().to(add_like))
        .route("/films/{id}/like/{user_id}", web::delete().to(remove_like))
        .route("/genres", web::get().to(list_genres))
        .route("/genres/{id}", web::get().to(get_genre))
        .route("/mpa", web::get().to(list_ratings))
        .route("/mpa/{id}", web::get().to(get_rating));
}
