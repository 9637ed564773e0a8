use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::NaiveDate;
use cinegraph::config::Settings;
use cinegraph::model::{ContentRating, Film, Genre, Person};
use cinegraph::reference::ReferenceCatalog;
use cinegraph::{http, Registry};
use log::info;
use std::io;

fn to_io(err: cinegraph::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

fn date(y: i32, m: u32, d: u32) -> cinegraph::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| cinegraph::Error::InvalidArgument(format!("{}-{}-{} is not a date", y, m, d)))
}

fn seed(registry: &Registry) -> cinegraph::Result<()> {
    let admin = registry.people.create(Person {
        id: 0,
        email: "admin@example.com".to_owned(),
        login: "admin".to_owned(),
        display_name: String::new(),
        birth_date: date(1980, 1, 1)?,
        friends: Default::default(),
    })?;
    let foo = registry.people.create(Person {
        id: 0,
        email: "foo@example.com".to_owned(),
        login: "foo".to_owned(),
        display_name: "Foo".to_owned(),
        birth_date: date(1992, 7, 14)?,
        friends: Default::default(),
    })?;
    let pulp_fiction = registry.films.create(Film {
        id: 0,
        title: "Pulp Fiction".to_owned(),
        description: "The lives of two mob hitmen, a boxer and a pair of diner bandits intertwine."
            .to_owned(),
        release_date: date(1994, 5, 21)?,
        duration_minutes: 154,
        rating: ContentRating::new(4, ""),
        genres: vec![Genre::new(2, ""), Genre::new(4, "")],
        likes: Default::default(),
    })?;
    registry.people.add_friend(foo.id, admin.id)?;
    registry.films.add_like(pulp_fiction.id, admin.id)?;
    info!("seeded demo data");
    Ok(())
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    let settings = Settings::load();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log))
        .init();

    let backend = settings.open_backend().map_err(to_io)?;
    let registry = Registry::open(backend, ReferenceCatalog::standard()).map_err(to_io)?;
    if settings.seed {
        seed(&registry).map_err(to_io)?;
    }
    let registry = web::Data::new(registry);

    info!("listening on {}", settings.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(registry.clone())
            .configure(http::configure)
    })
    .bind(&settings.bind)?
    .run()
    .await
}
