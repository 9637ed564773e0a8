use crate::entity_store::EntityStore;
use crate::error::{Error, Result};
use crate::graph::RelationGraph;
use crate::model::{Film, FilmId, GenreId, Person, PersonId};
use crate::reference::ReferenceCatalog;
use crate::validate;
use log::info;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct FilmCatalog {
    films: Arc<EntityStore<Film>>,
    people: Arc<EntityStore<Person>>,
    graph: Arc<RelationGraph>,
    reference: Arc<ReferenceCatalog>,
}

impl FilmCatalog {
    pub fn new(
        films: Arc<EntityStore<Film>>,
        people: Arc<EntityStore<Person>>,
        graph: Arc<RelationGraph>,
        reference: Arc<ReferenceCatalog>,
    ) -> Self {
        FilmCatalog {
            films,
            people,
            graph,
            reference,
        }
    }

    /// Validates fields, rating and genres, returning the distinct genre ids.
    fn check(&self, film: &Film) -> Result<BTreeSet<GenreId>> {
        validate::film(film, validate::today())?;
        self.reference.rating(film.rating.id)?;
        film.genres
            .iter()
            .map(|genre| self.reference.genre(genre.id).map(|g| g.id))
            .collect()
    }

    /// The stored form carries no derived data.
    fn bare(mut film: Film) -> Film {
        film.genres.clear();
        film.likes.clear();
        film
    }

    fn hydrate(&self, mut film: Film) -> Result<Film> {
        film.likes = self.graph.liker_ids_of(film.id)?;
        film.genres = self
            .graph
            .genre_ids_of(film.id)?
            .into_iter()
            .map(|id| self.reference.genre(id))
            .collect::<Result<_>>()?;
        film.rating = self.reference.rating(film.rating.id)?;
        Ok(film)
    }

    fn ensure_person(&self, id: PersonId) -> Result<()> {
        if !self.people.contains(id)? {
            return Err(Error::NotFound(format!("person with id {} not found", id)));
        }
        Ok(())
    }

    pub fn create(&self, film: Film) -> Result<Film> {
        let genres = self.check(&film)?;
        let created = self.films.create(Self::bare(film))?;
        self.graph.retag_film(created.id, &genres)?;
        info!("film {} created: {:?}", created.id, created.title);
        self.hydrate(created)
    }

    pub fn update(&self, film: Film) -> Result<Film> {
        if film.id == 0 {
            return Err(Error::ConditionsNotMet(
                "cannot update a film with id 0".to_owned(),
            ));
        }
        if !self.films.contains(film.id)? {
            return Err(Error::NotFound(format!("film with id {} not found", film.id)));
        }
        let genres = self.check(&film)?;
        let updated = self.films.update(Self::bare(film))?;
        self.graph.retag_film(updated.id, &genres)?;
        info!("film {} updated", updated.id);
        self.hydrate(updated)
    }

    pub fn get_by_id(&self, id: FilmId) -> Result<Film> {
        self.hydrate(self.films.get(id)?)
    }

    pub fn list(&self) -> Result<Vec<Film>> {
        self.films
            .list()?
            .into_iter()
            .map(|film| self.hydrate(film))
            .collect()
    }

    pub fn delete(&self, id: FilmId) -> Result<()> {
        self.films.delete(id)?;
        self.graph.detach_film(id)?;
        info!("film {} deleted", id);
        Ok(())
    }

    pub fn add_like(&self, film: FilmId, person: PersonId) -> Result<()> {
        self.films.get(film)?;
        self.ensure_person(person)?;
        self.graph.add_like(film, person)?;
        info!("person {} likes film {}", person, film);
        Ok(())
    }

    pub fn remove_like(&self, film: FilmId, person: PersonId) -> Result<()> {
        self.films.get(film)?;
        self.ensure_person(person)?;
        self.graph.remove_like(film, person)?;
        info!("person {} no longer likes film {}", person, film);
        Ok(())
    }

    pub fn liker_ids_of(&self, film: FilmId) -> Result<BTreeSet<PersonId>> {
        self.films.get(film)?;
        self.graph.liker_ids_of(film)
    }

    /// The `count` most liked films. Equal like counts keep the older film first.
    pub fn popular_films(&self, count: usize) -> Result<Vec<Film>> {
        if count < 1 {
            return Err(Error::InvalidArgument(
                "count of popular films must be positive".to_owned(),
            ));
        }
        let likes = self.graph.like_counts()?;
        let mut films = self.films.list()?;
        films.sort_by_key(|film| (Reverse(likes.get(&film.id).copied().unwrap_or(0)), film.id));
        films.truncate(count);
        films.into_iter().map(|film| self.hydrate(film)).collect()
    }
}
