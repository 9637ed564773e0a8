use crate::error::{Error, Result};
use crate::model::{ContentRating, Genre, GenreId, RatingId};
use std::collections::BTreeMap;

/// Fixed genre and content rating vocabularies. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    genres: BTreeMap<GenreId, Genre>,
    ratings: BTreeMap<RatingId, ContentRating>,
}

impl ReferenceCatalog {
    pub fn new(
        genres: impl IntoIterator<Item = Genre>,
        ratings: impl IntoIterator<Item = ContentRating>,
    ) -> Self {
        ReferenceCatalog {
            genres: genres.into_iter().map(|g| (g.id, g)).collect(),
            ratings: ratings.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    pub fn standard() -> Self {
        Self::new(
            vec![
                Genre::new(1, "Comedy"),
                Genre::new(2, "Drama"),
                Genre::new(3, "Animation"),
                Genre::new(4, "Thriller"),
                Genre::new(5, "Documentary"),
                Genre::new(6, "Action"),
            ],
            vec![
                ContentRating::new(1, "G"),
                ContentRating::new(2, "PG"),
                ContentRating::new(3, "PG-13"),
                ContentRating::new(4, "R"),
                ContentRating::new(5, "NC-17"),
            ],
        )
    }

    pub fn genre(&self, id: GenreId) -> Result<Genre> {
        self.genres
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("genre with id {} not found", id)))
    }

    pub fn genres(&self) -> Vec<Genre> {
        self.genres.values().cloned().collect()
    }

    pub fn rating(&self, id: RatingId) -> Result<ContentRating> {
        self.ratings
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("rating with id {} not found", id)))
    }

    pub fn ratings(&self) -> Vec<ContentRating> {
        self.ratings.values().cloned().collect()
    }
}
