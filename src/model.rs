use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

pub type PersonId = u64;
pub type FilmId = u64;
pub type GenreId = i32;
pub type RatingId = i32;

/// Records kept in an `EntityStore`. The id is zero until the store assigns one.
pub trait Entity: Serialize + serde::de::DeserializeOwned + Clone {
    const KIND: &'static str;

    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub id: PersonId,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(custom(function = "crate::validate::login"))]
    pub login: String,
    #[serde(default, rename = "name")]
    pub display_name: String,
    #[serde(rename = "birthday")]
    pub birth_date: NaiveDate,
    /// Derived from the friendship graph on read, never stored.
    #[serde(default)]
    pub friends: BTreeSet<PersonId>,
}

impl Entity for Person {
    const KIND: &'static str = "person";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

#[derive(Serialize, Deserialize, Validate, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    #[serde(default)]
    pub id: FilmId,
    #[serde(rename = "name")]
    #[validate(custom(function = "crate::validate::not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    pub description: String,
    #[validate(custom(function = "crate::validate::not_before_first_screening"))]
    pub release_date: NaiveDate,
    #[serde(rename = "duration")]
    #[validate(range(min = 1, message = "must be at least one minute"))]
    pub duration_minutes: u32,
    /// Callers only need to supply the id; the name is resolved on read.
    #[serde(rename = "mpa")]
    pub rating: ContentRating,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub likes: BTreeSet<PersonId>,
}

impl Entity for Film {
    const KIND: &'static str = "film";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Genre {
    pub id: GenreId,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContentRating {
    pub id: RatingId,
    #[serde(default)]
    pub name: String,
}

impl Genre {
    pub fn new(id: GenreId, name: &str) -> Self {
        Genre {
            id,
            name: name.to_owned(),
        }
    }
}

impl ContentRating {
    pub fn new(id: RatingId, name: &str) -> Self {
        ContentRating {
            id,
            name: name.to_owned(),
        }
    }
}

/// Payload of a directed friendship edge. `confirmed` is written as `false`
/// and no query reads it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FriendEdge {
    pub confirmed: bool,
}
