//! People, films and the relations between them: friendships, likes and
//! genre tags, with mutual-friend and popularity queries on top.

pub mod config;
pub mod database;
pub mod entity_store;
pub mod error;
pub mod films;
pub mod graph;
pub mod http;
pub mod model;
pub mod people;
pub mod reference;
pub mod registry;
pub mod validate;

pub use error::{Error, ErrorKind, Result};
pub use registry::Registry;
