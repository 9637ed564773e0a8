use crate::database::{Backend, MemoryBackend};
use crate::entity_store::EntityStore;
use crate::error::Result;
use crate::films::FilmCatalog;
use crate::graph::RelationGraph;
use crate::model::{Film, Person};
use crate::people::PeopleDirectory;
use crate::reference::ReferenceCatalog;
use std::sync::Arc;

/// Every catalog, opened over a single backend.
pub struct Registry {
    pub reference: Arc<ReferenceCatalog>,
    pub people: PeopleDirectory,
    pub films: FilmCatalog,
    _backend: Box<dyn Backend>,
}

impl Registry {
    pub fn open(backend: Box<dyn Backend>, reference: ReferenceCatalog) -> Result<Self> {
        let people: Arc<EntityStore<Person>> = Arc::new(EntityStore::open(backend.as_ref())?);
        let films: Arc<EntityStore<Film>> = Arc::new(EntityStore::open(backend.as_ref())?);
        let graph = Arc::new(RelationGraph::open(backend.as_ref())?);
        let reference = Arc::new(reference);
        Ok(Registry {
            people: PeopleDirectory::new(people.clone(), graph.clone()),
            films: FilmCatalog::new(films, people, graph, reference.clone()),
            reference,
            _backend: backend,
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(Box::new(MemoryBackend::new()), ReferenceCatalog::standard())
    }
}
