//! Relation edges between entities.
//!
//! Each `EdgeSet` keeps a forward table keyed by `source ++ target` holding
//! the edge payload and a reverse table keyed by `target ++ source`, so that
//! every edge touching a node can be found by a prefix scan from either side.
//! Neither table checks that the endpoints exist; the catalogs do that
//! before writing.

use crate::database::{Backend, KvTree, NodeKey};
use crate::error::{Error, Result};
use crate::model::{FilmId, FriendEdge, GenreId, PersonId};
use log::debug;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct Tables {
    forward: Box<dyn KvTree>,
    reverse: Box<dyn KvTree>,
}

pub struct EdgeSet<S, T, V = ()> {
    name: &'static str,
    tables: RwLock<Tables>,
    _edge: PhantomData<fn() -> (S, T, V)>,
}

fn edge_key<A: NodeKey, B: NodeKey>(a: A, b: B) -> Vec<u8> {
    let mut key = Vec::with_capacity(A::WIDTH + B::WIDTH);
    a.write_key(&mut key);
    b.write_key(&mut key);
    key
}

fn node_prefix<A: NodeKey>(a: A) -> Vec<u8> {
    let mut key = Vec::with_capacity(A::WIDTH);
    a.write_key(&mut key);
    key
}

impl<S, T, V> EdgeSet<S, T, V>
where
    S: NodeKey,
    T: NodeKey,
    V: Serialize + DeserializeOwned,
{
    pub fn open(backend: &dyn Backend, name: &'static str) -> Result<Self> {
        let forward = backend.open_table(name)?;
        let reverse = backend.open_table(&format!("{}_reverse", name))?;
        Ok(EdgeSet {
            name,
            tables: RwLock::new(Tables { forward, reverse }),
            _edge: PhantomData,
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| Error::poisoned(self.name))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| Error::poisoned(self.name))
    }

    /// Returns `false` and leaves the stored payload alone if the edge was
    /// already present.
    pub fn insert(&self, source: S, target: T, value: &V) -> Result<bool> {
        let tables = self.write()?;
        let key = edge_key(source, target);
        if tables.forward.fetch(&key)?.is_some() {
            return Ok(false);
        }
        tables.forward.store(&key, bincode::serialize(value)?)?;
        tables.reverse.store(&edge_key(target, source), Vec::new())?;
        debug!("{}: added {:?} -> {:?}", self.name, source, target);
        Ok(true)
    }

    /// Returns whether an edge was removed.
    pub fn remove(&self, source: S, target: T) -> Result<bool> {
        let tables = self.write()?;
        let removed = tables.forward.discard(&edge_key(source, target))?.is_some();
        tables.reverse.discard(&edge_key(target, source))?;
        if removed {
            debug!("{}: removed {:?} -> {:?}", self.name, source, target);
        }
        Ok(removed)
    }

    pub fn get(&self, source: S, target: T) -> Result<Option<V>> {
        match self.read()?.forward.fetch(&edge_key(source, target))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn targets_of(&self, source: S) -> Result<BTreeSet<T>> {
        let tables = self.read()?;
        tables
            .forward
            .prefix(&node_prefix(source))?
            .into_iter()
            .map(|(key, _)| T::read_key(&key[S::WIDTH..]))
            .collect()
    }

    /// Number of outgoing edges per source, for sources that have any.
    pub fn out_degrees(&self) -> Result<HashMap<S, usize>> {
        let tables = self.read()?;
        let mut degrees = HashMap::new();
        for (key, _) in tables.forward.prefix(&[])? {
            *degrees.entry(S::read_key(&key[..S::WIDTH])?).or_insert(0) += 1;
        }
        Ok(degrees)
    }

    fn clear_from(tables: &Tables, source: S) -> Result<usize> {
        let edges = tables.forward.prefix(&node_prefix(source))?;
        for (key, _) in &edges {
            let target = T::read_key(&key[S::WIDTH..])?;
            tables.forward.discard(key)?;
            tables.reverse.discard(&edge_key(target, source))?;
        }
        Ok(edges.len())
    }

    /// Drops every edge leaving `source`. Returns how many were removed.
    pub fn remove_from(&self, source: S) -> Result<usize> {
        let tables = self.write()?;
        Self::clear_from(&tables, source)
    }

    /// Makes `targets` the exact set of edges leaving `source`, all carrying
    /// `value`. Readers and writers never observe a mix of old and new edges.
    pub fn replace_from<I>(&self, source: S, targets: I, value: &V) -> Result<()>
    where
        I: IntoIterator<Item = T>,
    {
        let tables = self.write()?;
        let removed = Self::clear_from(&tables, source)?;
        let payload = bincode::serialize(value)?;
        let mut added = 0;
        for target in targets {
            tables.forward.store(&edge_key(source, target), payload.clone())?;
            tables.reverse.store(&edge_key(target, source), Vec::new())?;
            added += 1;
        }
        debug!(
            "{}: replaced {} edges of {:?} with {}",
            self.name, removed, source, added
        );
        Ok(())
    }

    /// Drops every edge arriving at `target`. Returns how many were removed.
    pub fn remove_to(&self, target: T) -> Result<usize> {
        let tables = self.write()?;
        let edges = tables.reverse.prefix(&node_prefix(target))?;
        for (key, _) in &edges {
            let source = S::read_key(&key[T::WIDTH..])?;
            tables.reverse.discard(key)?;
            tables.forward.discard(&edge_key(source, target))?;
        }
        Ok(edges.len())
    }
}

/// Friendships, likes and genre tags.
pub struct RelationGraph {
    friends: EdgeSet<PersonId, PersonId, FriendEdge>,
    likes: EdgeSet<FilmId, PersonId>,
    genre_tags: EdgeSet<FilmId, GenreId>,
}

impl RelationGraph {
    pub fn open(backend: &dyn Backend) -> Result<Self> {
        Ok(RelationGraph {
            friends: EdgeSet::open(backend, "friendship")?,
            likes: EdgeSet::open(backend, "film_like")?,
            genre_tags: EdgeSet::open(backend, "film_genre")?,
        })
    }

    pub fn add_friend(&self, person: PersonId, friend: PersonId) -> Result<()> {
        self.friends
            .insert(person, friend, &FriendEdge { confirmed: false })?;
        Ok(())
    }

    pub fn remove_friend(&self, person: PersonId, friend: PersonId) -> Result<()> {
        self.friends.remove(person, friend)?;
        Ok(())
    }

    pub fn friend_edge(&self, person: PersonId, friend: PersonId) -> Result<Option<FriendEdge>> {
        self.friends.get(person, friend)
    }

    pub fn friend_ids_of(&self, person: PersonId) -> Result<BTreeSet<PersonId>> {
        self.friends.targets_of(person)
    }

    /// Ids present in both friend sets, ascending.
    pub fn mutual_friend_ids(&self, a: PersonId, b: PersonId) -> Result<Vec<PersonId>> {
        let of_a = self.friends.targets_of(a)?;
        let of_b = self.friends.targets_of(b)?;
        let (small, large) = if of_a.len() <= of_b.len() {
            (of_a, of_b)
        } else {
            (of_b, of_a)
        };
        let large: HashSet<PersonId> = large.into_iter().collect();
        Ok(small.into_iter().filter(|id| large.contains(id)).collect())
    }

    pub fn add_like(&self, film: FilmId, person: PersonId) -> Result<()> {
        self.likes.insert(film, person, &())?;
        Ok(())
    }

    pub fn remove_like(&self, film: FilmId, person: PersonId) -> Result<()> {
        if !self.likes.remove(film, person)? {
            return Err(Error::ConditionsNotMet(format!(
                "person {} has not liked film {}",
                person, film
            )));
        }
        Ok(())
    }

    pub fn liker_ids_of(&self, film: FilmId) -> Result<BTreeSet<PersonId>> {
        self.likes.targets_of(film)
    }

    pub fn like_counts(&self) -> Result<HashMap<FilmId, usize>> {
        self.likes.out_degrees()
    }

    /// Replaces the genre tags of `film` in one step.
    pub fn retag_film(&self, film: FilmId, genres: &BTreeSet<GenreId>) -> Result<()> {
        self.genre_tags.replace_from(film, genres.iter().copied(), &())
    }

    /// Genre ids of a film, ascending.
    pub fn genre_ids_of(&self, film: FilmId) -> Result<BTreeSet<GenreId>> {
        self.genre_tags.targets_of(film)
    }

    /// Removes every friendship and like that mentions `person`.
    pub fn detach_person(&self, person: PersonId) -> Result<()> {
        let friendships = self.friends.remove_from(person)? + self.friends.remove_to(person)?;
        let likes = self.likes.remove_to(person)?;
        debug!(
            "detached person {}: {} friendships, {} likes",
            person, friendships, likes
        );
        Ok(())
    }

    /// Removes every like and genre tag of `film`.
    pub fn detach_film(&self, film: FilmId) -> Result<()> {
        let likes = self.likes.remove_from(film)?;
        let tags = self.genre_tags.remove_from(film)?;
        debug!("detached film {}: {} likes, {} tags", film, likes, tags);
        Ok(())
    }
}
