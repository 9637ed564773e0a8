//! Keyed record storage with store-assigned ids.
//!
//! Ids start at 1 and only ever grow. The highest id handed out is kept in
//! the shared `meta` table, so deleting the newest record does not make its
//! id available again.

use crate::database::{deserialize_id, serialize_id, Backend, KvTree};
use crate::error::{Error, Result};
use crate::model::Entity;
use log::debug;
use std::marker::PhantomData;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const META: &str = "meta";

struct Tables {
    records: Box<dyn KvTree>,
    meta: Box<dyn KvTree>,
}

pub struct EntityStore<T> {
    tables: RwLock<Tables>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> EntityStore<T> {
    pub fn open(backend: &dyn Backend) -> Result<Self> {
        let records = backend.open_table(T::KIND)?;
        let meta = backend.open_table(META)?;
        Ok(EntityStore {
            tables: RwLock::new(Tables { records, meta }),
            _entity: PhantomData,
        })
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| Error::poisoned(T::KIND))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| Error::poisoned(T::KIND))
    }

    fn not_found(id: u64) -> Error {
        Error::NotFound(format!("{} with id {} not found", T::KIND, id))
    }

    /// Assigns the next id to `entity`, whatever id it carried, and stores it.
    pub fn create(&self, mut entity: T) -> Result<T> {
        let tables = self.write()?;
        let high_water = match tables.meta.fetch(T::KIND.as_bytes())? {
            Some(bytes) => deserialize_id(bytes)?,
            None => 0,
        };
        let max_existing = match tables.records.max_key()? {
            Some(key) => deserialize_id(key)?,
            None => 0,
        };
        let id = high_water.max(max_existing) + 1;
        entity.set_id(id);
        tables
            .records
            .store(&serialize_id(id), bincode::serialize(&entity)?)?;
        tables
            .meta
            .store(T::KIND.as_bytes(), serialize_id(id).to_vec())?;
        debug!("created {} {}", T::KIND, id);
        Ok(entity)
    }

    pub fn update(&self, entity: T) -> Result<T> {
        let id = entity.id();
        if id == 0 {
            return Err(Error::InvalidArgument(format!(
                "cannot update {} without an id",
                T::KIND
            )));
        }
        let tables = self.write()?;
        if tables.records.fetch(&serialize_id(id))?.is_none() {
            return Err(Self::not_found(id));
        }
        tables
            .records
            .store(&serialize_id(id), bincode::serialize(&entity)?)?;
        debug!("updated {} {}", T::KIND, id);
        Ok(entity)
    }

    pub fn get(&self, id: u64) -> Result<T> {
        let tables = self.read()?;
        let bytes = tables
            .records
            .fetch(&serialize_id(id))?
            .ok_or_else(|| Self::not_found(id))?;
        Ok(bincode::deserialize(&bytes)?)
    }

    pub fn contains(&self, id: u64) -> Result<bool> {
        Ok(self.read()?.records.fetch(&serialize_id(id))?.is_some())
    }

    /// Every record in creation order.
    pub fn list(&self) -> Result<Vec<T>> {
        let tables = self.read()?;
        tables
            .records
            .prefix(&[])?
            .into_iter()
            .map(|(_, bytes)| -> Result<T> { Ok(bincode::deserialize(&bytes)?) })
            .collect()
    }

    pub fn delete(&self, id: u64) -> Result<()> {
        let tables = self.write()?;
        let key = serialize_id(id);
        if tables.records.fetch(&key)?.is_none() {
            return Err(Self::not_found(id));
        }
        if tables.records.discard(&key)?.is_none() {
            return Err(Error::Internal(format!(
                "failed to delete {} with id {}",
                T::KIND,
                id
            )));
        }
        debug!("deleted {} {}", T::KIND, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryBackend;
    use crate::error::ErrorKind;
    use crate::model::Person;
    use chrono::NaiveDate;

    fn person(login: &str) -> Person {
        Person {
            id: 0,
            email: format!("{}@example.com", login),
            login: login.to_owned(),
            display_name: login.to_owned(),
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            friends: Default::default(),
        }
    }

    #[test]
    fn ids_are_sequential_and_never_reused() {
        let backend = MemoryBackend::new();
        let store = EntityStore::<Person>::open(&backend).unwrap();
        assert_eq!(store.create(person("a")).unwrap().id, 1);
        assert_eq!(store.create(person("b")).unwrap().id, 2);
        store.delete(2).unwrap();
        assert_eq!(store.create(person("c")).unwrap().id, 3);
        store.delete(1).unwrap();
        store.delete(3).unwrap();
        assert_eq!(store.create(person("d")).unwrap().id, 4);
    }

    #[test]
    fn create_ignores_incoming_id() {
        let backend = MemoryBackend::new();
        let store = EntityStore::<Person>::open(&backend).unwrap();
        let mut p = person("a");
        p.id = 42;
        assert_eq!(store.create(p).unwrap().id, 1);
    }

    #[test]
    fn high_water_mark_survives_reopen() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        {
            let store = EntityStore::<Person>::open(&db).unwrap();
            store.create(person("a")).unwrap();
            store.create(person("b")).unwrap();
            store.delete(2).unwrap();
        }
        let store = EntityStore::<Person>::open(&db).unwrap();
        assert_eq!(store.create(person("c")).unwrap().id, 3);
    }

    #[test]
    fn get_update_list() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let store = EntityStore::<Person>::open(&db).unwrap();
        let a = store.create(person("a")).unwrap();
        store.create(person("b")).unwrap();
        assert_eq!(store.get(a.id).unwrap(), a);

        let mut renamed = a.clone();
        renamed.display_name = "Alice".to_owned();
        store.update(renamed.clone()).unwrap();
        assert_eq!(store.get(a.id).unwrap(), renamed);

        let logins = store
            .list()
            .unwrap()
            .into_iter()
            .map(|p| p.login)
            .collect::<Vec<_>>();
        assert_eq!(logins, vec!["a", "b"]);
    }

    #[test]
    fn failures() {
        let backend = MemoryBackend::new();
        let store = EntityStore::<Person>::open(&backend).unwrap();
        assert_eq!(store.get(1).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.delete(1).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            store.update(person("a")).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        let mut ghost = person("ghost");
        ghost.id = 9;
        assert_eq!(store.update(ghost).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(store.list().unwrap().is_empty());
    }

    /// A table that stores normally but never reports removing anything.
    struct StuckDiscard(Box<dyn KvTree>);

    impl KvTree for StuckDiscard {
        fn fetch(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
            self.0.fetch(key)
        }

        fn store(&self, key: &[u8], value: Vec<u8>) -> Result<Option<Vec<u8>>> {
            self.0.store(key, value)
        }

        fn discard(&self, _key: &[u8]) -> Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
            self.0.prefix(prefix)
        }

        fn max_key(&self) -> Result<Option<Vec<u8>>> {
            self.0.max_key()
        }
    }

    struct StuckBackend(MemoryBackend);

    impl Backend for StuckBackend {
        fn open_table(&self, name: &str) -> Result<Box<dyn KvTree>> {
            Ok(Box::new(StuckDiscard(self.0.open_table(name)?)))
        }
    }

    #[test]
    fn delete_that_removes_nothing_is_internal() {
        let backend = StuckBackend(MemoryBackend::new());
        let store = EntityStore::<Person>::open(&backend).unwrap();
        let a = store.create(person("a")).unwrap();
        assert_eq!(store.delete(a.id).unwrap_err().kind(), ErrorKind::Internal);
        assert_eq!(store.get(a.id).unwrap(), a);
    }
}
