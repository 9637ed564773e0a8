use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::convert::TryInto;
use std::ops::Bound;
use std::sync::{Arc, Mutex};

// Big-endian so that the lexicographic key order of both backends is id order.
pub fn serialize_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub fn deserialize_id<V: AsRef<[u8]>>(id: V) -> Result<u64> {
    let bytes: [u8; 8] = id
        .as_ref()
        .try_into()
        .map_err(|_| Error::Internal(format!("malformed id key of {} bytes", id.as_ref().len())))?;
    Ok(u64::from_be_bytes(bytes))
}

/// Fixed-width, order-preserving key encoding for the endpoints of an edge.
pub trait NodeKey: Copy + Ord + std::hash::Hash + std::fmt::Debug + Send + Sync {
    const WIDTH: usize;

    fn write_key(self, buf: &mut Vec<u8>);
    fn read_key(bytes: &[u8]) -> Result<Self>;
}

impl NodeKey for u64 {
    const WIDTH: usize = 8;

    fn write_key(self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&serialize_id(self));
    }

    fn read_key(bytes: &[u8]) -> Result<Self> {
        deserialize_id(bytes)
    }
}

impl NodeKey for i32 {
    const WIDTH: usize = 4;

    fn write_key(self, buf: &mut Vec<u8>) {
        // flip the sign bit so negative ids sort before positive ones
        buf.extend_from_slice(&((self as u32) ^ 0x8000_0000).to_be_bytes());
    }

    fn read_key(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; 4] = bytes
            .try_into()
            .map_err(|_| Error::Internal(format!("malformed i32 key of {} bytes", bytes.len())))?;
        Ok((u32::from_be_bytes(bytes) ^ 0x8000_0000) as i32)
    }
}

/// An ordered byte-keyed table. Every store in the crate is built on this.
pub trait KvTree: Send + Sync {
    fn fetch(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    fn store(&self, key: &[u8], value: Vec<u8>) -> Result<Option<Vec<u8>>>;
    fn discard(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    /// All entries whose key starts with `prefix`, in key order.
    fn prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
    fn max_key(&self) -> Result<Option<Vec<u8>>>;
}

/// Where tables come from. Chosen once at process start.
pub trait Backend: Send + Sync {
    fn open_table(&self, name: &str) -> Result<Box<dyn KvTree>>;
}

impl KvTree for sled::Tree {
    fn fetch(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.get(key)?.map(|v| v.to_vec()))
    }

    fn store(&self, key: &[u8], value: Vec<u8>) -> Result<Option<Vec<u8>>> {
        Ok(self.insert(key, value)?.map(|v| v.to_vec()))
    }

    fn discard(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.remove(key)?.map(|v| v.to_vec()))
    }

    fn prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.scan_prefix(prefix)
            .map(|entry| -> Result<(Vec<u8>, Vec<u8>)> {
                let (k, v) = entry?;
                Ok((k.to_vec(), v.to_vec()))
            })
            .collect()
    }

    fn max_key(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.last()?.map(|(k, _)| k.to_vec()))
    }
}

impl Backend for sled::Db {
    fn open_table(&self, name: &str) -> Result<Box<dyn KvTree>> {
        let tree = self.open_tree(name.as_bytes())?;
        Ok(Box::new(tree))
    }
}

/// Volatile backend. Tables with the same name share their contents, like
/// sled trees do.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Arc<MemoryTree>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn open_table(&self, name: &str) -> Result<Box<dyn KvTree>> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| Error::poisoned("memory backend"))?;
        let table = tables.entry(name.to_owned()).or_default().clone();
        Ok(Box::new(table))
    }
}

#[derive(Default)]
pub struct MemoryTree {
    entries: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryTree {
    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| Error::poisoned("memory table"))
    }
}

impl KvTree for Arc<MemoryTree> {
    fn fetch(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn store(&self, key: &[u8], value: Vec<u8>) -> Result<Option<Vec<u8>>> {
        Ok(self.entries()?.insert(key.to_vec(), value))
    }

    fn discard(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries()?.remove(key))
    }

    fn prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.entries()?;
        Ok(entries
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn max_key(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.entries()?.keys().next_back().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(backend: &dyn Backend) {
        let tree = backend.open_table("t").unwrap();
        assert_eq!(tree.max_key().unwrap(), None);
        tree.store(&serialize_id(2), b"two".to_vec()).unwrap();
        tree.store(&serialize_id(256), b"big".to_vec()).unwrap();
        tree.store(&serialize_id(1), b"one".to_vec()).unwrap();
        assert_eq!(tree.max_key().unwrap(), Some(serialize_id(256).to_vec()));

        let keys = tree
            .prefix(&[])
            .unwrap()
            .into_iter()
            .map(|(k, _)| deserialize_id(k).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![1, 2, 256]);

        assert_eq!(tree.discard(&serialize_id(2)).unwrap(), Some(b"two".to_vec()));
        assert_eq!(tree.discard(&serialize_id(2)).unwrap(), None);

        let again = backend.open_table("t").unwrap();
        assert_eq!(again.fetch(&serialize_id(1)).unwrap(), Some(b"one".to_vec()));
        let other = backend.open_table("u").unwrap();
        assert_eq!(other.fetch(&serialize_id(1)).unwrap(), None);
    }

    #[test]
    fn sled_backend() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        exercise(&db);
    }

    #[test]
    fn memory_backend() {
        exercise(&MemoryBackend::new());
    }

    #[test]
    fn prefix_scan_stops_at_prefix_end() {
        let tree = MemoryBackend::new().open_table("edges").unwrap();
        for (a, b) in &[(1u64, 5u64), (2, 3), (2, 9), (3, 1)] {
            let mut key = Vec::new();
            a.write_key(&mut key);
            b.write_key(&mut key);
            tree.store(&key, Vec::new()).unwrap();
        }
        let mut prefix = Vec::new();
        2u64.write_key(&mut prefix);
        let hits = tree
            .prefix(&prefix)
            .unwrap()
            .into_iter()
            .map(|(k, _)| u64::read_key(&k[8..]).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(hits, vec![3, 9]);
    }

    #[test]
    fn i32_keys_keep_order() {
        let mut keys = [-5i32, 7, 0, -1, 3]
            .iter()
            .map(|id| {
                let mut buf = Vec::new();
                id.write_key(&mut buf);
                buf
            })
            .collect::<Vec<_>>();
        keys.sort();
        let decoded = keys
            .iter()
            .map(|k| i32::read_key(k).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(decoded, vec![-5, -1, 0, 3, 7]);
    }
}
