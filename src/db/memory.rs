//! In-memory backing medium for ephemeral sessions and tests.

use std::sync::{Mutex, MutexGuard};

use super::KeyValueBackend;
use crate::error::{StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<Vec<(String, String)>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Vec<(String, String)>>> {
        self.entries
            .lock()
            .map_err(|_| StoreError::PersistenceUnavailable("memory lock poisoned".to_string()))
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get_all_keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock()?.iter().map(|(k, _)| k.clone()).collect())
    }

    fn get_many(&self, keys: &[String]) -> StoreResult<Vec<(String, Option<String>)>> {
        let entries = self.lock()?;
        Ok(keys
            .iter()
            .map(|key| {
                let value = entries
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone());
                (key.clone(), value)
            })
            .collect())
    }

    fn set_value(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.lock()?;
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    fn clear_all(&self) -> StoreResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let backend = MemoryBackend::new();
        backend.set_value("b", "2").unwrap();
        backend.set_value("a", "1").unwrap();
        backend.set_value("b", "3").unwrap();

        let keys = backend.get_all_keys().unwrap();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(
            backend.get_many(&keys).unwrap(),
            vec![
                ("b".to_string(), Some("3".to_string())),
                ("a".to_string(), Some("1".to_string())),
            ]
        );
    }

    #[test]
    fn test_clear() {
        let backend = MemoryBackend::new();
        backend.set_value("a", "1").unwrap();
        backend.clear_all().unwrap();
        assert!(backend.get_all_keys().unwrap().is_empty());
        assert_eq!(backend.get_many(&["a".to_string()]).unwrap()[0].1, None);
    }
}
