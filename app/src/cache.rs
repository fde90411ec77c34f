use std::{
    borrow::Borrow,
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// A shared map behind a single lock. Clones share the same data.
pub struct Cache<K, T> {
    data: Arc<Mutex<HashMap<K, T>>>,
}

impl<K, T> Clone for Cache<K, T> {
    fn clone(&self) -> Self {
        Cache {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + Hash, T> Cache<K, T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn get_connection(&self) -> MutexGuard<'_, HashMap<K, T>> {
        // Every critical section is a single map operation, so a poisoned
        // map is still consistent.
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_data(&self, id: K, data: T) -> Option<T> {
        let mut conn = self.get_connection();
        conn.insert(id, data)
    }

    pub fn read_data<Q, F, O>(&self, id: &Q, read: F) -> Option<O>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        F: FnOnce(&T) -> O,
    {
        let conn = self.get_connection();
        conn.get(id).map(read)
    }

    pub fn delete_data<Q>(&self, id: &Q) -> Option<T>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get_connection().remove(id)
    }

    /// Removes the entry only when `remove` approves of its current value.
    pub fn delete_if<Q, F>(&self, id: &Q, remove: F) -> Option<T>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        F: FnOnce(&T) -> bool,
    {
        let mut conn = self.get_connection();
        if conn.get(id).is_some_and(remove) {
            conn.remove(id)
        } else {
            None
        }
    }

    pub fn values(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.get_connection().values().cloned().collect()
    }
}

impl<K: Eq + Hash, T: Clone> Cache<K, T> {
    pub fn get_data<Q>(&self, id: &Q) -> Option<T>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get_connection().get(id).cloned()
    }
}

impl<K: Eq + Hash, T> Default for Cache<K, T> {
    fn default() -> Self {
        Self::new()
    }
}
