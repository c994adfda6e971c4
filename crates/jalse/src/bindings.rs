//! # Bindings
//!
//! A keyed bag of arbitrary values attached to every engine and shallow-copied
//! onto every [`crate::action::ActionContext`] it creates.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{JalseError, JalseResult};

/// A binding value. Stored type-erased since a single bag holds heterogeneous values.
pub type BindingValue = Arc<dyn Any + Send + Sync>;

/// Thread-safe keyed value map.
///
/// Concurrent reads are always allowed; writes serialize through a single lock.
/// Keys must be non-empty; `None` from [`Bindings::get`] means "absent", not "null value".
#[derive(Default)]
pub struct Bindings {
    inner: RwLock<HashMap<String, BindingValue>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the current key-value references into a new, independent bag.
    pub fn shallow_copy(&self) -> Self {
        Self {
            inner: RwLock::new(self.inner.read().clone()),
        }
    }

    pub fn put(&self, key: impl Into<String>, value: BindingValue) -> JalseResult<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(JalseError::InvalidArgument(
                "binding key must not be empty".into(),
            ));
        }
        self.inner.write().insert(key, value);
        Ok(())
    }

    pub fn put_all<I>(&self, values: I) -> JalseResult<()>
    where
        I: IntoIterator<Item = (String, BindingValue)>,
    {
        for (key, value) in values {
            self.put(key, value)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<BindingValue> {
        self.inner.read().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<BindingValue> {
        self.inner.write().remove(key)
    }

    pub fn remove_all(&self) {
        self.inner.write().clear();
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Snapshot of the current contents.
    pub fn to_map(&self) -> HashMap<String, BindingValue> {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get_round_trips() {
        let bindings = Bindings::new();
        bindings.put("k", Arc::new(42i32)).unwrap();
        let v = bindings.get("k").unwrap();
        assert_eq!(*v.downcast_ref::<i32>().unwrap(), 42);
    }

    #[test]
    fn empty_key_rejected() {
        let bindings = Bindings::new();
        assert!(matches!(
            bindings.put("", Arc::new(1i32)),
            Err(JalseError::InvalidArgument(_))
        ));
    }

    #[test]
    fn shallow_copy_is_independent() {
        let source = Bindings::new();
        source.put("k", Arc::new(1i32)).unwrap();
        let copy = source.shallow_copy();
        source.put("k2", Arc::new(2i32)).unwrap();
        assert!(copy.get("k").is_some());
        assert!(copy.get("k2").is_none());
    }
}
