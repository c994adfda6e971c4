//! # AttributeContainer
//!
//! A typed `(name, type) -> value` slot map with per-slot listener sets.
//! Each slot is independent: `"speed"` holding an `f64` and `"speed"`
//! holding a `String` never collide. Values are stored behind `Arc<dyn Any>`
//! and downcast back to the caller's type on every access, so a type
//! mismatch between `set::<V>` and `get::<W>` on the same name is simply a
//! different slot, never a panic.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{JalseError, JalseResult};
use crate::Identifier;

type SlotKey = (String, TypeId);
type SlotValue = Arc<dyn Any + Send + Sync>;

/// One add/change/remove notification, carrying the old and new value of the
/// slot named `name` on container `container`.
pub struct AttributeEvent<V> {
    pub container: Identifier,
    pub name: String,
    pub old: Option<Arc<V>>,
    pub new: Option<Arc<V>>,
}

pub trait AttributeListener<V>: Send + Sync {
    fn added(&self, _event: &AttributeEvent<V>) {}
    fn changed(&self, _event: &AttributeEvent<V>) {}
    fn removed(&self, _event: &AttributeEvent<V>) {}
}

pub struct AttributeContainer {
    container_id: Identifier,
    alive: Arc<AtomicBool>,
    values: RwLock<HashMap<SlotKey, SlotValue>>,
    listeners: RwLock<HashMap<SlotKey, Box<dyn Any + Send + Sync>>>,
}

impl AttributeContainer {
    /// `alive` is the owning entity's liveness flag, shared rather than
    /// copied so mutators here see the same entity death every other
    /// mutator on the entity sees.
    pub(crate) fn new(container_id: Identifier, alive: Arc<AtomicBool>) -> Self {
        Self {
            container_id,
            alive,
            values: RwLock::new(HashMap::new()),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    fn key<V: 'static>(name: &str) -> SlotKey {
        (name.to_string(), TypeId::of::<V>())
    }

    fn require_alive(&self) -> JalseResult<()> {
        if self.alive.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(JalseError::EntityNotAlive(self.container_id))
        }
    }

    /// Sets the `name`/`V` slot. Fires `added` if the slot was empty,
    /// `changed` if the new value differs from the old one, or nothing if
    /// it is equal (a no-op replace never fires). Fails if the owning
    /// entity is dead.
    pub fn set<V: PartialEq + Send + Sync + 'static>(&self, name: &str, value: V) -> JalseResult<()> {
        self.require_alive()?;
        let key = Self::key::<V>(name);
        let new_arc = Arc::new(value);
        let old = {
            let mut values = self.values.write();
            values.insert(key.clone(), new_arc.clone() as SlotValue)
        };
        match old {
            None => self.fire_added(&key.0, new_arc),
            Some(old) => {
                let old_typed = old
                    .downcast::<V>()
                    .expect("attribute slot holds a different type than its TypeId key");
                if *old_typed != *new_arc {
                    self.fire_changed(&key.0, Some(old_typed), new_arc);
                }
            }
        }
        Ok(())
    }

    pub fn get<V: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<V>> {
        let key = Self::key::<V>(name);
        self.values.read().get(&key).cloned().map(|value| {
            value
                .downcast::<V>()
                .expect("attribute slot holds a different type than its TypeId key")
        })
    }

    /// Removes the `name`/`V` slot, firing `removed` if it was present.
    /// Fails if the owning entity is dead.
    pub fn remove<V: Send + Sync + 'static>(&self, name: &str) -> JalseResult<Option<Arc<V>>> {
        self.require_alive()?;
        let key = Self::key::<V>(name);
        let removed = self.values.write().remove(&key);
        Ok(removed.map(|value| {
            let typed = value
                .downcast::<V>()
                .expect("attribute slot holds a different type than its TypeId key");
            self.fire_removed(&key.0, typed.clone());
            typed
        }))
    }

    pub fn contains<V: Send + Sync + 'static>(&self, name: &str) -> bool {
        self.values.read().contains_key(&Self::key::<V>(name))
    }

    /// Re-fires `changed` for the current value of `name` without
    /// modifying it, for callers whose value is mutated in place behind the
    /// `Arc` rather than replaced wholesale. Fails if the owning entity is
    /// dead.
    pub fn fire_attribute_changed<V: Send + Sync + 'static>(&self, name: &str) -> JalseResult<()> {
        self.require_alive()?;
        if let Some(current) = self.get::<V>(name) {
            self.fire_changed(name, Some(current.clone()), current);
        }
        Ok(())
    }

    pub fn add_attribute_listener<V: Send + Sync + 'static>(
        &self,
        name: &str,
        listener: Arc<dyn AttributeListener<V>>,
    ) {
        let key = Self::key::<V>(name);
        let mut listeners = self.listeners.write();
        let entry = listeners
            .entry(key)
            .or_insert_with(|| Box::new(Vec::<Arc<dyn AttributeListener<V>>>::new()));
        entry
            .downcast_mut::<Vec<Arc<dyn AttributeListener<V>>>>()
            .expect("listener slot holds a different type than its TypeId key")
            .push(listener);
    }

    pub fn remove_attribute_listener<V: Send + Sync + 'static>(
        &self,
        name: &str,
        listener: &Arc<dyn AttributeListener<V>>,
    ) {
        let key = Self::key::<V>(name);
        if let Some(entry) = self.listeners.write().get_mut(&key) {
            if let Some(vec) = entry.downcast_mut::<Vec<Arc<dyn AttributeListener<V>>>>() {
                vec.retain(|l| !Arc::ptr_eq(l, listener));
            }
        }
    }

    pub fn remove_all_listeners<V: Send + Sync + 'static>(&self, name: &str) {
        self.listeners.write().remove(&Self::key::<V>(name));
    }

    pub fn attribute_names(&self) -> Vec<String> {
        self.values.read().keys().map(|(name, _)| name.clone()).collect()
    }

    /// Blind bulk copy used when seeding a new entity's attributes from a
    /// source container. Does not fire `added`/`changed` events: listeners
    /// are expected to attach after construction, not observe it.
    pub(crate) fn copy_from(&self, source: &AttributeContainer) {
        let snapshot = source.values.read().clone();
        self.values.write().extend(snapshot);
    }

    fn listeners_for<V: Send + Sync + 'static>(&self, key: &SlotKey) -> Vec<Arc<dyn AttributeListener<V>>> {
        self.listeners
            .read()
            .get(key)
            .and_then(|entry| entry.downcast_ref::<Vec<Arc<dyn AttributeListener<V>>>>())
            .cloned()
            .unwrap_or_default()
    }

    fn fire_added<V: Send + Sync + 'static>(&self, name: &str, new: Arc<V>) {
        let key = Self::key::<V>(name);
        for listener in self.listeners_for::<V>(&key) {
            listener.added(&AttributeEvent {
                container: self.container_id,
                name: name.to_string(),
                old: None,
                new: Some(Arc::clone(&new)),
            });
        }
    }

    fn fire_changed<V: Send + Sync + 'static>(&self, name: &str, old: Option<Arc<V>>, new: Arc<V>) {
        let key = Self::key::<V>(name);
        for listener in self.listeners_for::<V>(&key) {
            listener.changed(&AttributeEvent {
                container: self.container_id,
                name: name.to_string(),
                old: old.clone(),
                new: Some(Arc::clone(&new)),
            });
        }
    }

    fn fire_removed<V: Send + Sync + 'static>(&self, name: &str, old: Arc<V>) {
        let key = Self::key::<V>(name);
        for listener in self.listeners_for::<V>(&key) {
            listener.removed(&AttributeEvent {
                container: self.container_id,
                name: name.to_string(),
                old: Some(Arc::clone(&old)),
                new: None,
            });
        }
    }
}
