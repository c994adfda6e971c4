//! # Type marks
//!
//! A runtime registry resolving "is `T` an ancestor of `U`" without
//! reflection or a derive macro: callers explicitly register each mark's
//! direct ancestors once (typically near the mark's own definition), and
//! the registry computes the transitive closure on demand. This is the
//! deliberately simpler alternative to a compile-time trait-hierarchy scan.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use parking_lot::RwLock;

pub struct TypeRegistry {
    ancestors: RwLock<HashMap<TypeId, Vec<TypeId>>>,
    names: RwLock<HashMap<TypeId, &'static str>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            ancestors: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
        }
    }

    fn remember<T: 'static>(&self) {
        self.names
            .write()
            .entry(TypeId::of::<T>())
            .or_insert_with(std::any::type_name::<T>);
        self.ancestors.write().entry(TypeId::of::<T>()).or_default();
    }

    /// Registers `A` as a direct ancestor of `T`. Idempotent.
    pub fn register_ancestor<T: 'static, A: 'static>(&self) {
        self.remember::<T>();
        self.remember::<A>();
        let ancestor_id = TypeId::of::<A>();
        let mut ancestors = self.ancestors.write();
        let direct = ancestors.entry(TypeId::of::<T>()).or_default();
        if !direct.contains(&ancestor_id) {
            direct.push(ancestor_id);
        }
    }

    /// The transitive closure of `mark`'s ancestors, not including `mark`
    /// itself.
    pub fn ancestors_of(&self, mark: TypeId) -> HashSet<TypeId> {
        let table = self.ancestors.read();
        let mut seen = HashSet::new();
        let mut stack = vec![mark];
        while let Some(current) = stack.pop() {
            if let Some(direct) = table.get(&current) {
                for &ancestor in direct {
                    if seen.insert(ancestor) {
                        stack.push(ancestor);
                    }
                }
            }
        }
        seen
    }

    /// The transitive closure of `mark`'s descendants, not including `mark`
    /// itself: every registered type that counts `mark` among its ancestors.
    pub fn descendants_of(&self, mark: TypeId) -> HashSet<TypeId> {
        let table = self.ancestors.read();
        let mut seen: HashSet<TypeId> = HashSet::new();
        let mut changed = true;
        while changed {
            changed = false;
            for (&candidate, direct) in table.iter() {
                if seen.contains(&candidate) {
                    continue;
                }
                let counts_mark = direct.contains(&mark) || direct.iter().any(|d| seen.contains(d));
                if counts_mark {
                    seen.insert(candidate);
                    changed = true;
                }
            }
        }
        seen
    }

    pub fn name_of(&self, mark: TypeId) -> &'static str {
        self.names.read().get(&mark).copied().unwrap_or("<unregistered>")
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

pub fn global_type_registry() -> &'static TypeRegistry {
    GLOBAL.get_or_init(TypeRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Animal;
    struct FlyingAnimal;
    struct Bird;

    #[test]
    fn ancestors_and_descendants_are_transitive() {
        let registry = TypeRegistry::new();
        registry.register_ancestor::<FlyingAnimal, Animal>();
        registry.register_ancestor::<Bird, FlyingAnimal>();

        let bird_ancestors = registry.ancestors_of(TypeId::of::<Bird>());
        assert!(bird_ancestors.contains(&TypeId::of::<FlyingAnimal>()));
        assert!(bird_ancestors.contains(&TypeId::of::<Animal>()));

        let animal_descendants = registry.descendants_of(TypeId::of::<Animal>());
        assert!(animal_descendants.contains(&TypeId::of::<FlyingAnimal>()));
        assert!(animal_descendants.contains(&TypeId::of::<Bird>()));
    }
}
