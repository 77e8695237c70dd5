use core::hash::Hash;
use std::collections::HashMap;

pub trait RegisteredType<K> {
    /// Returns the key the type is registered under
    fn registry_key(&self) -> K;
}

/// Stores all declarations that have been parsed, keyed by qualified name.
///
/// This is used to resolve declarations that are referenced by other
/// declarations. Insertion order is preserved so that every walk over the
/// registry is deterministic.
#[derive(Debug)]
pub struct TypeRegistry<K, T>
where
    K: Eq + Hash + Clone,
    T: RegisteredType<K>,
{
    pub types: HashMap<K, T>,
    insertion_order: Vec<K>,
}

impl<K, T> TypeRegistry<K, T>
where
    K: Eq + Hash + Clone,
    T: RegisteredType<K>,
{
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            insertion_order: Vec::new(),
        }
    }

    /// Registers a declaration. Returns the key of the existing entry if one
    /// is already registered under the same key.
    pub fn register_type(&mut self, declaration: T) -> Result<(), K> {
        let key = declaration.registry_key();

        if self.types.contains_key(&key) {
            return Err(key);
        }

        self.insertion_order.push(key.clone());
        self.types.insert(key, declaration);

        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.types.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.types.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over all registered declarations in insertion order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = &T> {
        self.insertion_order
            .iter()
            .filter_map(|key| self.types.get(key))
    }

}

impl<K, T> Default for TypeRegistry<K, T>
where
    K: Eq + Hash + Clone,
    T: RegisteredType<K>,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Entry {
        name: String,
    }

    impl RegisteredType<String> for Entry {
        fn registry_key(&self) -> String {
            self.name.clone()
        }
    }

    #[test]
    fn register_type_rejects_duplicates() {
        let mut registry = TypeRegistry::<String, Entry>::new();

        assert!(registry
            .register_type(Entry {
                name: "Address".to_owned(),
            })
            .is_ok());
        assert_eq!(
            registry.register_type(Entry {
                name: "Address".to_owned(),
            }),
            Err("Address".to_owned())
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn iter_ordered_preserves_insertion_order() {
        let mut registry = TypeRegistry::<String, Entry>::new();

        for name in ["Zulu", "Alpha", "Mike"] {
            registry
                .register_type(Entry {
                    name: name.to_owned(),
                })
                .unwrap();
        }

        let names = registry
            .iter_ordered()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["Zulu", "Alpha", "Mike"]);
    }
}
