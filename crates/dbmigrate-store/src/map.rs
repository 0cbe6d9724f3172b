use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use dbmigrate_common::{Migration, MigrationId};

/// Fully loaded migrations keyed by ID. Every dependency referenced by a
/// member is itself a member and is shared, not copied.
#[derive(Debug, Clone, Default)]
pub struct MigrationMap {
    inner: BTreeMap<MigrationId, Arc<Migration>>,
}

impl MigrationMap {
    pub(crate) fn insert(&mut self, migration: Arc<Migration>) {
        self.inner.insert(migration.id.clone(), migration);
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Migration>> {
        self.inner.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// IDs in lexical order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Every migration placed after all of its dependencies. Among
    /// migrations that are ready at the same time the lowest ID goes first.
    pub fn dependency_order(&self) -> Vec<&Arc<Migration>> {
        let mut remaining: BTreeMap<&str, BTreeSet<&str>> = self
            .inner
            .iter()
            .map(|(id, m)| (id.as_str(), m.dependency_ids().collect()))
            .collect();
        let mut ordered = Vec::with_capacity(self.inner.len());

        // A loaded map is acyclic, so some migration is always ready.
        while let Some(next) = remaining
            .iter()
            .find(|(_, deps)| deps.is_empty())
            .map(|(id, _)| *id)
        {
            remaining.remove(next);
            for deps in remaining.values_mut() {
                deps.remove(next);
            }
            if let Some(m) = self.inner.get(next) {
                ordered.push(m);
            }
        }

        ordered
    }

    /// IDs of the migrations that list `id` as a direct dependency.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.inner
            .values()
            .filter(|m| m.depends_on(id))
            .map(|m| m.id.as_str())
            .collect()
    }
}

impl<'a> IntoIterator for &'a MigrationMap {
    type Item = (&'a MigrationId, &'a Arc<Migration>);
    type IntoIter = std::collections::btree_map::Iter<'a, MigrationId, Arc<Migration>>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migration(id: &str, deps: &[&Arc<Migration>]) -> Arc<Migration> {
        Arc::new(Migration {
            dependencies: deps.iter().map(|d| Arc::clone(*d)).collect(),
            ..Migration::new(id)
        })
    }

    fn diamond() -> MigrationMap {
        let d = migration("d", &[]);
        let b = migration("b", &[&d]);
        let c = migration("c", &[&d]);
        let a = migration("a", &[&c, &b]);

        let mut map = MigrationMap::default();
        for m in [a, b, c, d] {
            map.insert(m);
        }
        map
    }

    #[test]
    fn dependency_order_puts_dependencies_first() {
        let map = diamond();
        let order: Vec<&str> = map
            .dependency_order()
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(order, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn dependents_are_sorted() {
        let map = diamond();
        assert_eq!(map.dependents_of("d"), vec!["b", "c"]);
        assert_eq!(map.dependents_of("b"), vec!["a"]);
        assert!(map.dependents_of("a").is_empty());
    }

    #[test]
    fn lookups() {
        let map = diamond();
        assert_eq!(map.len(), 4);
        assert!(map.contains("a"));
        assert!(!map.contains("e"));
        assert_eq!(map.ids().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);
        assert_eq!(map.get("a").unwrap().dependency_ids().collect::<Vec<_>>(), vec!["c", "b"]);
    }
}
