//! Category → tracepoint mapping produced by discovery
//!
//! Both discovery paths (manifest parsing and HAL probing) fill the same
//! `CategoryMap`. Categories keep the order in which they were first seen,
//! and the tracepoints under a category keep the order their source
//! reported them in.
//!
//! ```text
//! CategoryMap
//! ├── "gfx"    → [foo/bar, g/a, g/b]
//! └── "memory" → [grp/evt]
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeSet, HashMap};

use crate::tracepoint::Tracepoint;

/// Insertion-ordered map from category name to its tracepoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap {
    entries: Vec<(String, Vec<Tracepoint>)>,
    /// Category name → position in `entries`
    index: HashMap<String, usize>,
}

/// Result of expanding requested category names into tracepoints
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Resolved {
    /// Union of the tracepoints of every known requested category, sorted
    pub tracepoints: Vec<Tracepoint>,
    /// Requested names with no entry in the map, in request order
    pub unknown: Vec<String>,
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracepoint list for `category`, appending an empty one if the
    /// category has not been seen yet.
    ///
    /// A category that already exists keeps its position and its events;
    /// callers extend the returned list.
    pub fn entry(&mut self, category: &str) -> &mut Vec<Tracepoint> {
        let pos = match self.index.get(category) {
            Some(&pos) => pos,
            None => {
                let pos = self.entries.len();
                self.entries.push((category.to_string(), Vec::new()));
                self.index.insert(category.to_string(), pos);
                pos
            }
        };
        &mut self.entries[pos].1
    }

    /// Append one tracepoint under `category`.
    pub fn push(&mut self, category: &str, tracepoint: Tracepoint) {
        self.entry(category).push(tracepoint);
    }

    pub fn get(&self, category: &str) -> Option<&[Tracepoint]> {
        self.index
            .get(category)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    pub fn contains(&self, category: &str) -> bool {
        self.index.contains_key(category)
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of tracepoints across all categories
    pub fn tracepoint_count(&self) -> usize {
        self.entries.iter().map(|(_, tps)| tps.len()).sum()
    }

    /// Category names in insertion order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Tracepoint])> {
        self.entries
            .iter()
            .map(|(name, tps)| (name.as_str(), tps.as_slice()))
    }

    /// Expand requested category names into the concrete tracepoints to
    /// enable.
    ///
    /// Tracepoints shared between categories appear once. Unknown names are
    /// not an error; they are returned so the caller can decide.
    pub fn resolve<S: AsRef<str>>(&self, requested: &[S]) -> Resolved {
        let mut tracepoints = BTreeSet::new();
        let mut unknown = Vec::new();

        for category in requested {
            let category = category.as_ref();
            match self.get(category) {
                Some(tps) => tracepoints.extend(tps.iter().cloned()),
                None => unknown.push(category.to_string()),
            }
        }

        Resolved {
            tracepoints: tracepoints.into_iter().collect(),
            unknown,
        }
    }
}

impl Serialize for CategoryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (category, tracepoints) in &self.entries {
            map.serialize_entry(category, tracepoints)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tp(group: &str, name: &str) -> Tracepoint {
        Tracepoint::new(group, name).unwrap()
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut map = CategoryMap::new();
        map.push("memory", tp("grp", "evt"));
        map.push("gfx", tp("foo", "bar"));
        map.push("audio", tp("snd", "pcm"));

        let names: Vec<&str> = map.categories().collect();
        assert_eq!(names, vec!["memory", "gfx", "audio"]);
    }

    #[test]
    fn test_entry_merges_existing_category() {
        let mut map = CategoryMap::new();
        map.push("gfx", tp("foo", "bar"));
        map.push("memory", tp("grp", "evt"));
        map.push("gfx", tp("g", "a"));

        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get("gfx").unwrap(),
            &[tp("foo", "bar"), tp("g", "a")]
        );
        assert_eq!(map.categories().next(), Some("gfx"));
        assert_eq!(map.tracepoint_count(), 3);
    }

    #[test]
    fn test_empty_category_is_recorded() {
        let mut map = CategoryMap::new();
        map.entry("idle");
        assert!(map.contains("idle"));
        assert_eq!(map.get("idle").unwrap().len(), 0);
        assert!(!map.is_empty());
    }

    #[test]
    fn test_resolve_dedups_and_reports_unknown() {
        let mut map = CategoryMap::new();
        map.push("gfx", tp("g", "b"));
        map.push("gfx", tp("g", "a"));
        map.push("memory", tp("g", "a"));

        let resolved = map.resolve(&["memory", "camera", "gfx"]);
        assert_eq!(
            resolved.tracepoints,
            vec![tp("g", "a"), tp("g", "b")]
        );
        assert_eq!(resolved.unknown, vec!["camera".to_string()]);
    }

    #[test]
    fn test_serialize_keeps_category_order() {
        let mut map = CategoryMap::new();
        map.push("zeta", tp("z", "1"));
        map.push("alpha", tp("a", "1"));

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"zeta":["z/1"],"alpha":["a/1"]}"#);
    }
}
