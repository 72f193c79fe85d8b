//! In-memory data model: parsed inventories, resolved topics, and the
//! merged global name index.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One resolved symbol occurrence.
///
/// Produced fresh on every lookup; never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Domain/role classifier, e.g. `py:function`.
    pub doctype: String,
    /// Project that published the inventory.
    pub project: String,
    /// Project version string.
    pub version: String,
    /// Absolute documentation URL.
    pub location: String,
    /// Display label; already resolved, never the `-` placeholder.
    pub display: String,
}

/// Stored record for one (doctype, name) pair within an inventory.
///
/// `display` keeps the raw wire value: the literal `-` means "use the
/// symbol name itself" and is resolved when a [`Topic`] is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub project: String,
    pub version: String,
    pub location: String,
    pub display: String,
}

impl InventoryEntry {
    /// Effective display label for a symbol named `name`.
    pub fn display_for<'a>(&'a self, name: &'a str) -> &'a str {
        if self.display == "-" {
            name
        } else {
            &self.display
        }
    }
}

/// Parsed content of one project's inventory document: doctype tag to
/// symbol name to entry. Names are unique per doctype; the same name may
/// appear under multiple doctypes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    entries: BTreeMap<String, BTreeMap<String, InventoryEntry>>,
}

impl Inventory {
    /// Create an empty inventory.
    pub fn new() -> Self {
        Inventory::default()
    }

    /// Insert a record. Duplicate (doctype, name) pairs overwrite:
    /// last write wins.
    pub fn insert(&mut self, doctype: &str, name: &str, entry: InventoryEntry) {
        self.entries
            .entry(doctype.to_string())
            .or_default()
            .insert(name.to_string(), entry);
    }

    /// Look up the entry for a (doctype, name) pair.
    pub fn get(&self, doctype: &str, name: &str) -> Option<&InventoryEntry> {
        self.entries.get(doctype).and_then(|names| names.get(name))
    }

    /// Iterate over the doctype tags present in this inventory.
    pub fn doctypes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Total number of records across all doctypes.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Whether the inventory holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeMap::is_empty)
    }

    /// Set of symbol names across all doctypes, deduplicated.
    pub fn names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for inner in self.entries.values() {
            for name in inner.keys() {
                names.insert(name.clone());
            }
        }
        names
    }

    /// One [`Topic`] per doctype in which `name` appears, in doctype order.
    pub fn topics_for(&self, name: &str) -> Vec<Topic> {
        let mut topics = Vec::new();
        for (doctype, inner) in &self.entries {
            if let Some(entry) = inner.get(name) {
                topics.push(Topic {
                    doctype: doctype.clone(),
                    project: entry.project.clone(),
                    version: entry.version.clone(),
                    location: entry.location.clone(),
                    display: entry.display_for(name).to_string(),
                });
            }
        }
        topics
    }
}

/// Merged mapping from symbol name to the set of inventory URLs known to
/// define it. Derived data: fully reconstructible by re-parsing every
/// stored inventory, persisted only to skip that rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalIndex {
    names: BTreeMap<String, BTreeSet<String>>,
}

impl GlobalIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        GlobalIndex::default()
    }

    /// Fold every symbol name of `inventory` into the index under `url`.
    pub fn add_inventory(&mut self, url: &str, inventory: &Inventory) {
        for name in inventory.names() {
            self.names.entry(name).or_default().insert(url.to_string());
        }
    }

    /// Inventory URLs known to define `name`, in sorted order. Unknown
    /// names yield an empty vector.
    pub fn urls_for(&self, name: &str) -> Vec<String> {
        self.names
            .get(name)
            .map(|urls| urls.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether any inventory defines `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of distinct indexed names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the index holds no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
