//! Inventory cache orchestration.
//!
//! [`DocInventory`] ties the pieces together: it registers inventory URLs
//! (fetch, parse, store, merge into the global index) and resolves symbol
//! names against the merged index. Registration is idempotent: re-adding a
//! known URL is a cheap no-op, and a document is fetched and parsed fully
//! in memory before any store write begins, so failures leave the store
//! exactly as it was.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use url::Url;

use crate::error::{DocdexError, Result};
use crate::fetch::{Fetch, HttpFetcher};
use crate::inventory::{GlobalIndex, Inventory, Topic};
use crate::parser;
use crate::paths;
use crate::store::{Shelf, ShelfScope};

/// Application identity used to derive the configuration directory.
pub const APP_NAME: &str = "DocDex";

/// File name of the shelf inside the configuration directory.
pub const SHELF_FILE: &str = "shelf.bin";

/// Reserved shelf key holding the serialized [`GlobalIndex`]. Never a
/// valid inventory URL, so it cannot collide with one.
pub const GLOBAL_INDEX_KEY: &str = "__global_index__";

/// Unbounded memo of parsed inventories, keyed by normalized URL.
///
/// Entries live for the lifetime of one [`DocInventory`] instance; there
/// is no eviction.
#[derive(Debug, Default)]
pub struct InventoryCache {
    entries: HashMap<String, Arc<Inventory>>,
}

impl InventoryCache {
    fn get(&self, url: &str) -> Option<Arc<Inventory>> {
        self.entries.get(url).cloned()
    }

    fn insert(&mut self, url: String, inventory: Arc<Inventory>) {
        self.entries.insert(url, inventory);
    }

    /// Number of memoized inventories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the memo is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The inventory cache: registers inventory sources and answers
/// "where is symbol X documented?" queries.
pub struct DocInventory {
    base_path: PathBuf,
    fetcher: Box<dyn Fetch>,
    parsed: InventoryCache,
}

impl DocInventory {
    /// Create a cache rooted at the OS-specific configuration directory.
    pub fn new() -> Self {
        Self::with_base_path(paths::config_directory(APP_NAME))
    }

    /// Create a cache rooted at an explicit directory.
    pub fn with_base_path<P: AsRef<Path>>(base_path: P) -> Self {
        DocInventory {
            base_path: base_path.as_ref().to_path_buf(),
            fetcher: Box::new(HttpFetcher::default()),
            parsed: InventoryCache::default(),
        }
    }

    /// Replace the fetch collaborator, builder-style.
    pub fn with_fetcher<F: Fetch + 'static>(mut self, fetcher: F) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Directory holding this cache's persisted state.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the shelf file.
    pub fn shelf_path(&self) -> PathBuf {
        self.base_path.join(SHELF_FILE)
    }

    fn open_shelf(&self) -> Result<Shelf> {
        paths::ensure_directory(&self.base_path)?;
        Shelf::open(self.shelf_path())
    }

    /// Register an inventory source. Fetches, parses, stores, and merges
    /// into the global index; a no-op when the normalized URL is already
    /// registered.
    pub fn add_url(&mut self, url: &str) -> Result<()> {
        let mut scope = ShelfScope::Owned(self.open_shelf()?);
        self.add_url_scoped(url, &mut scope)?;
        scope.release()
    }

    /// Like [`add_url`](Self::add_url), but through an already-open shelf
    /// so several operations can share one open/flush cycle. The caller
    /// retains ownership of release.
    pub fn add_url_in(&mut self, url: &str, shelf: &mut Shelf) -> Result<()> {
        let mut scope = ShelfScope::from(shelf);
        self.add_url_scoped(url, &mut scope)
    }

    fn add_url_scoped(&mut self, url: &str, shelf: &mut ShelfScope<'_>) -> Result<()> {
        let key = normalize_url(url)?;
        if shelf.contains(&key) {
            debug!("inventory already registered: {key}");
            return Ok(());
        }

        let base = Url::parse(&key).map_err(|e| DocdexError::malformed_url(format!("{key}: {e}")))?;
        let raw = self.fetcher.fetch(&key)?;
        let inventory = parser::parse(&raw, &base)?;

        // The document is fully fetched and parsed; only now touch the
        // store, so fetch/parse failures never leave partial state.
        shelf.set_value(&key, &inventory)?;
        let mut index: GlobalIndex = shelf.get_value(GLOBAL_INDEX_KEY)?.unwrap_or_default();
        index.add_inventory(&key, &inventory);
        shelf.set_value(GLOBAL_INDEX_KEY, &index)?;

        info!("registered inventory {key} ({} records)", inventory.len());
        self.parsed.insert(key, Arc::new(inventory));
        Ok(())
    }

    /// Resolve `name` against the global index.
    ///
    /// Returns a lazy, finite iterator of topics; an unknown name yields
    /// an empty iterator, never an error. The iterator holds the shelf
    /// handle for its lifetime and is not rewindable; call `lookup` again
    /// to restart.
    pub fn lookup(&mut self, name: &str) -> Result<Topics<'_>> {
        let shelf = self.open_shelf()?;
        let index: GlobalIndex = shelf.get_value(GLOBAL_INDEX_KEY)?.unwrap_or_default();
        let urls: VecDeque<String> = index.urls_for(name).into();
        debug!("lookup {name:?}: {} candidate inventories", urls.len());

        Ok(Topics {
            name: name.to_string(),
            shelf,
            urls,
            pending: VecDeque::new(),
            memo: &mut self.parsed,
        })
    }

    /// Registered inventory URLs, sorted.
    pub fn known_urls(&self) -> Result<Vec<String>> {
        let shelf = self.open_shelf()?;
        Ok(shelf
            .keys()
            .filter(|k| *k != GLOBAL_INDEX_KEY)
            .map(str::to_string)
            .collect())
    }

    /// Registered inventory URLs with their record counts, sorted.
    pub fn known_sources(&self) -> Result<Vec<(String, usize)>> {
        let shelf = self.open_shelf()?;
        let mut sources = Vec::new();
        for key in shelf.keys().filter(|k| *k != GLOBAL_INDEX_KEY) {
            let inventory: Option<Inventory> = shelf.get_value(key)?;
            let records = inventory.map(|i| i.len()).unwrap_or(0);
            sources.push((key.to_string(), records));
        }
        Ok(sources)
    }

    /// The memo of inventories parsed or loaded by this instance.
    pub fn parsed_cache(&self) -> &InventoryCache {
        &self.parsed
    }
}

impl Default for DocInventory {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy sequence of [`Topic`]s produced by [`DocInventory::lookup`].
///
/// Candidate inventories are loaded one at a time as the iterator is
/// pulled. A URL the index references without a stored inventory yields
/// [`DocdexError::CorruptIndex`] in place of a topic.
pub struct Topics<'a> {
    name: String,
    shelf: Shelf,
    urls: VecDeque<String>,
    pending: VecDeque<Topic>,
    memo: &'a mut InventoryCache,
}

impl Topics<'_> {
    fn inventory_for(&mut self, url: &str) -> Result<Arc<Inventory>> {
        if let Some(inventory) = self.memo.get(url) {
            return Ok(inventory);
        }

        let inventory: Inventory = self.shelf.get_value(url)?.ok_or_else(|| {
            DocdexError::corrupt_index(format!("indexed URL has no stored inventory: {url}"))
        })?;
        let inventory = Arc::new(inventory);
        self.memo.insert(url.to_string(), inventory.clone());
        Ok(inventory)
    }
}

impl Iterator for Topics<'_> {
    type Item = Result<Topic>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(topic) = self.pending.pop_front() {
                return Some(Ok(topic));
            }

            let url = self.urls.pop_front()?;
            match self.inventory_for(&url) {
                Ok(inventory) => self.pending.extend(inventory.topics_for(&self.name)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Normalize an inventory URL so equivalent spellings map to one store
/// key: the path is made to end in `objects.inv`, with the joining slash
/// inserted as needed.
pub fn normalize_url(url: &str) -> Result<String> {
    let mut parsed =
        Url::parse(url).map_err(|e| DocdexError::malformed_url(format!("{url}: {e}")))?;
    if parsed.cannot_be_a_base() {
        return Err(DocdexError::malformed_url(format!(
            "{url}: not a fetchable base URL"
        )));
    }

    let path = parsed.path().to_string();
    if !(path.ends_with("/objects.inv") || path == "objects.inv") {
        let joined = if path.ends_with('/') {
            format!("{path}objects.inv")
        } else {
            format!("{path}/objects.inv")
        };
        parsed.set_path(&joined);
    }

    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_equivalence() {
        let expected = "http://docs.example/objects.inv";
        assert_eq!(normalize_url("http://docs.example").unwrap(), expected);
        assert_eq!(normalize_url("http://docs.example/").unwrap(), expected);
        assert_eq!(
            normalize_url("http://docs.example/objects.inv").unwrap(),
            expected
        );
    }

    #[test]
    fn test_normalize_url_preserves_subpaths() {
        assert_eq!(
            normalize_url("https://docs.example/en/latest").unwrap(),
            "https://docs.example/en/latest/objects.inv"
        );
        assert_eq!(
            normalize_url("https://docs.example/en/latest/objects.inv").unwrap(),
            "https://docs.example/en/latest/objects.inv"
        );
    }

    #[test]
    fn test_normalize_url_rejects_garbage() {
        match normalize_url("not a url") {
            Err(DocdexError::MalformedUrl(_)) => {}
            other => panic!("expected MalformedUrl, got {other:?}"),
        }

        match normalize_url("mailto:docs@example.com") {
            Err(DocdexError::MalformedUrl(_)) => {}
            other => panic!("expected MalformedUrl, got {other:?}"),
        }
    }
}
