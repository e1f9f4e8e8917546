//! The document store
//!
//! [`DocumentStore`] is the context object owning every managed document: the
//! page tree plus the import map, credentials, fonts, feed and chat log. It is
//! built once per application instance and passed to whatever needs it.
//!
//! Each document carries a repair policy registered as a watcher and run once
//! eagerly at construction, then again after every change made through the
//! store.

mod config;
mod document;
mod policy;

pub use config::{ConfigError, StoreConfig};
pub use document::{Document, DocumentMetadata, DocumentStatus, Watcher};
pub use policy::{default_page, ImportMapPolicy, PageTreePolicy, RevalidatePolicy};

use crate::fonts;
use crate::schema::definitions::{CREDENTIALS, FEED, FONTS, IMPORTMAP, LOG, NODES, PAGE};
use crate::schema::{SchemaError, SchemaRegistry};
use crate::tree::{FlatTree, PageRecord, PageView};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// The managed documents other than the page tree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentKind {
    ImportMap,
    Credentials,
    Fonts,
    Feed,
    Log,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 5] = [
        DocumentKind::ImportMap,
        DocumentKind::Credentials,
        DocumentKind::Fonts,
        DocumentKind::Feed,
        DocumentKind::Log,
    ];

    /// Short name of the schema validating this document
    pub fn schema_name(&self) -> &'static str {
        match self {
            DocumentKind::ImportMap => IMPORTMAP,
            DocumentKind::Credentials => CREDENTIALS,
            DocumentKind::Fonts => FONTS,
            DocumentKind::Feed => FEED,
            DocumentKind::Log => LOG,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.schema_name())
    }
}

pub struct DocumentStore {
    registry: Arc<SchemaRegistry>,
    pages: Document<FlatTree>,
    importmap: Document<Value>,
    credentials: Document<Value>,
    fonts: Document<Value>,
    feed: Document<Value>,
    log: Document<Value>,
}

impl DocumentStore {
    /// A store with empty documents
    pub fn new(registry: Arc<SchemaRegistry>) -> Result<Self, SchemaError> {
        Self::from_config(registry, StoreConfig::default())
    }

    /// A store starting from `config`, every document validated right away.
    ///
    /// Fails if the registry lacks one of the schemas the store validates
    /// against.
    pub fn from_config(
        registry: Arc<SchemaRegistry>,
        config: StoreConfig,
    ) -> Result<Self, SchemaError> {
        for name in [PAGE, NODES, IMPORTMAP, CREDENTIALS, FONTS, FEED, LOG] {
            if registry.validator_for(name).is_none() {
                return Err(SchemaError::UnknownSchema(name.to_string()));
            }
        }

        let mut pages = Document::new("pages", FlatTree::from_nested(&config.pages));
        pages.watch(Box::new(PageTreePolicy::new(registry.clone())), true);

        let mut importmap = Document::new(IMPORTMAP, config.importmap);
        importmap.watch(Box::new(ImportMapPolicy::new(registry.clone())), true);

        let revalidated = |name: &str, value: Value| {
            let mut document = Document::new(name, value);
            document.watch(Box::new(RevalidatePolicy::new(registry.clone(), name)), true);
            document
        };
        let credentials = revalidated(CREDENTIALS, config.credentials);
        let fonts = revalidated(FONTS, config.fonts);
        let feed = revalidated(FEED, config.feed);
        let chat_log = revalidated(LOG, config.log);

        let store = Self {
            registry,
            pages,
            importmap,
            credentials,
            fonts,
            feed,
            log: chat_log,
        };
        log::info!(
            "Document store ready: {} pages ({:?})",
            store.pages().len(),
            store.page_status()
        );
        Ok(store)
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Export every document's current value
    pub fn to_config(&self) -> StoreConfig {
        StoreConfig {
            pages: self.pages().to_nested(),
            importmap: self.importmap.get().clone(),
            credentials: self.credentials.get().clone(),
            fonts: self.fonts.get().clone(),
            feed: self.feed.get().clone(),
            log: self.log.get().clone(),
        }
    }

    // ------------------------------------------------------------------
    // Page tree
    // ------------------------------------------------------------------

    pub fn pages(&self) -> &FlatTree {
        self.pages.get()
    }

    pub fn page(&self, id: &str) -> Option<PageView<'_>> {
        self.pages().view(id)
    }

    pub fn children_of(&self, id: &str) -> Vec<&PageRecord> {
        self.pages().children_of(id)
    }

    pub fn siblings_of(&self, id: &str) -> Vec<&PageRecord> {
        self.pages().siblings_of(id)
    }

    pub fn page_status(&self) -> DocumentStatus {
        self.pages.status()
    }

    pub fn page_document(&self) -> &Document<FlatTree> {
        &self.pages
    }

    /// Replace the whole tree with `pages` (top-level literals with nested
    /// `children`). An invalid tree is reset to a single default page.
    pub fn assign_pages(&mut self, pages: Vec<Value>) -> DocumentStatus {
        self.pages.set(FlatTree::from_nested(&pages));
        self.pages.status()
    }

    /// Edit one page's fields. Returns false for unknown ids and for edits
    /// that would change the page id; those leave the tree untouched.
    pub fn update_page<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        self.pages
            .update_if(|tree| tree.update(id, f).then_some(()))
            .is_some()
    }

    /// Insert a default page as the last child of `parent_id`.
    pub fn add(&mut self, parent_id: &str) -> Option<String> {
        let page = default_page(&self.registry);
        let added = self.pages.update_if(|tree| tree.add(parent_id, page));
        if added.is_none() {
            log::debug!("add: no page {}", parent_id);
        }
        added
    }

    /// Insert a default page right after `id`'s subtree.
    pub fn add_sibling(&mut self, id: &str) -> Option<String> {
        let page = default_page(&self.registry);
        let added = self.pages.update_if(|tree| tree.add_sibling(id, page));
        if added.is_none() {
            log::debug!("add_sibling: no movable page {}", id);
        }
        added
    }

    /// Remove `id` and its subtree, returning the former parent's id.
    pub fn remove(&mut self, id: &str) -> Option<String> {
        let parent = self.pages.update_if(|tree| tree.remove(id));
        if parent.is_none() {
            log::debug!("remove: no removable page {}", id);
        }
        parent
    }

    /// Move `id` one place earlier among its siblings.
    pub fn up(&mut self, id: &str) -> bool {
        let moved = self.pages.update_if(|tree| tree.up(id).then_some(())).is_some();
        if !moved {
            log::debug!("up: {} cannot move", id);
        }
        moved
    }

    /// Move `id` one place later among its siblings.
    pub fn down(&mut self, id: &str) -> bool {
        let moved = self
            .pages
            .update_if(|tree| tree.down(id).then_some(()))
            .is_some();
        if !moved {
            log::debug!("down: {} cannot move", id);
        }
        moved
    }

    /// Promote `id` next to its parent, returning the new parent's id.
    pub fn left(&mut self, id: &str) -> Option<String> {
        let parent = self.pages.update_if(|tree| tree.left(id));
        if parent.is_none() {
            log::debug!("left: {} cannot be promoted", id);
        }
        parent
    }

    /// Demote `id` under its preceding sibling, returning that sibling's id.
    pub fn right(&mut self, id: &str) -> Option<String> {
        let parent = self.pages.update_if(|tree| tree.right(id));
        if parent.is_none() {
            log::debug!("right: {} has no preceding sibling", id);
        }
        parent
    }

    pub fn subscribe_pages(
        &mut self,
        callback: impl Fn(&FlatTree) + Send + Sync + 'static,
    ) -> Uuid {
        self.pages.subscribe(Box::new(callback))
    }

    pub fn unsubscribe_pages(&mut self, id: Uuid) -> bool {
        self.pages.unsubscribe(id)
    }

    // ------------------------------------------------------------------
    // Other documents
    // ------------------------------------------------------------------

    pub fn document(&self, kind: DocumentKind) -> &Document<Value> {
        match kind {
            DocumentKind::ImportMap => &self.importmap,
            DocumentKind::Credentials => &self.credentials,
            DocumentKind::Fonts => &self.fonts,
            DocumentKind::Feed => &self.feed,
            DocumentKind::Log => &self.log,
        }
    }

    fn document_mut(&mut self, kind: DocumentKind) -> &mut Document<Value> {
        match kind {
            DocumentKind::ImportMap => &mut self.importmap,
            DocumentKind::Credentials => &mut self.credentials,
            DocumentKind::Fonts => &mut self.fonts,
            DocumentKind::Feed => &mut self.feed,
            DocumentKind::Log => &mut self.log,
        }
    }

    pub fn get(&self, kind: DocumentKind) -> &Value {
        self.document(kind).get()
    }

    pub fn status(&self, kind: DocumentKind) -> DocumentStatus {
        self.document(kind).status()
    }

    /// Replace a document's value; returns the status after its policy ran.
    pub fn assign(&mut self, kind: DocumentKind, value: Value) -> DocumentStatus {
        let document = self.document_mut(kind);
        document.set(value);
        document.status()
    }

    /// Mutate a document in place; its policy runs afterwards.
    pub fn update<R>(&mut self, kind: DocumentKind, f: impl FnOnce(&mut Value) -> R) -> R {
        self.document_mut(kind).update(f)
    }

    pub fn subscribe(
        &mut self,
        kind: DocumentKind,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) -> Uuid {
        self.document_mut(kind).subscribe(Box::new(callback))
    }

    pub fn unsubscribe(&mut self, kind: DocumentKind, id: Uuid) -> bool {
        self.document_mut(kind).unsubscribe(id)
    }

    /// Font family key -> display name, for the families in the fonts document
    pub fn font_families(&self) -> BTreeMap<String, String> {
        let families: Vec<&str> = self
            .fonts
            .get()
            .as_array()
            .map(|fonts| fonts.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        fonts::font_families(&families)
    }
}

impl Drop for DocumentStore {
    fn drop(&mut self) {
        self.pages.clear_observers();
        for kind in DocumentKind::ALL {
            self.document_mut(kind).clear_observers();
        }
        log::debug!("Document store torn down");
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("registry", &self.registry)
            .field("pages", &self.pages.get().len())
            .field("page_status", &self.pages.status())
            .finish()
    }
}
