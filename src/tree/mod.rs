//! Flattened page tree
//!
//! The page hierarchy is held as a single ordered sequence in pre-order
//! (document order): every record is followed by its whole subtree, and each
//! record stores a back-reference to its parent. Sibling order is the order
//! of the records in the sequence.
//!
//! Lookup indexes are rebuilt after every change rather than patched, and
//! every change drops the navigation installed on the records so nothing
//! derived can go stale.
//!
//! Structural operations that cannot find their target are no-ops returning
//! `None` / `false`. Top-level records are protected: they cannot be removed,
//! promoted or given siblings.

mod attach;
mod navigation;
mod page;

pub use attach::Navigation;
pub use navigation::PageView;
pub use page::{PageData, PageImage, PageRecord};

use page::RecordKey;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// The flat, order-preserving page store
#[derive(Clone, Debug, Default)]
pub struct FlatTree {
    records: Vec<PageRecord>,
    next_key: RecordKey,
    /// page id -> position (first occurrence)
    by_id: HashMap<String, usize>,
    /// record key -> position
    by_key: HashMap<RecordKey, usize>,
    /// parent key (None for top level) -> child positions in document order
    children: HashMap<Option<RecordKey>, Vec<usize>>,
}

impl FlatTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten nested page literals (each with an optional `children` array)
    /// into document order.
    ///
    /// Literals are stored as given: a `children` value that is not an
    /// array, or an entry that is not an object, stays in place for
    /// validation to reject.
    pub fn from_nested(pages: &[Value]) -> Self {
        let mut tree = Self::new();
        for page in pages {
            tree.flatten_into(page.clone(), None);
        }
        tree.reindex();
        tree
    }

    fn flatten_into(&mut self, mut page: Value, parent: Option<RecordKey>) {
        let nested = match page.as_object_mut() {
            Some(obj) if obj.get("children").is_some_and(Value::is_array) => {
                match obj.remove("children") {
                    Some(Value::Array(children)) => children,
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        };

        let key = self.allocate_key();
        self.records.push(PageRecord::new(key, parent, page));
        for child in nested {
            self.flatten_into(child, Some(key));
        }
    }

    fn allocate_key(&mut self) -> RecordKey {
        self.next_key += 1;
        self.next_key
    }

    /// Rebuild lookup indexes and drop installed navigation.
    fn reindex(&mut self) {
        self.by_id.clear();
        self.by_key.clear();
        self.children.clear();

        for (pos, record) in self.records.iter_mut().enumerate() {
            record.nav = None;
            self.by_key.insert(record.key, pos);
            if let Some(id) = record.id() {
                self.by_id.entry(id.to_string()).or_insert(pos);
            }
        }
        for (pos, record) in self.records.iter().enumerate() {
            self.children.entry(record.parent).or_default().push(pos);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in document order
    pub fn records(&self) -> &[PageRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter()
    }

    /// Page ids in document order
    pub fn ids(&self) -> Vec<&str> {
        self.records.iter().filter_map(PageRecord::id).collect()
    }

    pub fn get(&self, id: &str) -> Option<&PageRecord> {
        self.position(id).map(|pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Navigation view over a record
    pub fn view(&self, id: &str) -> Option<PageView<'_>> {
        self.position(id).map(|pos| PageView::new(self, pos))
    }

    /// Views over every record in document order
    pub fn views(&self) -> impl Iterator<Item = PageView<'_>> {
        (0..self.records.len()).map(move |pos| PageView::new(self, pos))
    }

    /// Top-level records in document order
    pub fn roots(&self) -> Vec<&PageRecord> {
        self.positions_under(None)
            .iter()
            .map(|&pos| &self.records[pos])
            .collect()
    }

    /// Records whose parent is `id`; empty for unknown ids and leaves.
    pub fn children_of(&self, id: &str) -> Vec<&PageRecord> {
        match self.position(id) {
            Some(pos) => self
                .positions_under(Some(self.records[pos].key))
                .iter()
                .map(|&p| &self.records[p])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Records sharing `id`'s parent, `id` included; empty for unknown ids.
    pub fn siblings_of(&self, id: &str) -> Vec<&PageRecord> {
        match self.position(id) {
            Some(pos) => self
                .sibling_positions(pos)
                .iter()
                .map(|&p| &self.records[p])
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn parent_of(&self, id: &str) -> Option<&PageRecord> {
        let pos = self.position(id)?;
        self.parent_position(pos).map(|p| &self.records[p])
    }

    /// True when every record is an object with a string id and no id repeats.
    pub fn has_unique_ids(&self) -> bool {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .all(|record| record.id().is_some_and(|id| seen.insert(id)))
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub(crate) fn record_at(&self, pos: usize) -> &PageRecord {
        &self.records[pos]
    }

    pub(crate) fn positions_under(&self, parent: Option<RecordKey>) -> &[usize] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn sibling_positions(&self, pos: usize) -> &[usize] {
        self.positions_under(self.records[pos].parent)
    }

    pub(crate) fn parent_position(&self, pos: usize) -> Option<usize> {
        self.records[pos]
            .parent
            .and_then(|key| self.by_key.get(&key).copied())
    }

    /// Range covering the record at `pos` and its descendants.
    fn subtree(&self, pos: usize) -> Range<usize> {
        let key = self.records[pos].key;
        let mut end = pos + 1;
        while end < self.records.len() && self.descends_from(end, key) {
            end += 1;
        }
        pos..end
    }

    fn descends_from(&self, pos: usize, ancestor: RecordKey) -> bool {
        let mut current = self.parent_position(pos);
        // bounded walk: a corrupt parent chain must not loop forever
        for _ in 0..self.records.len() {
            match current {
                Some(p) if self.records[p].key == ancestor => return true,
                Some(p) => current = self.parent_position(p),
                None => return false,
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Structural mutations
    // ------------------------------------------------------------------

    /// Insert `page` as the last child of `parent_id`.
    ///
    /// Returns the new record's id, or `None` if the parent is unknown or
    /// `page` has no string id or reuses an existing one.
    pub fn add(&mut self, parent_id: &str, page: Value) -> Option<String> {
        let parent_pos = self.position(parent_id)?;
        let id = self.fresh_id(&page)?;
        let at = self.subtree(parent_pos).end;
        let key = self.allocate_key();
        let parent_key = self.records[parent_pos].key;
        self.records
            .insert(at, PageRecord::new(key, Some(parent_key), strip_children(page)));
        self.reindex();
        Some(id)
    }

    /// Insert `page` right after `id`'s subtree, under the same parent.
    pub fn add_sibling(&mut self, id: &str, page: Value) -> Option<String> {
        let pos = self.position(id)?;
        let parent_key = self.records[pos].parent?;
        let new_id = self.fresh_id(&page)?;
        let at = self.subtree(pos).end;
        let key = self.allocate_key();
        self.records
            .insert(at, PageRecord::new(key, Some(parent_key), strip_children(page)));
        self.reindex();
        Some(new_id)
    }

    /// Remove `id` together with its whole subtree.
    ///
    /// Returns the former parent's id; `None` for unknown ids and top-level
    /// records.
    pub fn remove(&mut self, id: &str) -> Option<String> {
        let pos = self.position(id)?;
        let parent_pos = self.parent_position(pos)?;
        let parent_id = self.records[parent_pos].id()?.to_string();
        let range = self.subtree(pos);
        self.records.drain(range);
        self.reindex();
        Some(parent_id)
    }

    /// Move `id` one place earlier among its siblings. Returns whether it moved.
    pub fn up(&mut self, id: &str) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let siblings = self.sibling_positions(pos);
        let Some(at) = siblings.iter().position(|&p| p == pos) else {
            return false;
        };
        if at == 0 {
            return false;
        }
        let prev = siblings[at - 1];
        let own = self.subtree(pos);
        self.records[prev..own.end].rotate_left(pos - prev);
        self.reindex();
        true
    }

    /// Move `id` one place later among its siblings. Returns whether it moved.
    pub fn down(&mut self, id: &str) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let siblings = self.sibling_positions(pos);
        let Some(at) = siblings.iter().position(|&p| p == pos) else {
            return false;
        };
        let Some(&next) = siblings.get(at + 1) else {
            return false;
        };
        let own = self.subtree(pos);
        let following = self.subtree(next);
        self.records[own.start..following.end].rotate_left(own.len());
        self.reindex();
        true
    }

    /// Promote `id` to a sibling of its parent, placed right after the
    /// parent's subtree. Returns the new parent's id.
    pub fn left(&mut self, id: &str) -> Option<String> {
        let pos = self.position(id)?;
        let parent_pos = self.parent_position(pos)?;
        let grand_pos = self.parent_position(parent_pos)?;
        let parent_key = self.records[parent_pos].key;
        let grand_key = self.records[grand_pos].key;
        let grand_id = self.records[grand_pos].id()?.to_string();

        let range = self.subtree(pos);
        let mut block: Vec<PageRecord> = self.records.drain(range).collect();
        block[0].parent = Some(grand_key);
        self.reindex();

        let at = self.subtree(self.by_key[&parent_key]).end;
        self.records.splice(at..at, block);
        self.reindex();
        Some(grand_id)
    }

    /// Demote `id` to the last child of its preceding sibling. Returns the
    /// new parent's id, or `None` when there is no preceding sibling.
    pub fn right(&mut self, id: &str) -> Option<String> {
        let pos = self.position(id)?;
        let siblings = self.sibling_positions(pos);
        let at = siblings.iter().position(|&p| p == pos)?;
        let prev = *siblings.get(at.checked_sub(1)?)?;
        let prev_key = self.records[prev].key;
        let prev_id = self.records[prev].id()?.to_string();

        let range = self.subtree(pos);
        let mut block: Vec<PageRecord> = self.records.drain(range).collect();
        block[0].parent = Some(prev_key);
        self.reindex();

        // prev precedes the moved block, so its position is unchanged
        let end = self.subtree(prev).end;
        self.records.splice(end..end, block);
        self.reindex();
        Some(prev_id)
    }

    // ------------------------------------------------------------------
    // Field mutations and validation support
    // ------------------------------------------------------------------

    /// Edit a record's fields.
    ///
    /// `f` works on a copy that is committed only if it keeps the record's
    /// id; an edit that changes or drops the id is refused and leaves the
    /// record untouched. Returns false for unknown ids and refused edits.
    pub fn update<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut serde_json::Map<String, Value>),
    {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let Some(mut fields) = self.records[pos].fields.as_object().cloned() else {
            return false;
        };

        f(&mut fields);
        if fields.get("id").and_then(Value::as_str) != Some(id) {
            log::debug!("Refusing edit that changes the id of page {}", id);
            return false;
        }
        fields.remove("children");

        self.records[pos].fields = Value::Object(fields);
        self.reindex();
        true
    }

    /// Replace every record with a single top-level `page`.
    pub fn reset(&mut self, page: Value) {
        self.records.clear();
        let key = self.allocate_key();
        self.records.push(PageRecord::new(key, None, strip_children(page)));
        self.reindex();
    }

    /// The records' fields as a JSON array, for validation against `nodes`
    pub fn to_flat_value(&self) -> Value {
        Value::Array(self.records.iter().map(|r| r.fields.clone()).collect())
    }

    /// Write repaired fields back, one value per record in order.
    ///
    /// Returns false (leaving the tree untouched) if the count differs.
    pub(crate) fn replace_fields(&mut self, values: Vec<Value>) -> bool {
        if values.len() != self.records.len() {
            return false;
        }
        for (record, fields) in self.records.iter_mut().zip(values) {
            record.fields = strip_children(fields);
        }
        self.reindex();
        true
    }

    /// Emit the tree as nested page literals with `children` arrays.
    pub fn to_nested(&self) -> Vec<Value> {
        self.positions_under(None)
            .iter()
            .map(|&pos| self.nest(pos))
            .collect()
    }

    fn nest(&self, pos: usize) -> Value {
        let mut page = self.records[pos].fields.clone();
        let children: Vec<Value> = self
            .positions_under(Some(self.records[pos].key))
            .iter()
            .map(|&child| self.nest(child))
            .collect();
        if let Some(obj) = page.as_object_mut() {
            obj.insert("children".to_string(), Value::Array(children));
        }
        page
    }

    fn fresh_id(&self, page: &Value) -> Option<String> {
        let id = page.get("id")?.as_str()?;
        if self.contains(id) {
            log::debug!("Refusing to insert duplicate page id {}", id);
            return None;
        }
        Some(id.to_string())
    }
}

fn strip_children(mut page: Value) -> Value {
    if let Some(obj) = page.as_object_mut() {
        obj.remove("children");
    }
    page
}
