//! Installing derived navigation on records
//!
//! After a successful validation pass the page tree policy calls
//! [`FlatTree::attach`], which snapshots each record's [`PageView`] accessors
//! into a plain [`Navigation`] value stored on the record. Records that
//! already carry one are skipped; any change to the tree drops every
//! snapshot, so an installed value is always current.

use super::{FlatTree, PageView};
use serde::Serialize;

/// The derived fields of a page, as plain data
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    /// Ids of enabled children
    pub children: Vec<String>,
    /// Ids of enabled siblings, this page included if enabled
    pub siblings: Vec<String>,
    /// Position among enabled siblings
    pub index: Option<usize>,
    pub next: Option<String>,
    pub prev: Option<String>,
    pub path: Option<String>,
    pub route: Option<String>,
    pub title: Option<String>,
    pub icon: Option<String>,
}

fn owned_ids(views: Vec<PageView<'_>>) -> Vec<String> {
    views
        .into_iter()
        .filter_map(|v| v.id().map(String::from))
        .collect()
}

impl Navigation {
    pub fn capture(view: &PageView<'_>) -> Self {
        Self {
            children: owned_ids(view.children()),
            siblings: owned_ids(view.siblings()),
            index: view.index(),
            next: view.next().and_then(|v| v.id().map(String::from)),
            prev: view.prev().and_then(|v| v.id().map(String::from)),
            path: view.path(),
            route: view.route(),
            title: view.title().map(String::from),
            icon: view.icon(),
        }
    }
}

impl FlatTree {
    /// Install navigation on every record that lacks it.
    ///
    /// Idempotent: returns how many records were newly attached, zero on a
    /// repeated call with no change in between.
    pub fn attach(&mut self) -> usize {
        let pending: Vec<(usize, Navigation)> = self
            .views()
            .enumerate()
            .filter(|(_, view)| !view.record().is_attached())
            .map(|(pos, view)| (pos, Navigation::capture(&view)))
            .collect();

        let attached = pending.len();
        for (pos, nav) in pending {
            self.records[pos].nav = Some(nav);
        }
        attached
    }

    /// True when every record carries navigation
    pub fn is_attached(&self) -> bool {
        self.records.iter().all(|r| r.is_attached())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> FlatTree {
        FlatTree::from_nested(&[json!({
            "id": "root",
            "children": [
                { "id": "a", "name": "a" },
                { "id": "b", "name": "b b", "enabled": false },
                { "id": "c", "name": "c", "icon": "star" }
            ]
        })])
    }

    #[test]
    fn test_attach_is_idempotent() {
        let mut tree = tree();
        assert!(!tree.is_attached());
        assert_eq!(tree.attach(), 4);
        assert!(tree.is_attached());
        assert_eq!(tree.attach(), 0);
    }

    #[test]
    fn test_attached_values_match_view() {
        let mut tree = tree();
        tree.attach();

        let nav = tree.get("a").unwrap().navigation().unwrap().clone();
        assert_eq!(nav.siblings, vec!["a", "c"]);
        assert_eq!(nav.index, Some(0));
        assert_eq!(nav.next.as_deref(), Some("c"));
        assert_eq!(nav.prev, None);
        assert_eq!(nav.route.as_deref(), Some("/a/"));

        let hidden = tree.get("b").unwrap().navigation().unwrap();
        assert_eq!(hidden.index, None);
        assert_eq!(hidden.path.as_deref(), Some("b_b"));

        let c = tree.get("c").unwrap().navigation().unwrap();
        assert_eq!(c.icon.as_deref(), Some("i-star"));
        assert_eq!(c.title.as_deref(), Some("c"));
    }

    #[test]
    fn test_changes_drop_navigation() {
        let mut tree = tree();
        tree.attach();
        tree.down("a");
        assert!(!tree.is_attached());

        tree.attach();
        let nav = tree.get("a").unwrap().navigation().unwrap();
        assert_eq!(nav.index, Some(0));
        assert_eq!(nav.prev, None);
        assert_eq!(nav.next.as_deref(), Some("c"));
    }
}
