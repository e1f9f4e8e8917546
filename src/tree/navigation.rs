//! Derived navigation over the flat page sequence
//!
//! A [`PageView`] borrows the tree and computes relationships on demand. The
//! enabled-filtered accessors (`children`, `siblings`, `index`, `next`,
//! `prev`) skip disabled pages; the `all_*` / `position` / `following` /
//! `preceding` variants do not.

use super::{FlatTree, PageRecord};

/// Read-only view of one record and its surroundings
#[derive(Clone, Copy)]
pub struct PageView<'a> {
    tree: &'a FlatTree,
    pos: usize,
}

impl<'a> PageView<'a> {
    pub(crate) fn new(tree: &'a FlatTree, pos: usize) -> Self {
        Self { tree, pos }
    }

    pub fn record(&self) -> &'a PageRecord {
        self.tree.record_at(self.pos)
    }

    pub fn id(&self) -> Option<&'a str> {
        self.record().id()
    }

    pub fn enabled(&self) -> bool {
        self.record().enabled()
    }

    pub fn parent(&self) -> Option<PageView<'a>> {
        self.tree
            .parent_position(self.pos)
            .map(|pos| PageView::new(self.tree, pos))
    }

    /// Ancestor chain from the top-level record down to this one, inclusive
    pub fn branch(&self) -> Vec<PageView<'a>> {
        let mut chain = vec![*self];
        let mut current = self.parent();
        while let Some(view) = current {
            // a corrupt parent chain must not loop forever
            if chain.len() > self.tree.len() {
                break;
            }
            current = view.parent();
            chain.push(view);
        }
        chain.reverse();
        chain
    }

    pub fn all_children(&self) -> Vec<PageView<'a>> {
        self.views(self.tree.positions_under(Some(self.record().key)))
    }

    pub fn all_siblings(&self) -> Vec<PageView<'a>> {
        self.views(self.tree.sibling_positions(self.pos))
    }

    /// Enabled children (`$children`)
    pub fn children(&self) -> Vec<PageView<'a>> {
        self.all_children().into_iter().filter(|v| v.enabled()).collect()
    }

    /// Enabled siblings, this page included if enabled (`$siblings`)
    pub fn siblings(&self) -> Vec<PageView<'a>> {
        self.all_siblings().into_iter().filter(|v| v.enabled()).collect()
    }

    /// Position among all siblings
    pub fn position(&self) -> usize {
        self.tree
            .sibling_positions(self.pos)
            .iter()
            .position(|&p| p == self.pos)
            .unwrap_or(0)
    }

    /// Position among enabled siblings (`$index`); `None` when disabled.
    pub fn index(&self) -> Option<usize> {
        self.siblings().iter().position(|v| v.pos == self.pos)
    }

    /// Next enabled sibling (`$next`)
    pub fn next(&self) -> Option<PageView<'a>> {
        let index = self.index()?;
        self.siblings().get(index + 1).copied()
    }

    /// Previous enabled sibling (`$prev`)
    pub fn prev(&self) -> Option<PageView<'a>> {
        let index = self.index()?;
        let siblings = self.siblings();
        index.checked_sub(1).and_then(|i| siblings.get(i).copied())
    }

    /// Next sibling regardless of `enabled`
    pub fn following(&self) -> Option<PageView<'a>> {
        self.all_siblings().get(self.position() + 1).copied()
    }

    /// Previous sibling regardless of `enabled`
    pub fn preceding(&self) -> Option<PageView<'a>> {
        let position = self.position().checked_sub(1)?;
        self.all_siblings().get(position).copied()
    }

    /// Slash-joined names of the branch below the top-level record, spaces
    /// replaced by `_`. `None` if any of those pages has no name.
    pub fn path(&self) -> Option<String> {
        let names = self
            .branch()
            .into_iter()
            .skip(1)
            .map(|view| view.record().name().filter(|name| !name.is_empty()))
            .collect::<Option<Vec<_>>>()?;
        Some(names.join("/").replace(' ', "_"))
    }

    /// Route for links: `loc` if set, else `path`, wrapped in slashes.
    pub fn route(&self) -> Option<String> {
        let source = match self.record().loc() {
            Some(loc) => loc.replace(' ', "_"),
            None => self.path()?,
        };
        let mut route = source;
        if !route.starts_with('/') {
            route.insert(0, '/');
        }
        if !route.ends_with('/') {
            route.push('/');
        }
        Some(route)
    }

    /// Display title: `header` when non-empty, else `name`
    pub fn title(&self) -> Option<&'a str> {
        let record = self.record();
        match record.header() {
            Some(header) if !header.is_empty() => Some(header),
            _ => record.name(),
        }
    }

    /// Icon class token (`i-<icon>`)
    pub fn icon(&self) -> Option<String> {
        self.record()
            .icon()
            .filter(|icon| !icon.is_empty())
            .map(|icon| format!("i-{}", icon))
    }

    fn views(&self, positions: &[usize]) -> Vec<PageView<'a>> {
        positions
            .iter()
            .map(|&pos| PageView::new(self.tree, pos))
            .collect()
    }
}

impl PartialEq for PageView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.pos == other.pos
    }
}

impl std::fmt::Debug for PageView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageView")
            .field("id", &self.id())
            .field("position", &self.pos)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn site() -> FlatTree {
        FlatTree::from_nested(&[json!({
            "id": "root",
            "name": "index",
            "children": [
                {
                    "id": "about",
                    "name": "about us",
                    "header": "About",
                    "icon": "info",
                    "children": [
                        { "id": "team", "name": "team" },
                        { "id": "anon" }
                    ]
                },
                { "id": "hidden", "name": "hidden", "enabled": false },
                { "id": "blog", "name": "blog", "header": "", "children": [
                    { "id": "post", "name": "first post", "loc": "archive/first post" },
                    { "id": "second", "name": "second" }
                ]}
            ]
        })])
    }

    fn ids(views: &[PageView<'_>]) -> Vec<String> {
        views.iter().filter_map(|v| v.id()).map(String::from).collect()
    }

    #[test]
    fn test_enabled_filtering() {
        let tree = site();
        let root = tree.view("root").unwrap();
        assert_eq!(ids(&root.all_children()), vec!["about", "hidden", "blog"]);
        assert_eq!(ids(&root.children()), vec!["about", "blog"]);

        let blog = tree.view("blog").unwrap();
        assert_eq!(ids(&blog.siblings()), vec!["about", "blog"]);
        assert_eq!(blog.index(), Some(1));
        assert_eq!(blog.position(), 2);
        assert_eq!(blog.prev().and_then(|v| v.id()), Some("about"));
        assert!(blog.next().is_none());
        assert_eq!(blog.preceding().and_then(|v| v.id()), Some("hidden"));
    }

    #[test]
    fn test_disabled_page_has_no_index() {
        let tree = site();
        let hidden = tree.view("hidden").unwrap();
        assert_eq!(hidden.index(), None);
        assert!(hidden.next().is_none());
        assert!(hidden.prev().is_none());
        assert_eq!(hidden.following().and_then(|v| v.id()), Some("blog"));
    }

    #[test]
    fn test_path_and_route() {
        let tree = site();
        assert_eq!(tree.view("root").unwrap().path(), Some(String::new()));
        assert_eq!(tree.view("root").unwrap().route(), Some("/".to_string()));
        assert_eq!(tree.view("team").unwrap().path(), Some("about_us/team".to_string()));
        assert_eq!(
            tree.view("team").unwrap().route(),
            Some("/about_us/team/".to_string())
        );
        assert_eq!(tree.view("anon").unwrap().path(), None);
        assert_eq!(tree.view("anon").unwrap().route(), None);
        assert_eq!(
            tree.view("post").unwrap().route(),
            Some("/archive/first_post/".to_string())
        );
        assert_eq!(tree.view("post").unwrap().path(), Some("blog/first_post".to_string()));
    }

    #[test]
    fn test_title_and_icon() {
        let tree = site();
        assert_eq!(tree.view("about").unwrap().title(), Some("About"));
        assert_eq!(tree.view("blog").unwrap().title(), Some("blog"));
        assert_eq!(tree.view("anon").unwrap().title(), None);
        assert_eq!(tree.view("about").unwrap().icon(), Some("i-info".to_string()));
        assert_eq!(tree.view("blog").unwrap().icon(), None);
    }

    #[test]
    fn test_branch_and_parent() {
        let tree = site();
        let team = tree.view("team").unwrap();
        assert_eq!(ids(&team.branch()), vec!["root", "about", "team"]);
        assert_eq!(team.parent().and_then(|v| v.id()), Some("about"));
        assert!(tree.view("root").unwrap().parent().is_none());
    }
}
