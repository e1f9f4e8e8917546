//! Page tree property tests
//!
//! Builds random nested sites (random nesting, `enabled`, `name` and `loc`)
//! and drives them through random sequences of structural operations on the
//! store. After every step the flat tree must stay in pre-order with unique
//! ids, and every page's derived navigation must follow the sibling and
//! branch rules.
//!
//! Run with:
//!   cargo test --test page_tree_properties

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use proptest::prelude::*;
use proptest::sample::Index;
use proptest::test_runner::TestCaseError;
use serde_json::{json, Map, Value};

use sitedata::schema::definitions::NODES;
use sitedata::{DocumentStatus, DocumentStore, FlatTree, Navigation, SchemaRegistry, StoreConfig};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct PageSpec {
    enabled: bool,
    name: Option<String>,
    loc: Option<String>,
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Add,
    AddSibling,
    Remove,
    Up,
    Down,
    Left,
    Right,
}

fn arb_page() -> impl Strategy<Value = PageSpec> {
    (
        prop::bool::weighted(0.8),
        prop::option::of("[a-z ]{0,6}"),
        prop::option::weighted(0.2, "[a-z/]{1,8}"),
    )
        .prop_map(|(enabled, name, loc)| PageSpec { enabled, name, loc })
}

/// A nested site of up to 24 pages with ids `p0`, `p1`, ...
///
/// Page `i` hangs under an earlier page picked at random, or is top-level
/// when the pick lands on itself.
fn arb_site() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec((arb_page(), any::<Index>()), 1..24).prop_map(|nodes| {
        let parents: Vec<Option<usize>> = nodes
            .iter()
            .enumerate()
            .map(|(i, (_, pick))| {
                let parent = pick.index(i + 1);
                (parent < i).then_some(parent)
            })
            .collect();
        let specs: Vec<PageSpec> = nodes.into_iter().map(|(spec, _)| spec).collect();
        (0..specs.len())
            .filter(|&i| parents[i].is_none())
            .map(|i| nest(i, &specs, &parents))
            .collect()
    })
}

fn nest(i: usize, specs: &[PageSpec], parents: &[Option<usize>]) -> Value {
    let spec = &specs[i];
    let mut page = Map::new();
    page.insert("id".into(), json!(format!("p{}", i)));
    page.insert("enabled".into(), json!(spec.enabled));
    if let Some(name) = &spec.name {
        page.insert("name".into(), json!(name));
    }
    if let Some(loc) = &spec.loc {
        page.insert("loc".into(), json!(loc));
    }
    let children: Vec<Value> = (i + 1..specs.len())
        .filter(|&child| parents[child] == Some(i))
        .map(|child| nest(child, specs, parents))
        .collect();
    if !children.is_empty() {
        page.insert("children".into(), Value::Array(children));
    }
    Value::Object(page)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Add),
        Just(Op::AddSibling),
        Just(Op::Remove),
        Just(Op::Up),
        Just(Op::Down),
        Just(Op::Left),
        Just(Op::Right),
    ]
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::builtin().expect("builtin schemas compile"))
}

fn store_with(pages: Vec<Value>) -> DocumentStore {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = StoreConfig {
        pages,
        ..StoreConfig::default()
    };
    DocumentStore::from_config(registry(), config).expect("store builds")
}

fn preorder(pages: &[Value], out: &mut Vec<String>) {
    for page in pages {
        if let Some(id) = page["id"].as_str() {
            out.push(id.to_string());
        }
        if let Some(children) = page["children"].as_array() {
            preorder(children, out);
        }
    }
}

fn owned_ids(tree: &FlatTree) -> Vec<String> {
    tree.ids().into_iter().map(String::from).collect()
}

fn child_ids(store: &DocumentStore, id: &str) -> Vec<String> {
    store
        .children_of(id)
        .iter()
        .filter_map(|r| r.id())
        .map(String::from)
        .collect()
}

/// Ids from the top-level ancestor down to `id` itself
fn branch<'a>(tree: &'a FlatTree, id: &'a str) -> Vec<&'a str> {
    let mut chain = vec![id];
    let mut cursor = id;
    while let Some(parent) = tree.parent_of(cursor).and_then(|r| r.id()) {
        chain.push(parent);
        cursor = parent;
    }
    chain.reverse();
    chain
}

/// Apply `op` to `id`, returning whether the store changed.
fn apply(store: &mut DocumentStore, op: Op, id: &str) -> bool {
    match op {
        Op::Add => store.add(id).is_some(),
        Op::AddSibling => store.add_sibling(id).is_some(),
        Op::Remove => store.remove(id).is_some(),
        Op::Up => store.up(id),
        Op::Down => store.down(id),
        Op::Left => store.left(id).is_some(),
        Op::Right => store.right(id).is_some(),
    }
}

fn check_invariants(tree: &FlatTree) -> Result<(), TestCaseError> {
    let ids = tree.ids();
    let distinct: HashSet<&str> = ids.iter().copied().collect();
    prop_assert_eq!(distinct.len(), ids.len());
    prop_assert!(tree.has_unique_ids());
    prop_assert!(tree.is_attached());

    // Parents come first and every subtree is one contiguous run.
    let order: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    if let Some(first) = ids.first() {
        prop_assert!(tree.parent_of(first).is_none());
    }
    for pair in ids.windows(2) {
        if let Some(parent) = tree.parent_of(pair[1]).and_then(|r| r.id()) {
            prop_assert!(
                branch(tree, pair[0]).contains(&parent),
                "{} follows {} outside the subtree of {}",
                pair[1],
                pair[0],
                parent
            );
        }
    }

    for id in &ids {
        let view = tree
            .view(id)
            .ok_or_else(|| TestCaseError::fail(format!("no view for {}", id)))?;
        let record = view.record();

        if let Some(parent) = tree.parent_of(id).and_then(|r| r.id()) {
            prop_assert!(order[parent] < order[id]);
        }

        let enabled: Vec<&str> = tree
            .siblings_of(id)
            .iter()
            .filter(|r| r.enabled())
            .filter_map(|r| r.id())
            .collect();
        let index = if record.enabled() {
            enabled.iter().position(|s| s == id)
        } else {
            None
        };
        prop_assert_eq!(view.index(), index);
        match index {
            Some(i) => {
                prop_assert_eq!(
                    view.next().and_then(|v| v.id()),
                    enabled.get(i + 1).copied()
                );
                prop_assert_eq!(
                    view.prev().and_then(|v| v.id()),
                    i.checked_sub(1).map(|j| enabled[j])
                );
            }
            None => {
                prop_assert!(view.next().is_none());
                prop_assert!(view.prev().is_none());
            }
        }

        let names: Option<Vec<String>> = branch(tree, id)
            .into_iter()
            .skip(1)
            .map(|page| {
                tree.get(page)
                    .and_then(|r| r.name())
                    .filter(|name| !name.is_empty())
                    .map(|name| name.replace(' ', "_"))
            })
            .collect();
        let path = names.map(|names| names.join("/"));
        prop_assert_eq!(view.path(), path.clone());

        let source = match record.loc() {
            Some(loc) => Some(loc.replace(' ', "_")),
            None => path,
        };
        match (view.route(), source) {
            (Some(route), Some(source)) => {
                prop_assert!(route.starts_with('/') && route.ends_with('/'));
                prop_assert_eq!(route.trim_matches('/'), source.trim_matches('/'));
            }
            (None, None) => {}
            (route, source) => {
                return Err(TestCaseError::fail(format!(
                    "route {:?} for {} does not match {:?}",
                    route, id, source
                )));
            }
        }

        let live = Navigation::capture(&view);
        prop_assert_eq!(record.navigation(), Some(&live));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_sites_load_in_preorder(pages in arb_site()) {
        let store = store_with(pages.clone());
        prop_assert_eq!(store.page_status(), DocumentStatus::Valid);

        let mut expected = Vec::new();
        preorder(&pages, &mut expected);
        prop_assert_eq!(owned_ids(store.pages()), expected.clone());
        check_invariants(store.pages())?;

        let mut flat = store.pages().to_flat_value();
        prop_assert!(registry().validate(NODES, &mut flat).unwrap());
        let flat_ids: Vec<String> = flat
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|page| page["id"].as_str().map(String::from))
            .collect();
        prop_assert_eq!(flat_ids, expected);
    }

    #[test]
    fn random_edits_keep_invariants(
        pages in arb_site(),
        ops in prop::collection::vec((arb_op(), any::<Index>()), 1..40),
    ) {
        let mut store = store_with(pages);
        for (op, pick) in ops {
            let before = owned_ids(store.pages());
            let id = pick.get(&before).clone();
            let changed = apply(&mut store, op, &id);
            let after = owned_ids(store.pages());

            prop_assert_eq!(store.page_status(), DocumentStatus::Valid);
            check_invariants(store.pages())?;

            if !changed {
                prop_assert_eq!(&after, &before);
                continue;
            }
            match op {
                Op::Add | Op::AddSibling => prop_assert_eq!(after.len(), before.len() + 1),
                Op::Remove => {
                    prop_assert!(after.len() < before.len());
                    prop_assert!(!after.contains(&id));
                }
                Op::Up | Op::Down | Op::Left | Op::Right => {
                    let mut moved = after.clone();
                    let mut original = before.clone();
                    moved.sort();
                    original.sort();
                    prop_assert_eq!(moved, original);
                }
            }
        }
    }

    #[test]
    fn remove_after_add_restores_children(pages in arb_site(), pick in any::<Index>()) {
        let mut store = store_with(pages);
        let ids = owned_ids(store.pages());
        let parent = pick.get(&ids).clone();
        let before = child_ids(&store, &parent);

        let added = store.add(&parent);
        prop_assert!(added.is_some());
        let added = added.unwrap();
        let children = child_ids(&store, &parent);
        prop_assert_eq!(children.last(), Some(&added));

        prop_assert_eq!(store.remove(&added), Some(parent.clone()));
        prop_assert_eq!(child_ids(&store, &parent), before);
        check_invariants(store.pages())?;
    }
}
