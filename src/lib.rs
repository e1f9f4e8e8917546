//! Sitedata - shared data layer for a static site builder
//!
//! A page hierarchy held as a flat, order-preserving sequence with derived
//! navigation, and a store of schema-validated documents that repair
//! themselves after every change.

pub mod fetch;
pub mod fonts;
pub mod schema;
pub mod store;
pub mod tree;

pub use schema::{SchemaError, SchemaRegistry};
pub use store::{DocumentKind, DocumentStatus, DocumentStore, StoreConfig};
pub use tree::{FlatTree, Navigation, PageData, PageRecord, PageView};
