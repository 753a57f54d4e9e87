//! Main rowlayer crate providing a criteria-to-query translation layer for
//! row-oriented data stores.
//!
//! This crate is the primary entry point for users of the rowlayer project.
//! It re-exports the core types from the sub-crates and bundles the in-memory
//! store binding.
//!
//! # Features
//!
//! - **Validated criteria** - Raw string-encoded filter/order/pagination input becomes an immutable, fully validated [`criteria::Criteria`]
//! - **Backend-agnostic query specs** - The converter emits a composable [`plan::StoreQuery`] that any store binding can interpret
//! - **Strategy-selected execution** - Tables are served by a direct filtered query or by precomputed aggregate procedures, behind one pagination envelope
//! - **Soft-delete visibility** - Allow-listed tables always exclude soft-deleted rows
//!
//! # Quick Start
//!
//! ```ignore
//! use rowlayer::{prelude::*, memory::MemoryStore};
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryStore::new();
//!     store
//!         .seed_table("contacts", vec![json!({"id": "c1", "status": "open", "deleted_at": null})])
//!         .await;
//!
//!     let converter = QueryConverter::new(ConverterConfig::new(
//!         ["contacts"],
//!         Vec::<String>::new(),
//!     ));
//!     let service = QueryService::new(store, converter, ServiceConfig::default());
//!
//!     let raw = RawQuery {
//!         filters: Some(r#"[{"field":"status","operator":"equal","value":"open"}]"#.into()),
//!         limit: Some("25".into()),
//!         offset: Some("0".into()),
//!         ..RawQuery::default()
//!     };
//!     let criteria = Criteria::build("contacts", "*", &raw, None).unwrap();
//!
//!     let page: Paginated<Value> = service.execute(&criteria).await.unwrap();
//!     println!("page {} of {}", page.pagination.page, page.pagination.total_pages);
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory row store for development and testing

pub mod prelude;

pub use rowlayer_core::{backend, client, convert, criteria, error, filter, page, plan, service};

/// In-memory store backend implementations.
pub mod memory {
    pub use rowlayer_memory::{MemoryStore, MemoryStoreBuilder, ProcedureHandler};
}
