//! A thin criteria-to-query translation layer for row-oriented data stores.
//!
//! This crate is the core of the rowlayer project and provides:
//!
//! - **Filter and criteria model** ([`filter`], [`criteria`]) - Validated, immutable query descriptions built from raw transport input
//! - **Query specification** ([`plan`]) - A composable, backend-agnostic list of predicate/order/range operations
//! - **Query converter** ([`convert`]) - Criteria-to-specification translation with soft-delete visibility rules
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different store bindings
//! - **Execution service** ([`service`]) - Strategy-selected query execution producing one pagination envelope
//! - **Row client** ([`client`]) - Single-row CRUD passthroughs over a backend
//! - **Pagination** ([`page`]) - Page metadata and the uniform paginated result envelope
//! - **Error handling** ([`error`]) - Validation and execution error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use rowlayer_core::{
//!     criteria::{Criteria, RawQuery},
//!     convert::{ConverterConfig, QueryConverter},
//!     service::{QueryService, ServiceConfig},
//! };
//!
//! let converter = QueryConverter::new(ConverterConfig::new(
//!     ["contacts", "campaigns"],
//!     ["view_call_history"],
//! ));
//! let service = QueryService::new(backend, converter, ServiceConfig::default());
//!
//! let raw = RawQuery {
//!     filters: Some(r#"[{"field":"status","operator":"equal","value":"open"}]"#.into()),
//!     limit: Some("25".into()),
//!     offset: Some("0".into()),
//!     ..RawQuery::default()
//! };
//! let criteria = Criteria::build("contacts", "*", &raw, None)?;
//! let page: rowlayer_core::page::Paginated<serde_json::Value> =
//!     service.execute(&criteria).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as rowlayer_core;

pub mod backend;
pub mod client;
pub mod convert;
pub mod criteria;
pub mod error;
pub mod filter;
pub mod page;
pub mod plan;
pub mod service;
