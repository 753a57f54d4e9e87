//! In-memory store backend implementation for rowlayer.
//!
//! Provides [`MemoryStore`], a [`StoreBackend`](rowlayer_core::backend::StoreBackend)
//! that holds JSON rows in memory and serves registered closures as stored
//! procedures. Useful for tests, examples, and development without a live
//! database.

mod evaluator;
mod store;

pub use store::{MemoryStore, MemoryStoreBuilder, ProcedureHandler};
