//! Store backend abstraction for row-oriented data stores.
//!
//! This module defines the minimal capability the criteria layer needs from a
//! concrete store: interpreting a [`StoreQuery`] in one round trip, invoking
//! named remote procedures for the aggregate execution path, and a handful of
//! single-row write operations used by the CRUD passthroughs.
//!
//! Implementations are required to be thread-safe (`Send + Sync`) and support
//! concurrent access; the criteria layer itself holds no lock and shares the
//! backend handle read-only across requests.
//!
//! # Example
//!
//! ```ignore
//! use rowlayer::backend::StoreBackend;
//! use rowlayer::plan::{StoreQuery, CountMode};
//!
//! // Use a concrete backend implementation
//! let backend = MyBackendImpl::new();
//!
//! let query = StoreQuery::new("contacts", "*", CountMode::Exact).range(0, 24);
//! let outcome = backend.query(&query).await?;
//! println!("{} of {:?} rows", outcome.rows.len(), outcome.total_rows);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::{fmt::Debug, sync::Arc};

use crate::{error::ExecutionResult, plan::StoreQuery};

/// The result of one executed store query.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    /// The rows of the requested window, as raw JSON objects.
    pub rows: Vec<Value>,
    /// The exact matching row count, present when the query requested one.
    pub total_rows: Option<u64>,
}

/// Abstract interface for row-store backends.
///
/// Implementers interpret the composable [`StoreQuery`] specification against
/// their native query interface. All operations are async and return
/// [`ExecutionResult<T>`](crate::error::ExecutionResult); store-level failures
/// must preserve the underlying error detail.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Executes a store query in a single round trip.
    ///
    /// When the query's count mode requests an exact count, `total_rows` in
    /// the outcome is the authoritative total of all matching rows, not just
    /// the returned window.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Store`](crate::error::ExecutionError) with
    /// the store's own detail when the query is rejected or fails.
    async fn query(&self, query: &StoreQuery) -> ExecutionResult<QueryOutcome>;

    /// Invokes a named remote procedure with a parameter map.
    ///
    /// Used only by the aggregate execution path for views whose live count
    /// is too expensive to compute inline.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Procedure`](crate::error::ExecutionError)
    /// naming the procedure when the call fails.
    async fn call(&self, procedure: &str, params: Map<String, Value>) -> ExecutionResult<Value>;

    /// Inserts one row and returns it as stored.
    async fn insert_row(&self, table: &str, row: Value) -> ExecutionResult<Value>;

    /// Updates all rows matching the given column/value map and returns them.
    async fn update_rows(
        &self,
        table: &str,
        matches: &Map<String, Value>,
        changes: Value,
    ) -> ExecutionResult<Vec<Value>>;

    /// Deletes all rows matching the given column/value map, returning the
    /// number of rows removed.
    async fn delete_rows(&self, table: &str, matches: &Map<String, Value>)
        -> ExecutionResult<u64>;
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn query(&self, query: &StoreQuery) -> ExecutionResult<QueryOutcome> {
        (*self).query(query).await
    }

    async fn call(&self, procedure: &str, params: Map<String, Value>) -> ExecutionResult<Value> {
        (*self).call(procedure, params).await
    }

    async fn insert_row(&self, table: &str, row: Value) -> ExecutionResult<Value> {
        (*self).insert_row(table, row).await
    }

    async fn update_rows(
        &self,
        table: &str,
        matches: &Map<String, Value>,
        changes: Value,
    ) -> ExecutionResult<Vec<Value>> {
        (*self)
            .update_rows(table, matches, changes)
            .await
    }

    async fn delete_rows(
        &self,
        table: &str,
        matches: &Map<String, Value>,
    ) -> ExecutionResult<u64> {
        (*self).delete_rows(table, matches).await
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend,
{
    async fn query(&self, query: &StoreQuery) -> ExecutionResult<QueryOutcome> {
        (**self).query(query).await
    }

    async fn call(&self, procedure: &str, params: Map<String, Value>) -> ExecutionResult<Value> {
        (**self).call(procedure, params).await
    }

    async fn insert_row(&self, table: &str, row: Value) -> ExecutionResult<Value> {
        (**self).insert_row(table, row).await
    }

    async fn update_rows(
        &self,
        table: &str,
        matches: &Map<String, Value>,
        changes: Value,
    ) -> ExecutionResult<Vec<Value>> {
        (**self)
            .update_rows(table, matches, changes)
            .await
    }

    async fn delete_rows(
        &self,
        table: &str,
        matches: &Map<String, Value>,
    ) -> ExecutionResult<u64> {
        (**self).delete_rows(table, matches).await
    }
}

/// Factory trait for creating backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    /// The backend type this builder produces.
    type Backend: StoreBackend;

    /// Builds and returns a backend instance.
    async fn build(self) -> ExecutionResult<Self::Backend>;
}
