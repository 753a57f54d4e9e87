//! Single-row CRUD passthroughs layered over a store backend.
//!
//! [`RowClient`] covers the simple lookups and writes that don't warrant a
//! full criteria: create, get-by-id, get-by-match, update, delete. Reads of
//! soft-delete tables exclude soft-deleted rows by default, with a per-call
//! opt-out for administrative access.
//!
//! A missing row is `Ok(None)`, never an error, so callers can tell "no such
//! row" apart from "query failed".

use serde_json::{Map, Value};

use crate::{
    backend::StoreBackend,
    error::ExecutionResult,
    filter::Operator,
    plan::{CountMode, StoreQuery},
};

/// A thin CRUD client over a store backend.
#[derive(Debug, Clone)]
pub struct RowClient<B: StoreBackend> {
    backend: B,
    soft_delete_tables: Vec<String>,
}

impl<B: StoreBackend> RowClient<B> {
    /// Creates a client with the given backend and soft-delete allow-list.
    pub fn new(
        backend: B,
        soft_delete_tables: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            backend,
            soft_delete_tables: soft_delete_tables.into_iter().map(Into::into).collect(),
        }
    }

    /// Inserts one row and returns it as stored.
    pub async fn create(&self, table: &str, row: Value) -> ExecutionResult<Value> {
        self.backend.insert_row(table, row).await
    }

    /// Fetches a single row by its `id` column.
    ///
    /// Returns `Ok(None)` when no visible row has that id. Soft-deleted rows
    /// are excluded for allow-listed tables unless `include_deleted` is set.
    pub async fn get_by_id(
        &self,
        table: &str,
        id: &str,
        columns: Option<&str>,
        include_deleted: bool,
    ) -> ExecutionResult<Option<Value>> {
        let mut query = StoreQuery::new(table, columns.unwrap_or("*"), CountMode::None).filter(
            "id",
            Operator::Equal,
            Some(id.to_string()),
        );

        if self.excludes_deleted(table, include_deleted) {
            query = query.filter("deleted_at", Operator::Is, None);
        }

        let outcome = self.backend.query(&query).await?;

        Ok(outcome.rows.into_iter().next())
    }

    /// Fetches every visible row of a table.
    pub async fn get_all(&self, table: &str, columns: Option<&str>) -> ExecutionResult<Vec<Value>> {
        let mut query = StoreQuery::new(table, columns.unwrap_or("*"), CountMode::None);

        if self.excludes_deleted(table, false) {
            query = query.filter("deleted_at", Operator::Is, None);
        }

        Ok(self.backend.query(&query).await?.rows)
    }

    /// Fetches all visible rows whose `field` equals `value`, typically a
    /// foreign-key relation lookup.
    pub async fn get_by_match(
        &self,
        table: &str,
        field: &str,
        value: &str,
        columns: Option<&str>,
    ) -> ExecutionResult<Vec<Value>> {
        let mut query = StoreQuery::new(table, columns.unwrap_or("*"), CountMode::None).filter(
            field,
            Operator::Equal,
            Some(value.to_string()),
        );

        if self.excludes_deleted(table, false) {
            query = query.filter("deleted_at", Operator::Is, None);
        }

        Ok(self.backend.query(&query).await?.rows)
    }

    /// Applies `changes` to every row matching the column/value map and
    /// returns the updated rows.
    pub async fn update_by_match(
        &self,
        table: &str,
        matches: &Map<String, Value>,
        changes: Value,
    ) -> ExecutionResult<Vec<Value>> {
        self.backend
            .update_rows(table, matches, changes)
            .await
    }

    /// Deletes every row matching the column/value map, returning the count
    /// of rows removed.
    pub async fn delete_by_match(
        &self,
        table: &str,
        matches: &Map<String, Value>,
    ) -> ExecutionResult<u64> {
        self.backend.delete_rows(table, matches).await
    }

    fn excludes_deleted(&self, table: &str, include_deleted: bool) -> bool {
        !include_deleted && self.soft_delete_tables.iter().any(|t| t == table)
    }
}
