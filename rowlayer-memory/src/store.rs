//! In-memory store backend for development and testing.
//!
//! Rows are JSON objects held in per-table vectors behind an async-aware
//! read-write lock. Stored procedures are registered as closures, which lets
//! tests exercise the aggregate execution path without a live database.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use mea::rwlock::RwLock;
use serde_json::{Map, Value};
use uuid::Uuid;

use rowlayer_core::{
    backend::{QueryOutcome, StoreBackend, StoreBackendBuilder},
    error::{ExecutionError, ExecutionResult},
    plan::{CountMode, QueryOp, StoreQuery},
};

use crate::evaluator::{compare_fields, row_matches};

/// A registered stored-procedure handler.
pub type ProcedureHandler =
    Arc<dyn Fn(&Map<String, Value>) -> ExecutionResult<Value> + Send + Sync>;

type TableMap = HashMap<String, Vec<Value>>;

/// Thread-safe in-memory row store.
///
/// `MemoryStore` is cloneable and uses `Arc`-wrapped internal state, so
/// multiple clones share the same underlying data across async tasks.
/// Queries scan the whole table; this is intended for tests and small
/// development datasets, not production traffic.
///
/// # Example
///
/// ```ignore
/// use rowlayer_memory::MemoryStore;
/// use rowlayer_core::plan::{StoreQuery, CountMode};
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// store.seed_table("contacts", vec![json!({"id": "c1", "name": "Alice"})]).await;
///
/// let query = StoreQuery::new("contacts", "*", CountMode::Exact);
/// let outcome = store.query(&query).await?;
/// assert_eq!(outcome.total_rows, Some(1));
/// # Ok::<(), rowlayer_core::error::ExecutionError>(())
/// ```
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<TableMap>>,
    procedures: Arc<RwLock<HashMap<String, ProcedureHandler>>>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing a `MemoryStore`.
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::default()
    }

    /// Replaces the contents of a table, creating it if needed.
    pub async fn seed_table(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .write()
            .await
            .insert(table.to_string(), rows);
    }

    /// Registers a stored-procedure handler under the given name.
    pub async fn register_procedure<F>(&self, name: &str, handler: F)
    where
        F: Fn(&Map<String, Value>) -> ExecutionResult<Value> + Send + Sync + 'static,
    {
        self.procedures
            .write()
            .await
            .insert(name.to_string(), Arc::new(handler));
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn query(&self, query: &StoreQuery) -> ExecutionResult<QueryOutcome> {
        let tables = self.tables.read().await;
        let rows = tables
            .get(&query.table)
            .cloned()
            .unwrap_or_default();

        let mut filtered: Vec<Value> = rows
            .into_iter()
            .filter(|row| {
                query
                    .predicates()
                    .all(|(field, operator, literal)| row_matches(row, field, operator, literal))
            })
            .collect();

        // The exact count covers all matching rows, not just the window.
        let total_rows = match query.count {
            CountMode::Exact => Some(filtered.len() as u64),
            CountMode::None => None,
        };

        for op in &query.ops {
            match op {
                QueryOp::Order { field, ascending } => {
                    filtered.sort_by(|a, b| {
                        let left = a.get(field).unwrap_or(&Value::Null);
                        let right = b.get(field).unwrap_or(&Value::Null);

                        if *ascending {
                            compare_fields(left, right)
                        } else {
                            compare_fields(right, left)
                        }
                    });
                }
                QueryOp::Range { start, end } => {
                    let window = end - start + 1;
                    filtered = filtered
                        .into_iter()
                        .skip(*start as usize)
                        .take(window as usize)
                        .collect();
                }
                QueryOp::Predicate { .. } => {}
            }
        }

        Ok(QueryOutcome {
            rows: filtered,
            total_rows,
        })
    }

    async fn call(&self, procedure: &str, params: Map<String, Value>) -> ExecutionResult<Value> {
        let handler = self
            .procedures
            .read()
            .await
            .get(procedure)
            .cloned();

        match handler {
            Some(handler) => handler(&params),
            None => Err(ExecutionError::Procedure(
                procedure.to_string(),
                "unknown procedure".to_string(),
            )),
        }
    }

    async fn insert_row(&self, table: &str, row: Value) -> ExecutionResult<Value> {
        let mut row = match row {
            Value::Object(map) => map,
            other => {
                return Err(ExecutionError::Store(format!(
                    "cannot insert non-object row: {other}"
                )));
            }
        };

        row.entry("id".to_string())
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));

        let stored = Value::Object(row);

        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());

        Ok(stored)
    }

    async fn update_rows(
        &self,
        table: &str,
        matches: &Map<String, Value>,
        changes: Value,
    ) -> ExecutionResult<Vec<Value>> {
        let changes = changes
            .as_object()
            .cloned()
            .ok_or_else(|| ExecutionError::Store("update changes must be an object".to_string()))?;

        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        let mut updated = Vec::new();

        for row in rows.iter_mut() {
            if !matches_row(row, matches) {
                continue;
            }

            if let Some(object) = row.as_object_mut() {
                for (key, value) in &changes {
                    object.insert(key.clone(), value.clone());
                }
            }

            updated.push(row.clone());
        }

        Ok(updated)
    }

    async fn delete_rows(
        &self,
        table: &str,
        matches: &Map<String, Value>,
    ) -> ExecutionResult<u64> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(table.to_string()).or_default();

        let before = rows.len();
        rows.retain(|row| !matches_row(row, matches));

        Ok((before - rows.len()) as u64)
    }
}

fn matches_row(row: &Value, matches: &Map<String, Value>) -> bool {
    matches
        .iter()
        .all(|(field, value)| row.get(field) == Some(value))
}

/// Builder for constructing [`MemoryStore`] instances.
#[derive(Default)]
pub struct MemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for MemoryStoreBuilder {
    type Backend = MemoryStore;

    /// Builds and returns a new [`MemoryStore`] instance.
    async fn build(self) -> ExecutionResult<Self::Backend> {
        Ok(MemoryStore::new())
    }
}
