//! Query execution: strategy selection, serving defaults, and the uniform
//! paginated envelope.
//!
//! [`QueryService`] orchestrates the converter and a store backend to answer
//! one criteria with one [`Paginated`] result. Most tables take the direct
//! path: convert, restrict to the requested row range, execute once, and read
//! rows plus the exact count from the same round trip. Tables registered with
//! an RPC strategy are heavy aggregate views whose live count is too
//! expensive to compute inline; they are served by two independent stored
//! procedures (page fetch and total count) issued concurrently.
//!
//! Both paths produce the identical envelope shape, so callers cannot tell
//! which strategy served a table except by latency.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    backend::StoreBackend,
    convert::QueryConverter,
    criteria::Criteria,
    error::{ExecutionError, ExecutionResult},
    page::{Paginated, paginate},
};

/// How queries against a given table are executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// One filtered query with an inline exact count. The default.
    Direct,
    /// Two independent stored procedures: one returning the page of rows,
    /// one returning the total matching count.
    Rpc {
        /// Procedure returning the page of rows for
        /// `(p_filters, p_order_by, p_order_direction, p_limit, p_offset)`.
        rows_procedure: String,
        /// Procedure returning the total matching count for `(p_filters)`.
        count_procedure: String,
    },
}

/// Injected execution-service configuration.
///
/// The strategy table maps table/view names to their execution strategy;
/// unlisted tables take the direct path. New heavy-view exceptions are
/// configuration, not code branches.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Page size substituted when the caller requests no (or a zero) limit.
    /// Must be positive.
    pub default_limit: u64,
    /// Per-table execution strategy overrides.
    pub strategies: HashMap<String, ExecutionStrategy>,
}

impl ServiceConfig {
    /// Registers an RPC strategy for a heavy aggregate view.
    pub fn with_rpc_view(
        mut self,
        table: impl Into<String>,
        rows_procedure: impl Into<String>,
        count_procedure: impl Into<String>,
    ) -> Self {
        self.strategies.insert(
            table.into(),
            ExecutionStrategy::Rpc {
                rows_procedure: rows_procedure.into(),
                count_procedure: count_procedure.into(),
            },
        );
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            strategies: HashMap::new(),
        }
    }
}

/// Executes criteria against a store backend.
#[derive(Debug)]
pub struct QueryService<B: StoreBackend> {
    backend: B,
    converter: QueryConverter,
    config: ServiceConfig,
}

impl<B: StoreBackend> QueryService<B> {
    /// Creates a service from a backend, a converter, and its configuration.
    pub fn new(backend: B, converter: QueryConverter, config: ServiceConfig) -> Self {
        Self {
            backend,
            converter,
            config,
        }
    }

    /// Executes one criteria and returns a page of rows decoded into `T`.
    ///
    /// Limit/offset defaulting happens here, not in the criteria model: an
    /// absent limit is valid input, but the service must still pick a window.
    /// An absent or zero limit becomes the configured default page size; an
    /// absent offset becomes zero.
    ///
    /// # Errors
    ///
    /// Any store-level failure aborts the whole execution; on the RPC path a
    /// failure of either procedure discards the other's result. Partial
    /// results are never returned.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        criteria: &Criteria,
    ) -> ExecutionResult<Paginated<T>> {
        let (limit, offset) = self.page_window(criteria);

        tracing::debug!(table = %criteria.table, limit, offset, "executing criteria query");

        match self.config.strategies.get(&criteria.table) {
            Some(ExecutionStrategy::Rpc {
                rows_procedure,
                count_procedure,
            }) => {
                self.execute_rpc(criteria, rows_procedure, count_procedure, limit, offset)
                    .await
            }
            _ => self.execute_direct(criteria, limit, offset).await,
        }
    }

    async fn execute_direct<T: DeserializeOwned>(
        &self,
        criteria: &Criteria,
        limit: u64,
        offset: u64,
    ) -> ExecutionResult<Paginated<T>> {
        let query = self
            .converter
            .convert(criteria)
            .range(offset, offset + limit - 1);

        let outcome = self.backend.query(&query).await?;

        Ok(Paginated {
            data: decode_rows(outcome.rows)?,
            pagination: paginate(outcome.total_rows, limit, offset),
        })
    }

    async fn execute_rpc<T: DeserializeOwned>(
        &self,
        criteria: &Criteria,
        rows_procedure: &str,
        count_procedure: &str,
        limit: u64,
        offset: u64,
    ) -> ExecutionResult<Paginated<T>> {
        tracing::debug!(rows_procedure, count_procedure, "executing aggregate procedures");

        let filters = serde_json::to_value(criteria.filters.as_deref().unwrap_or(&[]))?;

        let mut params = Map::new();
        params.insert("p_filters".to_string(), filters.clone());
        params.insert(
            "p_order_by".to_string(),
            criteria
                .order_by
                .as_ref()
                .map(|order| Value::String(order.field.clone()))
                .unwrap_or(Value::Null),
        );
        params.insert(
            "p_order_direction".to_string(),
            Value::String(
                criteria
                    .order_by
                    .as_ref()
                    .map(|order| order.direction.token())
                    .unwrap_or("ASC")
                    .to_string(),
            ),
        );
        params.insert("p_limit".to_string(), Value::from(limit));
        params.insert("p_offset".to_string(), Value::from(offset));

        let mut count_params = Map::new();
        count_params.insert("p_filters".to_string(), filters);

        // The two calls have no ordering dependency; run them concurrently.
        // Either failure aborts the whole execution.
        let (rows_result, count_result) = futures::try_join!(
            self.backend.call(rows_procedure, params),
            self.backend.call(count_procedure, count_params),
        )?;

        let rows = match rows_result {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => {
                return Err(ExecutionError::Decode(format!(
                    "procedure '{rows_procedure}' returned {other} instead of a row array"
                )));
            }
        };

        let total_rows = match count_result {
            Value::Null => None,
            value => value.as_u64().or_else(|| {
                value
                    .as_f64()
                    .filter(|count| *count >= 0.0)
                    .map(|count| count as u64)
            }),
        };

        Ok(Paginated {
            data: decode_rows(rows)?,
            pagination: paginate(total_rows, limit, offset),
        })
    }

    // Serving-policy defaults, distinct from input validation.
    fn page_window(&self, criteria: &Criteria) -> (u64, u64) {
        let limit = match criteria.limit {
            Some(limit) if limit > 0 => limit,
            _ => self.config.default_limit.max(1),
        };

        (limit, criteria.offset.unwrap_or(0))
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> ExecutionResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ExecutionError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::QueryOutcome,
        convert::{ConverterConfig, QueryConverter},
        criteria::RawQuery,
        plan::{QueryOp, StoreQuery},
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Scripted backend recording every query and procedure call.
    #[derive(Debug, Default)]
    struct ScriptedBackend {
        outcome: Mutex<QueryOutcome>,
        responses: Mutex<HashMap<String, Result<Value, String>>>,
        queries: Mutex<Vec<StoreQuery>>,
        calls: Mutex<Vec<(String, Map<String, Value>)>>,
    }

    impl ScriptedBackend {
        fn with_outcome(rows: Vec<Value>, total_rows: Option<u64>) -> Self {
            let backend = Self::default();
            *backend.outcome.lock().unwrap() = QueryOutcome { rows, total_rows };
            backend
        }

        fn respond(&self, procedure: &str, response: Result<Value, &str>) {
            self.responses.lock().unwrap().insert(
                procedure.to_string(),
                response.map_err(str::to_string),
            );
        }

        fn recorded_queries(&self) -> Vec<StoreQuery> {
            self.queries.lock().unwrap().clone()
        }

        fn recorded_calls(&self) -> Vec<(String, Map<String, Value>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoreBackend for ScriptedBackend {
        async fn query(&self, query: &StoreQuery) -> ExecutionResult<QueryOutcome> {
            self.queries.lock().unwrap().push(query.clone());
            let outcome = self.outcome.lock().unwrap();
            Ok(QueryOutcome {
                rows: outcome.rows.clone(),
                total_rows: outcome.total_rows,
            })
        }

        async fn call(
            &self,
            procedure: &str,
            params: Map<String, Value>,
        ) -> ExecutionResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((procedure.to_string(), params));

            match self.responses.lock().unwrap().get(procedure) {
                Some(Ok(value)) => Ok(value.clone()),
                Some(Err(detail)) => Err(ExecutionError::Procedure(
                    procedure.to_string(),
                    detail.clone(),
                )),
                None => Err(ExecutionError::Procedure(
                    procedure.to_string(),
                    "no scripted response".to_string(),
                )),
            }
        }

        async fn insert_row(&self, _table: &str, row: Value) -> ExecutionResult<Value> {
            Ok(row)
        }

        async fn update_rows(
            &self,
            _table: &str,
            _matches: &Map<String, Value>,
            _changes: Value,
        ) -> ExecutionResult<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn delete_rows(
            &self,
            _table: &str,
            _matches: &Map<String, Value>,
        ) -> ExecutionResult<u64> {
            Ok(0)
        }
    }

    fn service(backend: ScriptedBackend, config: ServiceConfig) -> QueryService<ScriptedBackend> {
        QueryService::new(
            backend,
            QueryConverter::new(ConverterConfig::default()),
            config,
        )
    }

    fn criteria_with_page(table: &str, limit: &str, offset: &str) -> Criteria {
        let raw = RawQuery {
            limit: Some(limit.to_string()),
            offset: Some(offset.to_string()),
            ..RawQuery::default()
        };
        Criteria::build(table, "*", &raw, None).unwrap()
    }

    #[tokio::test]
    async fn direct_path_applies_range_and_shapes_envelope() {
        let backend =
            ScriptedBackend::with_outcome(vec![json!({"id": "r1"}), json!({"id": "r2"})], Some(95));
        let service = service(backend, ServiceConfig::default());
        let criteria = criteria_with_page("contacts", "10", "20");

        let result: Paginated<Value> = service.execute(&criteria).await.unwrap();

        assert_eq!(result.data.len(), 2);
        assert_eq!(result.pagination.page, 3);
        assert_eq!(result.pagination.total_rows, 95);
        assert_eq!(result.pagination.total_pages, 10);

        let queries = service.backend.recorded_queries();
        assert_eq!(queries.len(), 1);
        assert!(queries[0]
            .ops
            .iter()
            .any(|op| matches!(op, QueryOp::Range { start: 20, end: 29 })));
    }

    #[tokio::test]
    async fn absent_limit_gets_the_default_window() {
        let backend = ScriptedBackend::with_outcome(Vec::new(), Some(0));
        let service = service(backend, ServiceConfig::default());
        let criteria = Criteria::build("contacts", "*", &RawQuery::default(), None).unwrap();

        let _: Paginated<Value> = service.execute(&criteria).await.unwrap();

        let queries = service.backend.recorded_queries();
        assert!(queries[0]
            .ops
            .iter()
            .any(|op| matches!(op, QueryOp::Range { start: 0, end: 49 })));
    }

    #[tokio::test]
    async fn zero_limit_also_gets_the_default_window() {
        let backend = ScriptedBackend::with_outcome(Vec::new(), Some(0));
        let service = service(backend, ServiceConfig::default());
        let criteria = criteria_with_page("contacts", "0", "0");

        let _: Paginated<Value> = service.execute(&criteria).await.unwrap();

        let queries = service.backend.recorded_queries();
        assert!(queries[0]
            .ops
            .iter()
            .any(|op| matches!(op, QueryOp::Range { start: 0, end: 49 })));
    }

    #[tokio::test]
    async fn rpc_path_issues_exactly_two_calls_and_combines_them() {
        let backend = ScriptedBackend::default();
        backend.respond("fetch_call_history", Ok(json!([{"id": "c1"}])));
        backend.respond("count_call_history", Ok(json!(7)));

        let config = ServiceConfig::default().with_rpc_view(
            "view_call_history",
            "fetch_call_history",
            "count_call_history",
        );
        let service = service(backend, config);
        let criteria = criteria_with_page("view_call_history", "5", "0");

        let result: Paginated<Value> = service.execute(&criteria).await.unwrap();

        assert_eq!(result.data.len(), 1);
        assert_eq!(result.pagination.total_rows, 7);
        assert_eq!(result.pagination.total_pages, 2);

        let calls = service.backend.recorded_calls();
        assert_eq!(calls.len(), 2);
        assert!(service.backend.recorded_queries().is_empty());

        let (_, rows_params) = calls
            .iter()
            .find(|(name, _)| name == "fetch_call_history")
            .unwrap();
        assert_eq!(rows_params["p_limit"], json!(5));
        assert_eq!(rows_params["p_offset"], json!(0));
        assert_eq!(rows_params["p_order_direction"], json!("ASC"));
        assert_eq!(rows_params["p_filters"], json!([]));

        let (_, count_params) = calls
            .iter()
            .find(|(name, _)| name == "count_call_history")
            .unwrap();
        assert_eq!(count_params.len(), 1);
        assert_eq!(count_params["p_filters"], json!([]));
    }

    #[tokio::test]
    async fn rpc_path_passes_filters_and_order() {
        let backend = ScriptedBackend::default();
        backend.respond("fetch_call_history", Ok(json!([])));
        backend.respond("count_call_history", Ok(json!(0)));

        let config = ServiceConfig::default().with_rpc_view(
            "view_call_history",
            "fetch_call_history",
            "count_call_history",
        );
        let service = service(backend, config);

        let raw = RawQuery {
            filters: Some(r#"[{"field":"status","operator":"equal","value":"done"}]"#.to_string()),
            order_by: Some("started_at".to_string()),
            order_direction: Some("descending".to_string()),
            limit: Some("5".to_string()),
            offset: Some("10".to_string()),
        };
        let criteria = Criteria::build("view_call_history", "*", &raw, None).unwrap();

        let _: Paginated<Value> = service.execute(&criteria).await.unwrap();

        let calls = service.backend.recorded_calls();
        let (_, rows_params) = calls
            .iter()
            .find(|(name, _)| name == "fetch_call_history")
            .unwrap();
        assert_eq!(
            rows_params["p_filters"],
            json!([{"field": "status", "operator": "eq", "value": "done"}])
        );
        assert_eq!(rows_params["p_order_by"], json!("started_at"));
        assert_eq!(rows_params["p_order_direction"], json!("DESC"));
    }

    #[tokio::test]
    async fn rpc_failure_of_either_call_fails_the_whole_execution() {
        let backend = ScriptedBackend::default();
        backend.respond("fetch_call_history", Ok(json!([{"id": "c1"}])));
        backend.respond("count_call_history", Err("count blew up"));

        let config = ServiceConfig::default().with_rpc_view(
            "view_call_history",
            "fetch_call_history",
            "count_call_history",
        );
        let service = service(backend, config);
        let criteria = criteria_with_page("view_call_history", "5", "0");

        let err = service
            .execute::<Value>(&criteria)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Procedure(ref name, _) if name == "count_call_history"));
    }

    #[tokio::test]
    async fn rpc_null_count_is_an_empty_total() {
        let backend = ScriptedBackend::default();
        backend.respond("fetch_call_history", Ok(json!(null)));
        backend.respond("count_call_history", Ok(json!(null)));

        let config = ServiceConfig::default().with_rpc_view(
            "view_call_history",
            "fetch_call_history",
            "count_call_history",
        );
        let service = service(backend, config);
        let criteria = criteria_with_page("view_call_history", "5", "0");

        let result: Paginated<Value> = service.execute(&criteria).await.unwrap();

        assert!(result.data.is_empty());
        assert_eq!(result.pagination.page, 1);
        assert_eq!(result.pagination.total_pages, 0);
    }

    #[tokio::test]
    async fn unregistered_table_takes_the_direct_path() {
        let backend = ScriptedBackend::with_outcome(Vec::new(), Some(0));
        let config = ServiceConfig::default().with_rpc_view(
            "view_call_history",
            "fetch_call_history",
            "count_call_history",
        );
        let service = service(backend, config);
        let criteria = criteria_with_page("contacts", "10", "0");

        let _: Paginated<Value> = service.execute(&criteria).await.unwrap();

        assert_eq!(service.backend.recorded_queries().len(), 1);
        assert!(service.backend.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn undecodable_rows_fail_the_execution() {
        #[derive(Debug, serde::Deserialize)]
        struct Contact {
            #[allow(dead_code)]
            id: String,
        }

        let backend = ScriptedBackend::with_outcome(vec![json!({"identifier": 1})], Some(1));
        let service = service(backend, ServiceConfig::default());
        let criteria = criteria_with_page("contacts", "10", "0");

        let err = service
            .execute::<Contact>(&criteria)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Decode(_)));
    }
}
