//! Convenient re-exports of commonly used types from rowlayer.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use rowlayer::prelude::*;
//! ```

pub use rowlayer_core::{
    backend::{QueryOutcome, StoreBackend, StoreBackendBuilder},
    client::RowClient,
    convert::{ConverterConfig, QueryConverter},
    criteria::{Criteria, Direction, Order, RawQuery, ScopeFilter},
    error::{ExecutionError, ExecutionResult, ValidationError, ValidationResult},
    filter::{Filter, FilterValue, Operator},
    page::{PageMeta, Paginated, paginate},
    plan::{CountMode, QueryOp, StoreQuery},
    service::{ExecutionStrategy, QueryService, ServiceConfig},
};
