//! Query building, compilation, and execution.
//!
//! - [`lookups`] - The `field__operator` filter grammar
//! - [`expressions`] - Field references, aggregates, and arithmetic
//! - [`compiler`] - Query AST, rows, and SQL compilation
//! - [`bulk`] - Multi-row insert and update statements
//! - [`queryset`] - QuerySet and Manager

pub mod bulk;
pub mod compiler;
pub mod expressions;
pub mod lookups;
pub mod queryset;

pub use compiler::{DatabaseBackendType, FromValue, OrderBy, Query, Row, SqlCompiler, WhereNode};
pub use expressions::{AggregateFunc, Expression};
pub use lookups::{Lookup, LookupFilter, LookupKind, LOOKUP_SEPARATOR};
pub use queryset::{Manager, QuerySet};
