//! Query expressions for `annotate()` and `aggregate()`.
//!
//! - [`core`] - Field references, literals, aggregates, and arithmetic

pub mod core;

pub use self::core::{AggregateFunc, Expression};
