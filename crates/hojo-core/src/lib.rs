//! # hojo-core
//!
//! Error types, configuration, and logging shared by every hojo crate.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`config`] - Process-wide key/value configuration store
//! - [`settings`] - Typed settings pushed into the configuration store
//! - [`settings_loader`] - TOML/JSON/environment settings loading
//! - [`logging`] - Tracing-based logging integration

pub mod config;
pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

pub use config::Config;
pub use error::{ConversionError, HojoError, HojoResult, ValidationError};
pub use settings::Settings;
