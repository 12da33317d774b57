//! # dbup-rs-core
//!
//! Foundation crate for dbup-rs: the [`DbupError`] taxonomy shared by the
//! backends, the migration engine, and the CLI, plus `tracing`-based
//! logging setup.

pub mod error;
pub mod logging;

pub use error::{DbupError, DbupResult};
