//! Error handling foundation for the cookbook workspace.
//!
//! Only the `Result` alias lives here. Each crate owns its domain error enums
//! and uses rootcause's `Report` to carry them across layer boundaries.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
