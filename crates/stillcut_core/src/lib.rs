//! stillcut core - static-span detection and excision.
//!
//! This crate contains all pipeline logic with zero UI dependencies.
//! The `stillcut` CLI is a thin front end over [`orchestrator::Session`].
//!
//! Data flows strictly forward through the pipeline:
//!
//! ```text
//! engine diagnostic text
//!     -> decision::parse     (DecisionRecord)
//!     -> decision::reduce    (Segment)
//!     -> decision::select    (DropInterval + total)
//!     -> filter::synthesize  (selection expression)
//!     -> engine second pass  (output bytes -> artifact)
//! ```

pub mod artifact;
pub mod config;
pub mod decision;
pub mod engine;
pub mod filter;
pub mod logging;
pub mod orchestrator;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
