//! Convert Make.com scenario exports into importable n8n workflow documents.
//!
//! The deterministic path is fully local: load and validate the export, run
//! the type resolver over every flow item, and emit a structurally valid n8n
//! document. A [`research::ResearchOracle`] can feed the resolver with
//! mappings mined from free text, and a [`backend::ConversionBackend`] can
//! take over the conversion entirely; both are trait boundaries the caller
//! supplies.
#![forbid(unsafe_code)]

pub mod backend;
pub mod convert;
pub mod error;
pub mod extract;
pub mod loader;
pub mod model;
pub mod registry;
pub mod research;
pub mod resolve;
pub mod state;
pub mod workflow;

pub use convert::{ConversionOutcome, Converter};
pub use error::{ConvertError, Result};

/// Convert a Make.com export with the deterministic path and the default
/// mapping table.
pub async fn convert_export(json: &str) -> ConversionOutcome {
    Converter::new().convert_str(json).await
}
