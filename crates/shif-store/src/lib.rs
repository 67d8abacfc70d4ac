//! Storage layer: document loading (PDF via lopdf, plain text) and report
//! tables (CSV via arrow, Parquet behind the `parquet` feature).

mod batch;
mod error;
pub mod load;
pub mod report;

pub use batch::{contradictions_batch, gaps_batch, rules_batch};
pub use error::StoreError;
pub use load::{document_from_pdf_bytes, document_from_text, load_document};
pub use report::{ReportFormat, ReportWriter};

#[cfg(feature = "parquet")]
pub use report::read_parquet;
