//! External classification for ambiguous tariff rules.
//!
//! The pipeline only depends on the [`Classify`] trait. [`ScriptedClassifier`]
//! serves tests and offline runs; `HttpClassifier` (feature `http`) talks to a
//! remote Messages endpoint.

pub mod classifier;
pub mod fake;
#[cfg(feature = "http")]
pub mod http;
pub mod retry;

pub use classifier::{Classify, ClassifierFields, ClassifyError, parse_fields};
pub use fake::ScriptedClassifier;
#[cfg(feature = "http")]
pub use http::HttpClassifier;
pub use retry::{backoff_delay, classify_with_retry};
