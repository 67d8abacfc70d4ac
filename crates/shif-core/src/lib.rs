pub mod config;
pub mod document;
pub mod error;
pub mod finding;
pub mod normalize;
pub mod rule;
pub mod schema;
pub mod summary;
pub mod warning;

pub use config::{AnalyzerConfig, DiseaseEntry, ExpectedService};
pub use document::{PageText, SourceDocument};
pub use error::{ConfigError, ProvenanceError};
pub use finding::{Contradiction, ContradictionKind, Gap, GapSubtype};
pub use normalize::normalize_service_name;
pub use rule::{Confidence, Coverage, ExtractedRule, Frequency, PaymentMechanism, RuleSource, Tariff};
pub use schema::report;
pub use summary::RunSummary;
pub use warning::{Warning, WarningKind, WarningLog};
