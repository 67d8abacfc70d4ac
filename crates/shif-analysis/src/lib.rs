//! Analysis stages over a loaded tariff document.

pub mod detect;
pub mod extract;
pub mod gaps;
pub mod provenance;
pub mod refine;
pub mod run;
pub mod similarity;

pub use detect::{ServiceGroup, detect_contradictions, group_services};
pub use extract::{Extractor, extract_document, parse_tariff};
pub use gaps::analyze_gaps;
pub use provenance::enforce_provenance;
pub use refine::{RefineStats, refine_rules};
pub use run::{Analysis, analyze};
