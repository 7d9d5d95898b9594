//! Ace accessibility reports
//!
//! Loads `report.json` as written by `ace -o <dir>` and flattens its nested
//! per-document assertions into rows of (severity, file, message, location).

mod aria;
mod flatten;
mod types;

pub use aria::{role_for_epub_type, suggest_role, MATCHING_ROLE_RULE};
pub use flatten::{flatten, retain_min_impact, sort_by_severity, ImpactSummary, ReportRow};
pub use types::{
    AceReport, DocumentAssertion, DocumentSubject, EarlResult, EarlTest, Finding, Help, Impact,
    Outcome, Pointer, PublicationSubject,
};
