//! scorecard-core — rubric schema, score store, score diff and report generation.
//!
//! This crate owns the data model (schema, snapshots, student roster and
//! score history) and everything needed to turn two snapshots into a report
//! prompt. Talking to an actual model is delegated to a [`traits::ChatProvider`].

pub mod catalog;
pub mod diff;
pub mod error;
pub mod report;
pub mod schema;
pub mod snapshot;
pub mod store;
pub mod template;
pub mod traits;

pub use catalog::EvaluationCatalog;
pub use error::{ProviderError, SchemaError, StoreError, TemplateError};
pub use report::{FeedbackReport, ReportGenerator};
pub use schema::{Category, CategoryItems, EvaluationSchema, LeafPath, SubjectSchema};
pub use snapshot::ScoreSnapshot;
pub use store::{ScoreStore, Student, StorePaths};
