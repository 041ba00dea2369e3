//! The toolrank ingestion pipeline.
//!
//! Leaf components are pure or depend only on a capability trait:
//! [`normalizer`], [`impact`], [`quality::QualityGate`] and
//! [`analyzer::ContentAnalyzer`]. The store-backed pieces
//! ([`dedup::DiscoveryDeduplicator`], [`ledger::RankingChangeLedger`],
//! [`articles::ArticleService`]) take an `Arc<dyn Store>`, and
//! [`orchestrator::IngestionOrchestrator`] wires them into a run.

pub mod analyzer;
pub mod articles;
pub mod dedup;
pub mod error;
pub mod impact;
pub mod ledger;
pub mod normalizer;
pub mod orchestrator;
pub mod quality;

pub use analyzer::{AnalysisContext, ContentAnalyzer};
pub use articles::{
    ArticleMetadata, ArticlePreview, ArticleService, DryRunResult, IngestInput, IngestKind,
    IngestOutcome,
};
pub use dedup::{DedupOutcome, DiscoveryDeduplicator};
pub use error::IngestError;
pub use impact::{
    calculate_changes, identify_new_entities, summarize, ChangeSummary, NewEntities,
    PredictedChange,
};
pub use ledger::{ArticleImpact, ChangeRecord, RankingChangeLedger, VersionRequest};
pub use orchestrator::{IngestionOrchestrator, IngestionResult, RunOptions};
pub use quality::{ArticleToAssess, AssessmentOutcome, QualityAssessment, QualityGate};
