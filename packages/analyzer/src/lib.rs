// ABOUTME: Requirement analysis core for UI Easy
// ABOUTME: Normalizes model responses, builds requirements, assesses, validates, analyzes design images, and exports

pub mod assessment;
pub mod builder;
pub mod design;
pub mod detail;
pub mod error;
pub mod export;
pub mod normalizer;
pub mod pipeline;
pub mod types;
pub mod validator;

pub use builder::{BuildOutcome, RequirementBuilder};
pub use design::{
    structure_design, DesignAnalysis, DesignAnalysisType, DesignAnalyzer, DesignRequest,
    DesignSection, FrontendSpecs, ImplementationGuide,
};
pub use error::{AnalyzerError, Result};
pub use export::{export_analysis, export_design, export_validation, ExportFormat, ExportResult};
pub use normalizer::{normalize, MalformedResponse, NormalizationStrategy, NormalizedResponse};
pub use pipeline::{structure_response, ModelStage, ProgressEvent, RequirementAnalyzer};
pub use types::{
    AnalysisRequest, AnalysisResult, ComponentSpec, DevelopmentPhase, EffortSize,
    InteractionSpec, LayoutSection, LayoutSpec, Platform, Requirement, RequirementPriority,
    RequirementStatus, RequirementType, StyleSpec,
};
pub use validator::{AnalysisValidator, ValidationIssue, ValidationReport};
