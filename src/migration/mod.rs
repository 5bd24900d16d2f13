//! Questionnaire migration pipeline: read from the source tenant, remap
//! identifiers, write to the destination tenant

pub mod artifacts;
pub mod domain;
pub mod field_specs;
pub mod orchestrator;
pub mod reader;
pub mod remap;
pub mod writer;

pub use artifacts::ArtifactStore;
pub use orchestrator::{MigrationReport, MigrationStep, Orchestrator, StepError, StepObserver};
pub use writer::UploadStats;
