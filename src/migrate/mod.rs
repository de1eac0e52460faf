//! Migrate module - per-item vault migration pipeline.
//!
//! - **Classify**: source type tag to [`ItemKind`]
//! - **Mapper**: source item to normalized form to destination template
//! - **Writer**: validated, dry-run aware destination writes
//! - **Pipeline**: run orchestration via [`pipeline::MigrationPipeline`]
//! - **Report**: per-item outcomes and the run summary

pub mod classify;
pub mod dump;
pub mod mapper;
pub mod pipeline;
pub mod report;
pub mod staging;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{classify, Classification, ItemKind};
pub use dump::DumpSink;
pub use mapper::{denormalize, map, translate, FieldMappingError, FieldName, NormalizedItem};
pub use pipeline::{MigrationError, MigrationPipeline, MigrationRequest};
pub use report::{
    FailureReason, ItemOutcome, ItemResult, MigrationReport, RunStats, SkipReason,
};
pub use staging::{AttachmentStaging, StagingError};
pub use writer::{DestinationWriter, WriteOutcome};
