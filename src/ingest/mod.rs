//! Tool ingestion: paste, prompt-to-code and git import, plus the registry
//! they feed and the read-only source view

mod pathway;
mod pipeline;
mod provenance;
mod source_view;

pub use pathway::{PathwayKind, PathwaySnapshot, PathwayStatus};
pub use pipeline::ToolIngestionPipeline;
pub use provenance::{Provenance, ProvenanceLedger};
pub use source_view::ToolSource;
