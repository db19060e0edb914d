//! Analyzer pipelines. Each one turns a single piece of evidence into a
//! `PipelineResult` and never returns an error to its caller.

pub mod capability;
pub mod document;
pub mod error;
pub mod image_forensics;
pub mod provenance;
pub mod scam_text;
pub mod url_checks;

pub use capability::Capability;
pub use document::DocumentAnalyzer;
pub use error::AnalyzerError;
pub use provenance::{FetchedPage, PageFetcher, ProvenanceAnalyzer, ReqwestFetcher};
pub use scam_text::TextScan;
