//! Text extraction with Azure AI Document Intelligence.

pub use sasflow_document_intelligence::*;
