use crate::types::Document;

/// Common interface for tools that turn raw text into annotated documents.
#[async_trait::async_trait]
pub trait Annotator: Send + Sync + std::fmt::Debug {
    /// Human-readable name for this annotator.
    fn name(&self) -> &'static str;

    /// Annotate one document. `name` becomes the document identifier.
    async fn annotate(&self, name: &str, text: &str) -> crate::error::Result<Document>;
}
