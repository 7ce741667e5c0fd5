use std::fs;
use std::path::Path;
use std::sync::Arc;

use autostream_core::KnowledgeDocument;

use crate::StoreError;

/// Read-only access to the product knowledge document.
///
/// The document is parsed once at load time; `get` is idempotent and
/// side-effect-free. A read or parse failure is a fatal bootstrap error.
#[derive(Clone, Debug)]
pub struct KnowledgeStore {
    document: Arc<KnowledgeDocument>,
}

impl KnowledgeStore {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|source| StoreError::KnowledgeRead { path: path.to_path_buf(), source })?;
        let document = serde_json::from_str::<KnowledgeDocument>(&raw)
            .map_err(|source| StoreError::KnowledgeParse { path: path.to_path_buf(), source })?;

        Ok(Self { document: Arc::new(document) })
    }

    pub fn from_document(document: KnowledgeDocument) -> Self {
        Self { document: Arc::new(document) }
    }

    pub fn get(&self) -> Arc<KnowledgeDocument> {
        Arc::clone(&self.document)
    }
}
