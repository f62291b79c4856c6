//! Read-only accessor over the DNX artifact.

pub mod schema;

use crate::error::{DenoxError, DenoxResult};
use schema::Model;
use std::path::Path;

impl Model {
    /// Loads and deserializes an artifact. Performs no semantic validation
    /// beyond what deserialization itself enforces; all domain invariants
    /// (named variables, literal-zero initializer offsets, supported scalar
    /// types, SSBO-only channels, ...) are checked by the consuming
    /// components, each against the exact data it needs.
    pub fn load(path: &Path) -> DenoxResult<Model> {
        let bytes = std::fs::read(path)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "loaded DNX artifact");
        bincode::deserialize(&bytes).map_err(|source| DenoxError::ArtifactDecode {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn tensor(&self, id: u32) -> &schema::Tensor {
        &self.tensors[id as usize]
    }

    pub fn buffer(&self, id: u32) -> &schema::Buffer {
        &self.buffers[id as usize]
    }
}
