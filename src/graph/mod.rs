//! Compute-graph reconstruction: nodes, connectors, buffer ROIs.

mod inference;
mod reconstruct;
mod types;
mod verify;

pub use inference::infer_formats;
pub use reconstruct::reconstruct;
pub use types::*;
pub use verify::verify;

use crate::artifact::schema::Model;
use crate::error::DenoxResult;
use crate::weights::CompressedWeights;

/// Runs reconstruction, format inference, and verification in sequence.
pub fn build(model: &Model, weights: &CompressedWeights) -> DenoxResult<ComputeGraph> {
    let mut graph = reconstruct(model, weights)?;
    infer_formats(&mut graph);
    verify(&graph)?;
    Ok(graph)
}
