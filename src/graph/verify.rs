//! Invariant checks run once, after reconstruction and format inference,
//! over a finished compute graph.

use super::types::*;
use crate::error::DenoxResult;

/// Confirms no slot or buffer ROI still carries an unresolved `Auto` format
/// and that no ROI was left with a 2D extent.
pub fn verify(graph: &ComputeGraph) -> DenoxResult<()> {
    for node in &graph.nodes {
        for slot in &node.sinksources {
            debug_assert_ne!(slot.format, Format::Auto, "slot {} left unresolved after inference", slot.name);
        }
    }
    for roi in &graph.buffer_rois {
        debug_assert_ne!(roi.format, Format::Auto, "ROI left unresolved after inference");
        debug_assert!(roi.extent.is_none(), "2D extent is reserved and must not be set");
    }
    tracing::debug!(nodes = graph.nodes.len(), "compute graph verified");
    Ok(())
}
