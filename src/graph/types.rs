//! Compute-graph data model — nodes, connectors, buffer ROIs, I/O descriptors.
//!
//! Nodes, buffer locations, and connectors are indices into flat arrays plus
//! explicit sentinel node ids rather than a pointer graph: no nullable
//! references anywhere here.

use crate::artifact::schema::{PushConstantType, ScalarSource, TensorInfo};

/// Sentinel node id: no node (a `BufferLocation` slot that has not yet been
/// written).
pub const NONE: u32 = u32::MAX;
/// Sentinel node id: the host side of an input/output edge.
pub const EXTERNAL: u32 = u32::MAX - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkSourceType {
    Read,
    Write,
    Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chan {
    Ssbo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    F16,
    Byte,
    Auto,
}

impl Format {
    /// Bytes per element, used to compute an emitted ROI's width in
    /// elements. Only meaningful for non-`Byte` formats.
    pub fn element_size(self) -> u64 {
        match self {
            Format::F16 => 2,
            Format::Byte => 1,
            Format::Auto => unreachable!("Auto format must be resolved before emission"),
        }
    }

    pub fn as_c_str(self) -> &'static str {
        match self {
            Format::F16 => "f16",
            Format::Byte => "u8",
            Format::Auto => "*",
        }
    }
}

impl SinkSourceType {
    pub fn as_c_str(self) -> &'static str {
        match self {
            SinkSourceType::Read => "read",
            SinkSourceType::Write => "write",
            SinkSourceType::Source => "source",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SinkSource {
    pub name: String,
    pub ty: SinkSourceType,
    pub chan: Chan,
    pub format: Format,
    pub buffer_roi_id: u32,
    pub ssbo_offset: ScalarSource,
    pub tensor_offset: Option<ScalarSource>,
    pub tensor_info: Option<TensorInfo>,
}

#[derive(Debug, Clone)]
pub struct PushConstantField {
    pub offset: u16,
    pub ty: PushConstantType,
    pub value: ScalarSource,
}

#[derive(Debug, Clone, Default)]
pub struct PushConstants {
    pub size: u16,
    pub fields: Vec<PushConstantField>,
}

#[derive(Debug, Clone)]
pub enum NodeOp {
    ComputeDispatch {
        name: String,
        binary_id: u32,
        wg_x: ScalarSource,
        wg_y: ScalarSource,
        wg_z: ScalarSource,
        push_constants: PushConstants,
        info: Option<String>,
    },
    Upload {
        name: String,
        source_slot_id: usize,
    },
}

impl NodeOp {
    pub fn name(&self) -> &str {
        match self {
            NodeOp::ComputeDispatch { name, .. } => name,
            NodeOp::Upload { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub op: NodeOp,
    pub sinksources: Vec<SinkSource>,
    /// Index into `sinksources` of the lazily-materialised dummy write slot
    /// used to serialize a WAW chain through this node as a reader.
    pub dummy_source: Option<usize>,
}

impl Node {
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.sinksources.iter().position(|s| s.name == name)
    }
}

/// Directed edge `(src_node, src_slot) -> (dst_node, dst_slot)`. `src_node`/
/// `dst_node` may be the [`EXTERNAL`] sentinel; slot indices are meaningless
/// on the external side and ignored there.
#[derive(Debug, Clone, Copy)]
pub struct Connector {
    pub src_node: u32,
    pub src_slot: usize,
    pub dst_node: u32,
    pub dst_slot: usize,
}

#[derive(Debug, Clone)]
pub struct BufferRoi {
    pub byte_size: ScalarSource,
    /// Reserved for future use; must not be set by any current producer.
    pub extent: Option<(u32, u32)>,
    pub format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InOutLayout {
    Hwc,
    Chw,
    Chwc8,
}

#[derive(Debug, Clone)]
pub struct InOutDescriptor {
    pub name: String,
    pub ty: SinkSourceType,
    pub chan: Chan,
    pub format: Format,
    pub layout: InOutLayout,
}

/// Replaces `-` and `+` with `_` so an artifact-provided name is safe to
/// emit as a C identifier.
pub fn sanitize_ident(raw: &str) -> String {
    raw.replace('-', "_").replace('+', "_")
}

#[derive(Debug, Clone, Default)]
pub struct ComputeGraph {
    pub nodes: Vec<Node>,
    pub connectors: Vec<Connector>,
    pub buffer_rois: Vec<BufferRoi>,
    pub dummy_roi: Option<u32>,
    pub inputs: Vec<InOutDescriptor>,
    pub outputs: Vec<InOutDescriptor>,
}
