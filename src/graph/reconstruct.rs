//! Single-pass buffer-liveness reconstruction of the compute
//! graph: owners, readers, and the dummy-edge protocol for WAW hazards.

use super::types::*;
use crate::artifact::schema::{Access, Model, PushConstantType, ScalarSource, ScalarType, TensorFormat};
use crate::error::{DenoxError, DenoxResult};
use crate::weights::CompressedWeights;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct BufferLocation {
    owning_node: u32,
    borrowing_node: u32,
    sinksource_id: usize,
    buffer_roi_id: Option<u32>,
    buffer_ssbo_offset: u64,
}

impl Default for BufferLocation {
    fn default() -> Self {
        BufferLocation {
            owning_node: NONE,
            borrowing_node: NONE,
            sinksource_id: 0,
            buffer_roi_id: None,
            buffer_ssbo_offset: 0,
        }
    }
}

/// Slot letters for real bindings: `a, b, ..., z, aa, ab, ...`. A single
/// `'a' + idx` breaks past 26 bindings; this spreadsheet-column scheme stays
/// within the naming contract for any binding count.
fn slot_letter_name(mut idx: usize) -> String {
    let mut bytes = Vec::new();
    loop {
        bytes.push(b'a' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    bytes.reverse();
    String::from_utf8(bytes).unwrap()
}

fn disambiguate(counts: &mut HashMap<String, u32>, base: String) -> String {
    let count = counts.entry(base.clone()).or_insert(0);
    let name = if *count == 0 { base } else { format!("{base}_{count}") };
    *count += 1;
    name
}

fn ssbo_layout(format: TensorFormat, tensor: u32) -> DenoxResult<InOutLayout> {
    match format {
        TensorFormat::SsboHwc => Ok(InOutLayout::Hwc),
        TensorFormat::SsboChw => Ok(InOutLayout::Chw),
        TensorFormat::SsboChwc8 => Ok(InOutLayout::Chwc8),
        TensorFormat::Unknown => Err(DenoxError::UnknownTensorFormat { tensor }),
        other => Err(DenoxError::TextureFormatUnsupported { tensor, format: other }),
    }
}

fn push_constant_type(dtype: ScalarType) -> Option<PushConstantType> {
    match dtype {
        ScalarType::I16 => Some(PushConstantType::I16),
        ScalarType::U16 => Some(PushConstantType::U16),
        ScalarType::I32 => Some(PushConstantType::I32),
        ScalarType::U32 => Some(PushConstantType::U32),
        ScalarType::I64 => Some(PushConstantType::I64),
        ScalarType::U64 => Some(PushConstantType::U64),
        ScalarType::F16 | ScalarType::F32 | ScalarType::F64 => None,
    }
}

/// Given `owning_node = A`, `borrowing_node = C`, `this_node = B`, wires
/// `A -> C -> B`: a lazily-allocated 1-byte dummy ROI, a write slot on `C`
/// (once), and a fresh `z<k>` read slot on `B` per call.
fn attach_dummy_edge(
    graph: &mut ComputeGraph,
    borrowing_node: u32,
    this_node: u32,
    z_counters: &mut HashMap<u32, u32>,
    node_binding_counts: &HashMap<u32, u32>,
) {
    if graph.dummy_roi.is_none() {
        // TODO: a 1-byte ROI may be too small for some host backends; see
        // the open question this is carried from.
        tracing::warn!("allocating 1-byte dummy ROI for WAW serialization");
        graph.buffer_rois.push(BufferRoi {
            byte_size: ScalarSource::literal_u64(1),
            extent: None,
            format: Format::Byte,
        });
        graph.dummy_roi = Some((graph.buffer_rois.len() - 1) as u32);
    }
    let dummy_roi = graph.dummy_roi.unwrap();

    if graph.nodes[borrowing_node as usize].dummy_source.is_none() {
        let slot_index = graph.nodes[borrowing_node as usize].sinksources.len();
        graph.nodes[borrowing_node as usize].dummy_source = Some(slot_index);
        graph.nodes[borrowing_node as usize].sinksources.push(SinkSource {
            name: "dummy".to_string(),
            ty: SinkSourceType::Write,
            chan: Chan::Ssbo,
            format: Format::Byte,
            buffer_roi_id: dummy_roi,
            ssbo_offset: ScalarSource::literal_u64(0),
            tensor_offset: None,
            tensor_info: None,
        });
    }

    let k = *z_counters.entry(this_node).or_insert(0);
    let z_index = graph.nodes[this_node as usize].sinksources.len();
    debug_assert_eq!(z_index as u32, node_binding_counts[&this_node] + k);
    graph.nodes[this_node as usize].sinksources.push(SinkSource {
        name: format!("z{k}"),
        ty: SinkSourceType::Read,
        chan: Chan::Ssbo,
        format: Format::Byte,
        buffer_roi_id: dummy_roi,
        ssbo_offset: ScalarSource::literal_u64(0),
        tensor_offset: None,
        tensor_info: None,
    });
    z_counters.insert(this_node, k + 1);

    let dummy_source = graph.nodes[borrowing_node as usize].dummy_source.unwrap();
    graph.connectors.push(Connector {
        src_node: borrowing_node,
        src_slot: dummy_source,
        dst_node: this_node,
        dst_slot: z_index,
    });
}

pub fn reconstruct(model: &Model, weights: &CompressedWeights) -> DenoxResult<ComputeGraph> {
    let mut graph = ComputeGraph::default();
    let mut locations = vec![BufferLocation::default(); model.buffers.len()];
    let mut name_counts: HashMap<String, u32> = HashMap::new();
    let mut node_binding_counts: HashMap<u32, u32> = HashMap::new();
    let mut z_counters: HashMap<u32, u32> = HashMap::new();

    // --- Seeding: weight upload node ---
    let weight_roi = graph.buffer_rois.len() as u32;
    graph.buffer_rois.push(BufferRoi {
        byte_size: ScalarSource::literal_u64(weights.data.len() as u64),
        extent: None,
        format: Format::Byte,
    });
    graph.nodes.push(Node {
        op: NodeOp::Upload { name: "weights".to_string(), source_slot_id: 0 },
        sinksources: vec![SinkSource {
            name: "w".to_string(),
            ty: SinkSourceType::Source,
            chan: Chan::Ssbo,
            format: Format::Byte,
            buffer_roi_id: weight_roi,
            ssbo_offset: ScalarSource::literal_u64(0),
            tensor_offset: None,
            tensor_info: None,
        }],
        dummy_source: None,
    });
    let weight_node = (graph.nodes.len() - 1) as u32;

    for initializer in &model.initializers {
        let tensor = model.tensor(initializer.tensor);
        let offset = weights.offsets[initializer.tensor as usize];
        locations[tensor.buffer as usize] = BufferLocation {
            owning_node: weight_node,
            borrowing_node: NONE,
            sinksource_id: 0,
            buffer_roi_id: Some(weight_roi),
            buffer_ssbo_offset: offset as u64,
        };
    }

    // --- Seeding: inputs ---
    for (i, &tensor_id) in model.inputs.iter().enumerate() {
        let tensor = model.tensor(tensor_id);
        let info = tensor
            .info
            .as_ref()
            .ok_or(DenoxError::UnknownTensorFormat { tensor: tensor_id })?;
        if info.ty != ScalarType::F16 {
            return Err(DenoxError::UnsupportedTensorType { tensor: tensor_id, ty: info.ty });
        }
        if !tensor.offset.is_literal_zero() {
            return Err(DenoxError::InputOffsetNotZero { tensor: tensor_id });
        }
        let layout = ssbo_layout(info.format, tensor_id)?;

        let roi_id = graph.buffer_rois.len() as u32;
        graph.buffer_rois.push(BufferRoi {
            byte_size: model.buffer(tensor.buffer).size.clone(),
            extent: None,
            format: Format::F16,
        });
        locations[tensor.buffer as usize] = BufferLocation {
            owning_node: EXTERNAL,
            borrowing_node: NONE,
            sinksource_id: i,
            buffer_roi_id: Some(roi_id),
            buffer_ssbo_offset: 0,
        };
        let name = info.name.clone().unwrap_or_else(|| format!("unnamed-input-{i}"));
        graph.inputs.push(InOutDescriptor {
            name,
            ty: SinkSourceType::Source,
            chan: Chan::Ssbo,
            format: Format::F16,
            layout,
        });
    }

    // --- Dispatch processing ---
    for (d, dispatch) in model.dispatches.iter().enumerate() {
        let mut bindings: Vec<(u16, u16, Access, u32)> = dispatch
            .descriptor_sets
            .iter()
            .flat_map(|ds| ds.bindings.iter().map(move |b| (ds.set, b.binding, b.access, b.tensor)))
            .collect();
        bindings.sort_by_key(|&(set, binding, _, _)| (set, binding));

        let raw_name = dispatch.info.as_ref().and_then(|i| i.name.clone());
        let base_name = raw_name
            .clone()
            .map(|n| sanitize_ident(&n))
            .unwrap_or_else(|| format!("unnamed_dispatch_{d}"));
        let node_name = disambiguate(&mut name_counts, base_name);

        let mut push_constants = PushConstants { size: dispatch.push_constant.size, fields: Vec::new() };
        for field in &dispatch.push_constant.fields {
            let ty = push_constant_type(field.dtype).ok_or(DenoxError::FloatingPointPushConstant {
                dispatch: d as u32,
                offset: field.offset,
            })?;
            push_constants.fields.push(PushConstantField { offset: field.offset, ty, value: field.source.clone() });
        }

        graph.nodes.push(Node {
            op: NodeOp::ComputeDispatch {
                name: node_name,
                binary_id: dispatch.binary_id,
                wg_x: dispatch.workgroup_count_x.clone(),
                wg_y: dispatch.workgroup_count_y.clone(),
                wg_z: dispatch.workgroup_count_z.clone(),
                push_constants,
                info: raw_name,
            },
            sinksources: Vec::new(),
            dummy_source: None,
        });
        let this_node = (graph.nodes.len() - 1) as u32;
        node_binding_counts.insert(this_node, bindings.len() as u32);
        let mut pending_dummy_edges: Vec<u32> = Vec::new();

        for (idx, &(_set, _binding, access, tensor_id)) in bindings.iter().enumerate() {
            let tensor = model.tensor(tensor_id);
            let buffer_id = tensor.buffer;
            let slot_name = slot_letter_name(idx);

            match access {
                Access::WriteOnly => {
                    let loc = locations[buffer_id as usize];
                    if loc.owning_node != NONE {
                        let pos = graph.nodes[this_node as usize].sinksources.len();
                        graph.nodes[this_node as usize].sinksources.push(SinkSource {
                            name: slot_name,
                            ty: SinkSourceType::Read,
                            chan: Chan::Ssbo,
                            format: Format::Auto,
                            buffer_roi_id: loc.buffer_roi_id.unwrap(),
                            ssbo_offset: ScalarSource::literal_u64(loc.buffer_ssbo_offset),
                            tensor_offset: Some(tensor.offset.clone()),
                            tensor_info: tensor.info.clone(),
                        });
                        graph.connectors.push(Connector {
                            src_node: loc.owning_node,
                            src_slot: loc.sinksource_id,
                            dst_node: this_node,
                            dst_slot: pos,
                        });
                        if loc.borrowing_node != NONE {
                            pending_dummy_edges.push(loc.borrowing_node);
                        }
                        locations[buffer_id as usize].borrowing_node = this_node;
                    } else {
                        let roi_id = graph.buffer_rois.len() as u32;
                        graph.buffer_rois.push(BufferRoi {
                            byte_size: model.buffer(buffer_id).size.clone(),
                            extent: None,
                            format: Format::Byte,
                        });
                        let pos = graph.nodes[this_node as usize].sinksources.len();
                        graph.nodes[this_node as usize].sinksources.push(SinkSource {
                            name: slot_name,
                            ty: SinkSourceType::Write,
                            chan: Chan::Ssbo,
                            format: Format::Byte,
                            buffer_roi_id: roi_id,
                            ssbo_offset: ScalarSource::literal_u64(0),
                            tensor_offset: Some(tensor.offset.clone()),
                            tensor_info: tensor.info.clone(),
                        });
                        locations[buffer_id as usize] = BufferLocation {
                            owning_node: this_node,
                            borrowing_node: NONE,
                            sinksource_id: pos,
                            buffer_roi_id: Some(roi_id),
                            buffer_ssbo_offset: 0,
                        };
                    }
                }
                Access::ReadOnly => {
                    let loc = locations[buffer_id as usize];
                    debug_assert!(loc.owning_node != NONE, "read access before any write to buffer {buffer_id}");
                    let pos = graph.nodes[this_node as usize].sinksources.len();
                    graph.nodes[this_node as usize].sinksources.push(SinkSource {
                        name: slot_name,
                        ty: SinkSourceType::Read,
                        chan: Chan::Ssbo,
                        format: Format::Auto,
                        buffer_roi_id: loc.buffer_roi_id.unwrap(),
                        ssbo_offset: ScalarSource::literal_u64(loc.buffer_ssbo_offset),
                        tensor_offset: Some(tensor.offset.clone()),
                        tensor_info: tensor.info.clone(),
                    });
                    graph.connectors.push(Connector {
                        src_node: loc.owning_node,
                        src_slot: loc.sinksource_id,
                        dst_node: this_node,
                        dst_slot: pos,
                    });
                    if loc.borrowing_node != NONE {
                        pending_dummy_edges.push(loc.borrowing_node);
                    }
                }
                Access::ReadWrite => {
                    return Err(DenoxError::UnsupportedDescriptorAccess { dispatch: d as u32, access: Access::ReadWrite });
                }
            }
        }

        // Dummy edges are materialized only after every real binding of
        // this dispatch has claimed its sinksource slot, so the z<k> index
        // invariant in `attach_dummy_edge` holds regardless of which
        // binding triggered it.
        for borrowing_node in pending_dummy_edges {
            attach_dummy_edge(&mut graph, borrowing_node, this_node, &mut z_counters, &node_binding_counts);
        }
    }

    // --- Output processing ---
    for (i, &tensor_id) in model.outputs.iter().enumerate() {
        let tensor = model.tensor(tensor_id);
        let buffer_id = tensor.buffer;
        let loc = locations[buffer_id as usize];
        if loc.owning_node == NONE {
            return Err(DenoxError::NoOutputOwner { tensor: tensor_id });
        }
        if loc.borrowing_node != NONE {
            return Err(DenoxError::OutputBufferBorrowed { tensor: tensor_id, node: loc.borrowing_node });
        }
        let info = tensor
            .info
            .as_ref()
            .ok_or(DenoxError::UnknownTensorFormat { tensor: tensor_id })?;
        if info.ty != ScalarType::F16 {
            return Err(DenoxError::UnsupportedTensorType { tensor: tensor_id, ty: info.ty });
        }
        let layout = ssbo_layout(info.format, tensor_id)?;
        let name = info.name.clone().unwrap_or_else(|| format!("unnamed-output-{i}"));
        graph.outputs.push(InOutDescriptor {
            name,
            ty: SinkSourceType::Write,
            chan: Chan::Ssbo,
            format: Format::F16,
            layout,
        });
        graph.connectors.push(Connector {
            src_node: loc.owning_node,
            src_slot: loc.sinksource_id,
            dst_node: EXTERNAL,
            dst_slot: i,
        });
        graph.nodes[loc.owning_node as usize].sinksources[loc.sinksource_id].format = Format::F16;
        let roi_id = graph.nodes[loc.owning_node as usize].sinksources[loc.sinksource_id].buffer_roi_id;
        graph.buffer_rois[roi_id as usize].format = Format::F16;
    }

    tracing::info!(
        nodes = graph.nodes.len(),
        connectors = graph.connectors.len(),
        rois = graph.buffer_rois.len(),
        "reconstructed compute graph"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::schema::*;

    fn tensor_f16(buffer: u32, name: &str) -> Tensor {
        Tensor {
            buffer,
            offset: ScalarSource::literal_u64(0),
            info: Some(TensorInfo { name: Some(name.to_string()), ty: ScalarType::F16, format: TensorFormat::SsboHwc }),
        }
    }

    fn single_dispatch_model() -> Model {
        Model {
            tensors: vec![tensor_f16(0, "x"), tensor_f16(1, "y")],
            buffers: vec![
                Buffer { size: ScalarSource::literal_u64(1024), alignment: 16 },
                Buffer { size: ScalarSource::literal_u64(1024), alignment: 16 },
            ],
            dispatches: vec![Dispatch {
                info: Some(DispatchInfo { name: Some("op".to_string()) }),
                binary_id: 0,
                workgroup_count_x: ScalarSource::literal_u64(1),
                workgroup_count_y: ScalarSource::literal_u64(1),
                workgroup_count_z: ScalarSource::literal_u64(1),
                push_constant: PushConstantSpec { size: 0, fields: vec![] },
                descriptor_sets: vec![DescriptorSet {
                    set: 0,
                    bindings: vec![
                        TensorBinding { binding: 0, access: Access::ReadOnly, tensor: 0 },
                        TensorBinding { binding: 1, access: Access::WriteOnly, tensor: 1 },
                    ],
                }],
            }],
            initializers: vec![],
            shader_binaries: vec![],
            inputs: vec![0],
            outputs: vec![1],
            value_names: vec![],
            sym_ir: SymIr { var_count: 0, ops: vec![] },
        }
    }

    #[test]
    fn scenario_1_single_dispatch() {
        let model = single_dispatch_model();
        let weights = CompressedWeights { offsets: vec![-1, -1], data: vec![] };
        let graph = reconstruct(&model, &weights).unwrap();

        assert_eq!(graph.inputs.len(), 1);
        assert_eq!(graph.outputs.len(), 1);
        // node 0 is the weight upload, node 1 is the dispatch
        let dispatch_node = &graph.nodes[1];
        assert_eq!(dispatch_node.slot_index("a").map(|i| dispatch_node.sinksources[i].ty), Some(SinkSourceType::Read));
        assert_eq!(dispatch_node.slot_index("b").map(|i| dispatch_node.sinksources[i].ty), Some(SinkSourceType::Write));

        let external_in = graph.connectors.iter().find(|c| c.src_node == EXTERNAL).unwrap();
        assert_eq!(external_in.dst_node, 1);
        let external_out = graph.connectors.iter().find(|c| c.dst_node == EXTERNAL).unwrap();
        assert_eq!(external_out.src_node, 1);
    }

    #[test]
    fn scenario_4_name_disambiguation() {
        let mut model = single_dispatch_model();
        model.dispatches.push(model.dispatches[0].clone());
        model.dispatches[0].info = Some(DispatchInfo { name: Some("my-op+x".to_string()) });
        model.dispatches[1].info = Some(DispatchInfo { name: Some("my-op+x".to_string()) });
        let weights = CompressedWeights { offsets: vec![-1, -1], data: vec![] };
        let graph = reconstruct(&model, &weights).unwrap();

        let names: Vec<&str> = graph.nodes[1..]
            .iter()
            .map(|n| n.op.name())
            .collect();
        assert_eq!(names, vec!["my_op_x", "my_op_x_1"]);
    }

    #[test]
    fn scenario_2_dummy_edge_chain() {
        // Two dispatches both write buffer 1, then a third reads it.
        let mut model = single_dispatch_model();
        model.outputs = vec![];
        let w2 = Dispatch {
            info: Some(DispatchInfo { name: Some("w2".to_string()) }),
            binary_id: 0,
            workgroup_count_x: ScalarSource::literal_u64(1),
            workgroup_count_y: ScalarSource::literal_u64(1),
            workgroup_count_z: ScalarSource::literal_u64(1),
            push_constant: PushConstantSpec { size: 0, fields: vec![] },
            descriptor_sets: vec![DescriptorSet {
                set: 0,
                bindings: vec![TensorBinding { binding: 0, access: Access::WriteOnly, tensor: 1 }],
            }],
        };
        let reader = Dispatch {
            info: Some(DispatchInfo { name: Some("r".to_string()) }),
            binary_id: 0,
            workgroup_count_x: ScalarSource::literal_u64(1),
            workgroup_count_y: ScalarSource::literal_u64(1),
            workgroup_count_z: ScalarSource::literal_u64(1),
            push_constant: PushConstantSpec { size: 0, fields: vec![] },
            descriptor_sets: vec![DescriptorSet {
                set: 0,
                bindings: vec![TensorBinding { binding: 0, access: Access::ReadOnly, tensor: 1 }],
            }],
        };
        model.dispatches.push(w2);
        model.dispatches.push(reader);
        let weights = CompressedWeights { offsets: vec![-1, -1], data: vec![] };
        let graph = reconstruct(&model, &weights).unwrap();

        assert!(graph.dummy_roi.is_some());
        let roi = &graph.buffer_rois[graph.dummy_roi.unwrap() as usize];
        assert_eq!(roi.byte_size.as_unsigned_literal(), Some(1));
        // node 2 (w2) should have a dummy write slot, node 3 (reader) a z0 read slot.
        assert!(graph.nodes[2].dummy_source.is_some());
        assert!(graph.nodes[3].slot_index("z0").is_some());
    }

    #[test]
    fn scenario_2_dummy_edge_not_last_binding() {
        // The reader dispatch has two real bindings; the one that triggers
        // the dummy edge (a read of the already-borrowed buffer) is bound
        // first, not last, so the z-slot push must still land after both
        // real bindings have claimed their sinksource slots.
        let mut model = single_dispatch_model();
        model.tensors.push(tensor_f16(2, "scratch"));
        model.buffers.push(Buffer { size: ScalarSource::literal_u64(1024), alignment: 16 });
        model.outputs = vec![];
        let w2 = Dispatch {
            info: Some(DispatchInfo { name: Some("w2".to_string()) }),
            binary_id: 0,
            workgroup_count_x: ScalarSource::literal_u64(1),
            workgroup_count_y: ScalarSource::literal_u64(1),
            workgroup_count_z: ScalarSource::literal_u64(1),
            push_constant: PushConstantSpec { size: 0, fields: vec![] },
            descriptor_sets: vec![DescriptorSet {
                set: 0,
                bindings: vec![TensorBinding { binding: 0, access: Access::WriteOnly, tensor: 1 }],
            }],
        };
        let reader = Dispatch {
            info: Some(DispatchInfo { name: Some("r".to_string()) }),
            binary_id: 0,
            workgroup_count_x: ScalarSource::literal_u64(1),
            workgroup_count_y: ScalarSource::literal_u64(1),
            workgroup_count_z: ScalarSource::literal_u64(1),
            push_constant: PushConstantSpec { size: 0, fields: vec![] },
            descriptor_sets: vec![DescriptorSet {
                set: 0,
                bindings: vec![
                    TensorBinding { binding: 0, access: Access::ReadOnly, tensor: 1 },
                    TensorBinding { binding: 1, access: Access::WriteOnly, tensor: 2 },
                ],
            }],
        };
        model.dispatches.push(w2);
        model.dispatches.push(reader);
        let weights = CompressedWeights { offsets: vec![-1, -1, -1], data: vec![] };
        let graph = reconstruct(&model, &weights).unwrap();

        assert!(graph.nodes[2].dummy_source.is_some());
        let reader_node = &graph.nodes[3];
        assert!(reader_node.slot_index("a").is_some());
        assert!(reader_node.slot_index("b").is_some());
        let z_slot = reader_node.slot_index("z0").expect("deferred dummy read slot");
        assert_eq!(z_slot, reader_node.sinksources.len() - 1);
    }
}
