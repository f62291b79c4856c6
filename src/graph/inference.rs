//! Format inference by dataflow propagation over connectors, in
//! construction (topological) order.

use super::types::*;

pub fn infer_formats(graph: &mut ComputeGraph) {
    for i in 0..graph.connectors.len() {
        let connector = graph.connectors[i];
        if connector.src_node == EXTERNAL {
            let format = graph.inputs[connector.src_slot].format;
            set_dst_format(graph, connector, format);
        } else if connector.dst_node == EXTERNAL {
            // no-op: the destination slot does not exist on this side.
        } else {
            let format = graph.nodes[connector.src_node as usize].sinksources[connector.src_slot].format;
            set_dst_format(graph, connector, format);
        }
    }
}

fn set_dst_format(graph: &mut ComputeGraph, connector: Connector, format: Format) {
    graph.nodes[connector.dst_node as usize].sinksources[connector.dst_slot].format = format;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::schema::ScalarSource;

    fn auto_slot(name: &str) -> SinkSource {
        SinkSource {
            name: name.to_string(),
            ty: SinkSourceType::Read,
            chan: Chan::Ssbo,
            format: Format::Auto,
            buffer_roi_id: 0,
            ssbo_offset: ScalarSource::literal_u64(0),
            tensor_offset: None,
            tensor_info: None,
        }
    }

    #[test]
    fn propagates_input_format_across_internal_edge() {
        let mut graph = ComputeGraph::default();
        graph.inputs.push(InOutDescriptor {
            name: "x".into(),
            ty: SinkSourceType::Source,
            chan: Chan::Ssbo,
            format: Format::F16,
            layout: InOutLayout::Hwc,
        });
        graph.nodes.push(Node {
            op: NodeOp::Upload { name: "dummy".into(), source_slot_id: 0 },
            sinksources: vec![auto_slot("a")],
            dummy_source: None,
        });
        graph.connectors.push(Connector { src_node: EXTERNAL, src_slot: 0, dst_node: 0, dst_slot: 0 });

        infer_formats(&mut graph);

        assert_eq!(graph.nodes[0].sinksources[0].format, Format::F16);
    }

    #[test]
    fn propagates_across_node_to_node_edge() {
        let mut graph = ComputeGraph::default();
        graph.nodes.push(Node {
            op: NodeOp::Upload { name: "src".into(), source_slot_id: 0 },
            sinksources: vec![SinkSource { format: Format::Byte, ..auto_slot("w") }],
            dummy_source: None,
        });
        graph.nodes.push(Node {
            op: NodeOp::Upload { name: "dst".into(), source_slot_id: 0 },
            sinksources: vec![auto_slot("a")],
            dummy_source: None,
        });
        graph.connectors.push(Connector { src_node: 0, src_slot: 0, dst_node: 1, dst_slot: 0 });

        infer_formats(&mut graph);

        assert_eq!(graph.nodes[1].sinksources[0].format, Format::Byte);
    }
}
