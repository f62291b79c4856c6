//! `denox_create_nodes` emission: live symbolic locals,
//! per-buffer ROI declarations, per-node `dt_node_add` calls, and
//! per-connector wiring (including the external guarded-copy pattern).

use super::writer::SourceWriter;
use crate::artifact::schema::{PushConstantType, ScalarSource};
use crate::graph::{sanitize_ident, Chan, ComputeGraph, Connector, Format, Node, NodeOp, PushConstants, SinkSource, EXTERNAL};
use crate::shaders::ShaderRegistry;
use crate::symbolic_ir::SymbolicIr;
use std::collections::HashSet;

fn is_literal(source: &ScalarSource) -> bool {
    matches!(source, ScalarSource::Literal { .. })
}

fn c_type_name(ty: PushConstantType) -> &'static str {
    match ty {
        PushConstantType::U16 => "uint16_t",
        PushConstantType::I16 => "int16_t",
        PushConstantType::U32 => "uint32_t",
        PushConstantType::I32 => "int32_t",
        PushConstantType::U64 => "uint64_t",
        PushConstantType::I64 => "int64_t",
    }
}

/// Emits the namespaced push-constant declaration(s) for one dispatch and
/// returns the `(pointer expression, size expression)` to pass to
/// `dt_node_add`.
fn emit_push_constants(
    w: &mut SourceWriter,
    symbols: &SymbolicIr,
    referenced: &mut HashSet<u32>,
    ns: &str,
    pc: &PushConstants,
) -> (String, String) {
    if pc.fields.is_empty() {
        return ("NULL".to_string(), "0".to_string());
    }

    let mut sorted = pc.fields.clone();
    sorted.sort_by_key(|f| f.offset);

    let contiguous_u32 = sorted.iter().all(|f| f.ty == PushConstantType::U32)
        && sorted.iter().enumerate().all(|(i, f)| f.offset as usize == i * 4);

    if contiguous_u32 {
        let exprs: Vec<String> = sorted
            .iter()
            .map(|f| {
                let expr = symbols.access_symbol(&f.value, referenced);
                if is_literal(&f.value) {
                    expr
                } else {
                    format!("(uint32_t)({expr})")
                }
            })
            .collect();
        w.append(&format!(
            "const uint32_t {ns}_pc[{}] = {{ {} }};",
            sorted.len(),
            exprs.join(", ")
        ));
    } else {
        w.append(&format!("const uint8_t {ns}_pc[{}];", pc.size));
        w.append("{");
        w.push_indentation(1);
        for (k, field) in sorted.iter().enumerate() {
            let expr = symbols.access_symbol(&field.value, referenced);
            let ty_name = c_type_name(field.ty);
            let cast = if field.ty == PushConstantType::I64 { String::new() } else { format!("({ty_name})") };
            w.append(&format!("const {ty_name} pc{k} = {cast}{expr};"));
            w.append(&format!("memcpy({ns}_pc + {}, &pc{k}, sizeof({ty_name}));", field.offset));
        }
        w.pop_indentation(1).unwrap();
        w.append("}");
    }

    (format!("{ns}_pc"), format!("sizeof({ns}_pc)"))
}

fn render_slots(slots: &[SinkSource]) -> String {
    slots
        .iter()
        .map(|s| {
            let Chan::Ssbo = s.chan;
            format!("\"{}\", \"{}\", \"ssbo\", \"{}\", &roi{}", s.name, s.ty.as_c_str(), s.format.as_c_str(), s.buffer_roi_id)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn emit_external_edge(w: &mut SourceWriter, ident: &str, copy_args: &str, named_args: &str) {
    w.append(&format!("if ({ident}_connector == NULL)"));
    w.append("{");
    w.push_indentation(1);
    w.append(&format!("dt_connector_copy(graph, {copy_args});"));
    w.pop_indentation(1).unwrap();
    w.append("}");
    w.append("else");
    w.append("{");
    w.push_indentation(1);
    w.append(&format!("dt_node_connect_named(graph, {named_args});"));
    w.pop_indentation(1).unwrap();
    w.append("}");
}

fn emit_connector(w: &mut SourceWriter, graph: &ComputeGraph, c: Connector) {
    match (c.src_node, c.dst_node) {
        (EXTERNAL, dst) => {
            let io = &graph.inputs[c.src_slot];
            let ident = sanitize_ident(&io.name);
            let dst_slot = &graph.nodes[dst as usize].sinksources[c.dst_slot].name;
            emit_external_edge(
                w,
                &ident,
                &format!("{ident}_id, node{dst}, \"{dst_slot}\""),
                &format!("{ident}_id, {ident}_connector, node{dst}, \"{dst_slot}\""),
            );
        }
        (src, EXTERNAL) => {
            let io = &graph.outputs[c.dst_slot];
            let ident = sanitize_ident(&io.name);
            let src_slot = &graph.nodes[src as usize].sinksources[c.src_slot].name;
            emit_external_edge(
                w,
                &ident,
                &format!("node{src}, \"{src_slot}\", {ident}_id"),
                &format!("node{src}, \"{src_slot}\", {ident}_id, {ident}_connector"),
            );
        }
        (src, dst) => {
            let src_slot = &graph.nodes[src as usize].sinksources[c.src_slot].name;
            let dst_slot = &graph.nodes[dst as usize].sinksources[c.dst_slot].name;
            w.append(&format!("dt_node_connect_named(graph, node{src}, \"{src_slot}\", node{dst}, \"{dst_slot}\");"));
        }
    }
}

fn visit_all_scalar_sources(graph: &ComputeGraph, symbols: &SymbolicIr, referenced: &mut HashSet<u32>) {
    for roi in &graph.buffer_rois {
        symbols.access_symbol(&roi.byte_size, referenced);
    }
    for node in &graph.nodes {
        for slot in &node.sinksources {
            symbols.access_symbol(&slot.ssbo_offset, referenced);
        }
        if let NodeOp::ComputeDispatch { wg_x, wg_y, wg_z, push_constants, .. } = &node.op {
            symbols.access_symbol(wg_x, referenced);
            symbols.access_symbol(wg_y, referenced);
            symbols.access_symbol(wg_z, referenced);
            for field in &push_constants.fields {
                symbols.access_symbol(&field.value, referenced);
            }
        }
    }
}

fn signature_params(graph: &ComputeGraph, symbols: &SymbolicIr) -> Vec<String> {
    let mut params = vec!["dt_graph_t *graph".to_string(), "dt_module_t *module".to_string()];
    let has_vars = symbols.var_count() > 0;
    let has_io = !graph.inputs.is_empty() || !graph.outputs.is_empty();
    if !has_vars && !has_io {
        return params;
    }
    for (_, name) in symbols.variable_names() {
        params.push(format!("uint64_t {name}"));
    }
    for io in graph.inputs.iter().chain(graph.outputs.iter()) {
        let ident = sanitize_ident(&io.name);
        params.push(format!("int {ident}_id"));
        params.push(format!("const char *{ident}_connector"));
    }
    params
}

pub fn emit_create_nodes(w: &mut SourceWriter, graph: &ComputeGraph, symbols: &SymbolicIr, module_name: &str, registry: &ShaderRegistry) {
    let mut referenced: HashSet<u32> = HashSet::new();
    visit_all_scalar_sources(graph, symbols, &mut referenced);
    let live = symbols.emit_live_expressions(&referenced);

    w.append(&format!("static void denox_create_nodes({})", signature_params(graph, symbols).join(", ")));
    w.append("{");
    w.push_indentation(1);

    for (sid, expr) in &live {
        w.append(&format!("int64_t s{sid} = {expr};"));
    }

    for (i, roi) in graph.buffer_rois.iter().enumerate() {
        let size_expr = symbols.access_symbol(&roi.byte_size, &mut referenced);
        let width_expr = if roi.format == Format::Byte {
            size_expr
        } else {
            format!("({size_expr}) / {}", roi.format.element_size())
        };
        w.append(&format!("dt_roi_t roi{i} = {{ .wd = {width_expr}, .ht = 1 }};"));
    }

    for (i, node) in graph.nodes.iter().enumerate() {
        emit_node(w, symbols, &mut referenced, i, node, module_name, registry);
    }

    for connector in &graph.connectors {
        emit_connector(w, graph, *connector);
    }

    w.pop_indentation(1).unwrap();
    w.append("}");
}

fn emit_node(
    w: &mut SourceWriter,
    symbols: &SymbolicIr,
    referenced: &mut HashSet<u32>,
    i: usize,
    node: &Node,
    module_name: &str,
    registry: &ShaderRegistry,
) {
    let slots = render_slots(&node.sinksources);
    match &node.op {
        NodeOp::Upload { name, .. } => {
            w.append(&format!(
                "int node{i} = dt_node_add(graph, module, \"{module_name}\", dt_token(\"{name}\"), 0, 0, 0, NULL, 0, {}, {slots});",
                node.sinksources.len()
            ));
        }
        NodeOp::ComputeDispatch { name, binary_id, wg_x, wg_y, wg_z, push_constants, .. } => {
            let (pc_ptr, pc_size) = emit_push_constants(w, symbols, referenced, name, push_constants);
            let wgx = symbols.access_symbol(wg_x, referenced);
            let wgy = symbols.access_symbol(wg_y, referenced);
            let wgz = symbols.access_symbol(wg_z, referenced);
            let kernel = &registry.binaries[*binary_id as usize].name;
            w.append(&format!(
                "int node{i} = dt_node_add(graph, module, \"{module_name}\", dt_token(\"{kernel}\"), (uint32_t)({wgx}) * DT_LOCAL_SIZE_X, (uint32_t)({wgy}) * DT_LOCAL_SIZE_Y, (uint32_t)({wgz}), {pc_ptr}, {pc_size}, {}, {slots});",
                node.sinksources.len()
            ));
        }
    }
}
