//! `denox_read_source` emission: a cascade of guarded blocks,
//! one per Upload node, that open the weight file, validate its size, and
//! read it into the mapped destination.
//!
//! Emits a proper `else if` chain, so only the matching Upload node's guard
//! body ever runs per call.

use super::writer::SourceWriter;
use crate::graph::{ComputeGraph, NodeOp};

pub fn emit_read_source(w: &mut SourceWriter, graph: &ComputeGraph, module_name: &str, weight_path: &str, weight_size: u64) {
    let uploads: Vec<&str> = graph
        .nodes
        .iter()
        .filter_map(|n| match &n.op {
            NodeOp::Upload { name, .. } => Some(name.as_str()),
            NodeOp::ComputeDispatch { .. } => None,
        })
        .collect();

    w.append("static int denox_read_source(dt_module_t *module, void *mapped, dt_read_source_params_t *params)");
    w.append("{");
    w.push_indentation(1);

    for (idx, name) in uploads.iter().enumerate() {
        let keyword = if idx == 0 { "if" } else { "else if" };
        w.append(&format!("{keyword} (params->node->kernel == dt_token(\"{name}\"))"));
        w.append("{");
        w.push_indentation(1);
        w.append(&format!("FILE *f = fopen(\"{weight_path}\", \"rb\");"));
        w.append("if (!f)");
        w.append("{");
        w.push_indentation(1);
        w.append(&format!(
            "snprintf(module->graph->gui_msg_buf, sizeof(module->graph->gui_msg_buf), \"{module_name}: failed to open weight file %s\", \"{weight_path}\");"
        ));
        w.append("return 1;");
        w.pop_indentation(1).unwrap();
        w.append("}");
        w.append("fseek(f, 0, SEEK_END);");
        w.append("long sz = ftell(f);");
        w.append("fseek(f, 0, SEEK_SET);");
        w.append(&format!("if ((size_t)sz != (size_t){weight_size})"));
        w.append("{");
        w.push_indentation(1);
        w.append(&format!(
            "snprintf(module->graph->gui_msg_buf, sizeof(module->graph->gui_msg_buf), \"{module_name}: weight file size mismatch: expected {weight_size}, got %ld\", sz);"
        ));
        w.append("fclose(f);");
        w.append("return 1;");
        w.pop_indentation(1).unwrap();
        w.append("}");
        w.append("fread(mapped, 1, sz, f);");
        w.append("fclose(f);");
        w.pop_indentation(1).unwrap();
        w.append("}");
    }

    w.append("return 0;");
    w.pop_indentation(1).unwrap();
    w.append("}");
}
