//! Deterministic source emission.

mod create_nodes;
mod read_source;
mod writer;

pub use create_nodes::emit_create_nodes;
pub use read_source::emit_read_source;
pub use writer::{IncludeKind, SourceWriter};

use crate::graph::ComputeGraph;
use crate::shaders::ShaderRegistry;
use crate::symbolic_ir::SymbolicIr;

/// Renders the full `denox_model.h` unit: header guard, includes, then
/// `denox_read_source` followed by `denox_create_nodes`.
pub fn emit_module(
    module_name: &str,
    graph: &ComputeGraph,
    symbols: &SymbolicIr,
    registry: &ShaderRegistry,
    weight_path: &str,
    weight_size: u64,
) -> String {
    let mut w = SourceWriter::new();
    w.set_header_guard(format!("{}_DENOX_MODULE_H", module_name.to_uppercase()));
    w.add_include(IncludeKind::Local, "modules/api.h");
    w.add_include(IncludeKind::System, "stdint.h");
    w.add_include(IncludeKind::System, "stdio.h");
    w.add_include(IncludeKind::System, "string.h");
    w.add_include(IncludeKind::System, "stddef.h");

    read_source::emit_read_source(&mut w, graph, module_name, weight_path, weight_size);
    w.append("");
    create_nodes::emit_create_nodes(&mut w, graph, symbols, module_name, registry);

    w.finish()
}
