//! End-to-end orchestration: read artifact → transform → write. A single-
//! threaded, batch pipeline with no suspension points and no shared mutable
//! state between stages, per the concurrency model this tool targets.

use crate::artifact::schema::Model;
use crate::cli::Args;
use crate::error::DenoxResult;
use crate::symbolic_ir::SymbolicIr;
use crate::{emit, graph, io, shaders, weights};

pub fn run(args: &Args) -> DenoxResult<()> {
    io::validate_artifact_path(&args.dnx)?;
    io::ensure_output_dir("--src-dir", &args.src_dir, args.mkdir)?;
    io::ensure_output_dir("--shader-dir", &args.shader_dir, args.mkdir)?;
    io::ensure_output_dir("--weight-dir", &args.weight_dir, args.mkdir)?;

    let model = Model::load(&args.dnx)?;

    let packed = weights::pack_weights(&model)?;
    let registry = shaders::ShaderRegistry::build(&model);
    let symbols = SymbolicIr::build(&model.sym_ir, &model.value_names)?;
    let compute_graph = graph::build(&model, &packed)?;

    let weight_file_name = format!("{}-weights.dat", args.module_name);
    let weight_path = args.weight_dir.join(&weight_file_name);
    io::atomic_write_bytes(&weight_path, &packed.data)?;
    tracing::info!(path = %weight_path.display(), "wrote weight blob");

    for binary in &registry.binaries {
        let shader_path = args.shader_dir.join(format!("{}.comp.spv", binary.name));
        let mut bytes = Vec::with_capacity(binary.spirv.len() * 4);
        for word in &binary.spirv {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        io::atomic_write_bytes(&shader_path, &bytes)?;
    }
    tracing::info!(count = registry.binaries.len(), "wrote shader binaries");

    let weight_path_in_header = match &args.bin_dir {
        Some(bin_dir) => io::relative_path(bin_dir, &weight_path).display().to_string(),
        None => weight_path.display().to_string(),
    };

    let header = emit::emit_module(&args.module_name, &compute_graph, &symbols, &registry, &weight_path_in_header, packed.data.len() as u64);
    let header_path = args.src_dir.join("denox_model.h");
    io::atomic_write_str(&header_path, &header)?;
    tracing::info!(path = %header_path.display(), "wrote denox_model.h");

    Ok(())
}
