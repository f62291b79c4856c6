//! End-to-end coverage of the code-generation pipeline, exercised directly
//! against the library (the CLI binary is a thin wrapper over the same
//! `pipeline::run` this test drives by hand).

use denox_codegen::artifact::schema::*;
use denox_codegen::graph;
use denox_codegen::shaders::ShaderRegistry;
use denox_codegen::symbolic_ir::SymbolicIr;
use denox_codegen::weights::pack_weights;
use denox_codegen::{emit, symbol};

fn f16_tensor(buffer: u32, name: &str) -> Tensor {
    Tensor {
        buffer,
        offset: ScalarSource::literal_u64(0),
        info: Some(TensorInfo { name: Some(name.to_string()), ty: ScalarType::F16, format: TensorFormat::SsboHwc }),
    }
}

/// Scenario 1 — single dispatch, one F16 input, one F16 output.
fn scenario_1_model() -> Model {
    Model {
        tensors: vec![f16_tensor(0, "x"), f16_tensor(1, "y")],
        buffers: vec![
            Buffer { size: ScalarSource::literal_u64(4096), alignment: 16 },
            Buffer { size: ScalarSource::literal_u64(4096), alignment: 16 },
        ],
        dispatches: vec![Dispatch {
            info: Some(DispatchInfo { name: Some("identity".to_string()) }),
            binary_id: 0,
            workgroup_count_x: ScalarSource::literal_u64(8),
            workgroup_count_y: ScalarSource::literal_u64(8),
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
        shader_binaries: vec![ShaderBinarySpv { spirv: vec![0x0723_0203, 1, 2, 3] }],
        inputs: vec![0],
        outputs: vec![1],
        value_names: vec![],
        sym_ir: SymIr { var_count: 0, ops: vec![] },
    }
}

#[test]
fn scenario_1_end_to_end() {
    let model = scenario_1_model();
    let packed = pack_weights(&model).unwrap();
    assert!(packed.data.is_empty());

    let registry = ShaderRegistry::build(&model);
    assert_eq!(registry.binaries.len(), 1);
    assert_eq!(registry.binaries[0].name, "comp0");

    let symbols = SymbolicIr::build(&model.sym_ir, &model.value_names).unwrap();
    let compute_graph = graph::build(&model, &packed).unwrap();

    assert_eq!(compute_graph.inputs.len(), 1);
    assert_eq!(compute_graph.outputs.len(), 1);
    assert_eq!(compute_graph.inputs[0].format, denox_codegen::graph::Format::F16);
    assert_eq!(compute_graph.outputs[0].format, denox_codegen::graph::Format::F16);

    let header = emit::emit_module("vision", &compute_graph, &symbols, &registry, "weights/vision-weights.dat", 0);
    assert!(header.contains("VISION_DENOX_MODULE_H"));
    assert!(header.contains("#include \"modules/api.h\""));
    assert!(header.contains("if (x_connector == NULL)"));
    assert!(header.contains("if (y_connector == NULL)"));
    assert!(header.contains("dt_node_add(graph, module, \"vision\", dt_token(\"comp0\")"));
    assert!(!header.contains("dt_token(\"identity\")"));
}

/// Property 6 — identical artifact bytes emit byte-identical output.
#[test]
fn emission_is_idempotent() {
    let model = scenario_1_model();
    let packed = pack_weights(&model).unwrap();
    let registry = ShaderRegistry::build(&model);
    let symbols = SymbolicIr::build(&model.sym_ir, &model.value_names).unwrap();

    let graph_a = graph::build(&model, &packed).unwrap();
    let graph_b = graph::build(&model, &packed).unwrap();

    let header_a = emit::emit_module("vision", &graph_a, &symbols, &registry, "w.dat", 0);
    let header_b = emit::emit_module("vision", &graph_b, &symbols, &registry, "w.dat", 0);
    assert_eq!(header_a, header_b);
}

/// Scenario 3 — initializer packing alignment and zero-fill.
#[test]
fn scenario_3_weight_packing() {
    let model = Model {
        tensors: vec![
            Tensor { buffer: 0, offset: ScalarSource::literal_u64(0), info: None },
            Tensor { buffer: 1, offset: ScalarSource::literal_u64(0), info: None },
        ],
        buffers: vec![
            Buffer { size: ScalarSource::literal_u64(5), alignment: 1 },
            Buffer { size: ScalarSource::literal_u64(4), alignment: 256 },
        ],
        dispatches: vec![],
        initializers: vec![
            Initializer { tensor: 0, data: vec![1, 2, 3, 4, 5] },
            Initializer { tensor: 1, data: vec![9, 9, 9, 9] },
        ],
        shader_binaries: vec![],
        inputs: vec![],
        outputs: vec![],
        value_names: vec![],
        sym_ir: SymIr { var_count: 0, ops: vec![] },
    };
    let packed = pack_weights(&model).unwrap();
    assert_eq!(packed.offsets, vec![0, 256]);
    assert_eq!(packed.data.len(), 260);
    assert!(packed.data[5..256].iter().all(|&b| b == 0));
}

/// Property 7 — pruning keeps only transitively-live symbolic locals.
#[test]
fn scenario_6_unused_symbolic_op_is_pruned() {
    let sym_ir = SymIr {
        var_count: 1,
        ops: vec![
            SymOp { opcode: SymOpCode::Add, lhs: Operand::Symbol(0), rhs: Operand::Literal(1) },
            SymOp { opcode: SymOpCode::Mul, lhs: Operand::Symbol(0), rhs: Operand::Literal(2) },
        ],
    };
    let value_names = vec![ValueName { name: "n".to_string(), value: ScalarSource::Symbolic { sid: 0 } }];
    let symbols = SymbolicIr::build(&sym_ir, &value_names).unwrap();

    let mut referenced = std::collections::HashSet::new();
    referenced.insert(1u32);
    let live = symbols.emit_live_expressions(&referenced);
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].0, 1);

    let literal_read = symbol::read_unsigned_scalar_literal(ScalarType::U64, &42u64.to_le_bytes());
    assert_eq!(literal_read, 42);
}
