//! On-disk mirror of the DNX artifact accessor surface.
//!
//! The real DNX reader is a FlatBuffers accessor outside this crate's scope;
//! these types describe the same logical schema and are deserialized with
//! `bincode` (see DESIGN.md, Open Question 1).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F16,
    F32,
    F64,
}

impl ScalarType {
    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::F16 | ScalarType::F32 | ScalarType::F64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TensorFormat {
    Unknown,
    SsboHwc,
    SsboChw,
    SsboChwc8,
    TexRgba,
    TexRgb,
    TexRg,
    TexR,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// A scalar "source" — either a literal with a typed byte representation, or
/// a reference into the symbolic-IR DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarSource {
    Literal { dtype: ScalarType, bytes: Vec<u8> },
    Symbolic { sid: u32 },
}

impl ScalarSource {
    pub fn literal_u64(value: u64) -> Self {
        ScalarSource::Literal {
            dtype: ScalarType::U64,
            bytes: value.to_le_bytes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymOpCode {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,
}

/// Either operand of a symbolic-IR op: a symbol index, or (when the
/// corresponding LHSC/RHSC flag is set on the wire) a literal i64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    Symbol(u32),
    Literal(i64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SymOp {
    pub opcode: SymOpCode,
    pub lhs: Operand,
    pub rhs: Operand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymIr {
    pub var_count: u32,
    pub ops: Vec<SymOp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorInfo {
    pub name: Option<String>,
    pub ty: ScalarType,
    pub format: TensorFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tensor {
    pub buffer: u32,
    pub offset: ScalarSource,
    pub info: Option<TensorInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buffer {
    pub size: ScalarSource,
    pub alignment: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Initializer {
    pub tensor: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorBinding {
    pub binding: u16,
    pub access: Access,
    pub tensor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorSet {
    pub set: u16,
    pub bindings: Vec<TensorBinding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PushConstantType {
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConstantField {
    pub offset: u16,
    pub dtype: ScalarType,
    pub source: ScalarSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConstantSpec {
    pub size: u16,
    pub fields: Vec<PushConstantField>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchInfo {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispatch {
    pub info: Option<DispatchInfo>,
    pub binary_id: u32,
    pub workgroup_count_x: ScalarSource,
    pub workgroup_count_y: ScalarSource,
    pub workgroup_count_z: ScalarSource,
    pub push_constant: PushConstantSpec,
    pub descriptor_sets: Vec<DescriptorSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShaderBinarySpv {
    pub spirv: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueName {
    pub name: String,
    pub value: ScalarSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub tensors: Vec<Tensor>,
    pub buffers: Vec<Buffer>,
    pub dispatches: Vec<Dispatch>,
    pub initializers: Vec<Initializer>,
    pub shader_binaries: Vec<ShaderBinarySpv>,
    pub inputs: Vec<u32>,
    pub outputs: Vec<u32>,
    pub value_names: Vec<ValueName>,
    pub sym_ir: SymIr,
}
