use thiserror::Error;

/// Every fatal condition the generator can hit. Library code always returns
/// these; only the CLI binary decides how to present one to a human.
#[derive(Error, Debug)]
pub enum DenoxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode DNX artifact at {path}: {source}")]
    ArtifactDecode {
        path: String,
        #[source]
        source: bincode::Error,
    },

    #[error("DNX artifact does not exist or is not a regular file: {0}")]
    ArtifactMissing(String),

    #[error("{name} does not exist and -p/--mkdir was not given: {path}")]
    OutputDirMissing { name: &'static str, path: String },

    #[error("{name} exists but is not a directory: {path}")]
    OutputDirNotADirectory { name: &'static str, path: String },

    #[error("failed to create directory {path}: {source}")]
    CreateDirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("atomic write to {path} failed: {reason}")]
    AtomicWriteFailed { path: String, reason: String },

    #[error("symbolic variable {sid} has no name in the artifact's value-name table")]
    UnnamedSymbolicVariable { sid: u32 },

    #[error("initializer for tensor {tensor} has a symbolic offset; only literal zero offsets are supported")]
    InitializerSymbolicOffset { tensor: u32 },

    #[error("initializer for tensor {tensor} has nonzero offset {offset}; partial initializers are not supported")]
    InitializerNonzeroOffset { tensor: u32, offset: u64 },

    #[error("buffer alignment {0} is not a power of two")]
    AlignmentNotPowerOfTwo(u64),

    #[error("unsupported tensor scalar type for tensor {tensor}: {ty:?}")]
    UnsupportedTensorType { tensor: u32, ty: crate::artifact::schema::ScalarType },

    #[error("input/output tensor {tensor} uses texture format {format:?}; texture-backed tensors are not supported")]
    TextureFormatUnsupported { tensor: u32, format: crate::artifact::schema::TensorFormat },

    #[error("input/output tensor {tensor} has unknown tensor format")]
    UnknownTensorFormat { tensor: u32 },

    #[error("input tensor {tensor} has a non-literal or nonzero offset; inputs must start at literal offset 0")]
    InputOffsetNotZero { tensor: u32 },

    #[error("dispatch {dispatch} binding uses an unsupported access pattern: {access:?}")]
    UnsupportedDescriptorAccess { dispatch: u32, access: crate::artifact::schema::Access },

    #[error("push constant field at offset {offset} in dispatch {dispatch} has a floating-point type")]
    FloatingPointPushConstant { dispatch: u32, offset: u16 },

    #[error("model produces no output for tensor {tensor}: its backing buffer has no owning node")]
    NoOutputOwner { tensor: u32 },

    #[error("output tensor {tensor}'s buffer is borrowed by node {node}; cross-module dummy connectors for outputs are not supported")]
    OutputBufferBorrowed { tensor: u32, node: u32 },

    #[error("indentation popped below zero")]
    IndentationUnderflow,
}

pub type DenoxResult<T> = Result<T, DenoxError>;
