//! Deterministic, alignment-respecting weight packing.

use crate::artifact::schema::Model;
use crate::error::{DenoxError, DenoxResult};

/// Rounds `value` up to the next multiple of `align`. `align` must be a
/// power of two.
pub fn align_up(value: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (value + align - 1) & !(align - 1)
}

#[derive(Debug, Clone)]
pub struct CompressedWeights {
    /// `offsets[tensor_id] == -1` means the tensor is not initializer-backed.
    pub offsets: Vec<i64>,
    pub data: Vec<u8>,
}

/// Two-pass packer: pass 1 sizes the blob, pass 2 allocates it zero-filled
/// and writes each initializer at its aligned offset.
pub fn pack_weights(model: &Model) -> DenoxResult<CompressedWeights> {
    for initializer in &model.initializers {
        validate_initializer_offset(model, initializer.tensor)?;
        let tensor = model.tensor(initializer.tensor);
        let buffer = model.buffer(tensor.buffer);
        if !buffer.alignment.is_power_of_two() {
            return Err(DenoxError::AlignmentNotPowerOfTwo(buffer.alignment));
        }
    }

    let mut offset = 0u64;
    for initializer in &model.initializers {
        let tensor = model.tensor(initializer.tensor);
        let buffer = model.buffer(tensor.buffer);
        offset = align_up(offset, buffer.alignment) + initializer.data.len() as u64;
    }
    let total = offset as usize;

    let mut data = vec![0u8; total];
    let mut offsets = vec![-1i64; model.tensors.len()];
    let mut cursor = 0u64;
    for initializer in &model.initializers {
        let tensor = model.tensor(initializer.tensor);
        let buffer = model.buffer(tensor.buffer);
        let aligned = align_up(cursor, buffer.alignment);
        let start = aligned as usize;
        let end = start + initializer.data.len();
        data[start..end].copy_from_slice(&initializer.data);
        offsets[initializer.tensor as usize] = aligned as i64;
        cursor = aligned + initializer.data.len() as u64;
    }

    tracing::info!(total_bytes = total, count = model.initializers.len(), "packed weights");
    Ok(CompressedWeights { offsets, data })
}

fn validate_initializer_offset(model: &Model, tensor_id: u32) -> DenoxResult<()> {
    let tensor = model.tensor(tensor_id);
    match tensor.offset.as_unsigned_literal() {
        None => Err(DenoxError::InitializerSymbolicOffset { tensor: tensor_id }),
        Some(0) => Ok(()),
        Some(offset) => Err(DenoxError::InitializerNonzeroOffset { tensor: tensor_id, offset }),
    }
}
