//! The uniform scalar "source" accessor.
//!
//! A scalar in the artifact is always either a literal with a typed byte
//! representation or a reference into the symbolic-IR DAG. This module
//! supplies the one read rule every other component uses: sign-extend a
//! literal's typed bytes, then reinterpret as unsigned 64-bit.

pub use crate::artifact::schema::ScalarSource;
use crate::artifact::schema::ScalarType;

/// Sign-extend `bytes` (interpreted per `dtype`) to i64, then reinterpret as
/// u64. Defined only for integer types; callers are expected to reject
/// floats before this ever runs (floats are forbidden as literal sources).
pub fn read_unsigned_scalar_literal(dtype: ScalarType, bytes: &[u8]) -> u64 {
    let signed: i64 = match dtype {
        ScalarType::I16 => i16::from_le_bytes(bytes[..2].try_into().unwrap()) as i64,
        ScalarType::U16 => u16::from_le_bytes(bytes[..2].try_into().unwrap()) as i64,
        ScalarType::I32 => i32::from_le_bytes(bytes[..4].try_into().unwrap()) as i64,
        ScalarType::U32 => u32::from_le_bytes(bytes[..4].try_into().unwrap()) as i64,
        ScalarType::I64 => i64::from_le_bytes(bytes[..8].try_into().unwrap()),
        ScalarType::U64 => u64::from_le_bytes(bytes[..8].try_into().unwrap()) as i64,
        ScalarType::F16 | ScalarType::F32 | ScalarType::F64 => {
            unreachable!("floating-point literals are rejected before reaching this accessor")
        }
    };
    signed as u64
}

impl ScalarSource {
    /// The uniform unsigned-literal read: for a literal, sign-extend then
    /// reinterpret as u64; `None` for a symbolic source.
    pub fn as_unsigned_literal(&self) -> Option<u64> {
        match self {
            ScalarSource::Literal { dtype, bytes } => {
                Some(read_unsigned_scalar_literal(*dtype, bytes))
            }
            ScalarSource::Symbolic { .. } => None,
        }
    }

    pub fn symbol_id(&self) -> Option<u32> {
        match self {
            ScalarSource::Symbolic { sid } => Some(*sid),
            ScalarSource::Literal { .. } => None,
        }
    }

    pub fn is_literal_zero(&self) -> bool {
        self.as_unsigned_literal() == Some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_extends_negative_i16() {
        let bytes = (-1i16).to_le_bytes();
        assert_eq!(read_unsigned_scalar_literal(ScalarType::I16, &bytes), u64::MAX);
    }

    #[test]
    fn zero_extends_u32() {
        let bytes = 42u32.to_le_bytes();
        assert_eq!(read_unsigned_scalar_literal(ScalarType::U32, &bytes), 42);
    }

    #[test]
    fn literal_zero_detection() {
        assert!(ScalarSource::literal_u64(0).is_literal_zero());
        assert!(!ScalarSource::literal_u64(1).is_literal_zero());
        assert!(!ScalarSource::Symbolic { sid: 0 }.is_literal_zero());
    }
}
