use thiserror::Error;

use crate::dtype::DataType;

/// Errors returned by array descriptor validation and the codec.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// The element type cannot be persisted (complex types).
    #[error("unsupported element type {dtype:?}")]
    UnsupportedType { dtype: DataType },
    /// More dimensions than the container supports.
    #[error("rank {rank} exceeds the maximum of {max}")]
    RankOverflow { rank: usize, max: usize },
    /// `product(shape)` or a byte-extent computation overflowed `usize`.
    #[error("shape element count overflow")]
    ShapeOverflow,
    /// The byte buffer length doesn't match the expected size.
    #[error("wrong byte length: expected {expected}, got {actual}")]
    WrongByteLen { expected: usize, actual: usize },
    /// The number of provided elements doesn't match `product(shape)`.
    #[error("wrong element count: expected {expected}, got {actual}")]
    WrongElementCount { expected: usize, actual: usize },
    /// The strided extent reaches outside the backing buffer.
    #[error("strided extent [{min}, {max}) outside buffer of {len} bytes")]
    ExtentOutOfBounds { min: isize, max: isize, len: usize },
    /// Character arrays need a positive element width.
    #[error("character arrays need width >= 1")]
    InvalidCharWidth,
    /// A typed accessor was called with the wrong element type.
    #[error("requested element type {requested:?} on an array of {stored:?}")]
    TypeMismatch { requested: DataType, stored: DataType },
    /// A character-data accessor was called on a numeric array.
    #[error("array of {0:?} holds no character data")]
    NotChar(DataType),
    /// `shape` and `strides` must have one entry per dimension.
    #[error("got {actual} strides for {expected} dimensions")]
    StrideCountMismatch { expected: usize, actual: usize },
    /// Axis subscript past the end of the axis.
    #[error("index {index} out of bounds for axis of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    /// Slice steps start at 1.
    #[error("slice step must be >= 1")]
    InvalidStep,
    /// Converting from an `ndarray` requires standard layout (contiguous, row-major).
    #[error("ndarray is not standard layout")]
    NonContiguousNdarray,
}
